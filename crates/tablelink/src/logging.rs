//! Structured logging setup.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs a `tracing` subscriber for the process.
///
/// The filter comes from `RUST_LOG` and defaults to `info`. Calling this
/// again (or after another subscriber was installed) is a no-op.
///
/// ```no_run
/// tablelink::logging::init_tracing();
/// tracing::info!("client starting");
/// ```
pub fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = tracing_subscriber::fmt::layer().with_target(true);

    if tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .is_ok()
    {
        tracing::debug!("logging initialized");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_twice_is_harmless() {
        init_tracing();
        init_tracing();
    }
}
