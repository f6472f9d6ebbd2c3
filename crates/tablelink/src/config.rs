//! Client configuration.

use std::time::Duration;

use tablelink_session::{RetryPolicy, RoomEndpoint};

use crate::ClientError;

/// Default game server address.
pub const DEFAULT_SERVER_ADDR: &str = "localhost";

/// Default capacity of the event channel between manager and handle.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Default time `shutdown()` waits for the goodbye before aborting.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

/// Settings for one [`TableClient`](crate::TableClient).
///
/// ```rust
/// use std::time::Duration;
/// use tablelink::ClientConfig;
///
/// let config = ClientConfig::new("poker.example.com")
///     .with_secure(true)
///     .with_shutdown_timeout(Duration::from_secs(3));
/// let endpoint = config.endpoint("lobby").unwrap();
/// assert_eq!(endpoint.socket_url(), "wss://poker.example.com/room/lobby/web");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// `host[:port]` of the game server, without a scheme.
    pub server_addr: String,

    /// Use `wss`/`https` instead of `ws`/`http`.
    pub secure: bool,

    /// When and how often to reconnect.
    pub retry: RetryPolicy,

    /// Buffered events before the manager starts dropping frames.
    /// Status events are never dropped.
    pub event_capacity: usize,

    /// How long `shutdown()` waits for the goodbye frame before aborting
    /// the manager task.
    pub shutdown_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_addr: DEFAULT_SERVER_ADDR.to_string(),
            secure: false,
            retry: RetryPolicy::default(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }
}

impl ClientConfig {
    pub fn new(server_addr: impl Into<String>) -> Self {
        Self {
            server_addr: server_addr.into(),
            ..Self::default()
        }
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Reads the configuration from the process environment.
    ///
    /// | Variable | Meaning | Default |
    /// |---|---|---|
    /// | `TABLELINK_SERVER_ADDR` | server `host[:port]` | `localhost` |
    /// | `TABLELINK_SSL` | `1`/`true` for `wss`/`https` | off |
    /// | `TABLELINK_RETRY_ATTEMPTS` | consecutive failures allowed | 3 |
    /// | `TABLELINK_RETRY_DELAY_MS` | pause between attempts | 1000 |
    /// | `TABLELINK_EVENT_CAPACITY` | event channel size | 256 |
    ///
    /// # Errors
    /// [`ClientError::Config`] for a value that doesn't parse.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ClientError> {
        let mut config = Self::default();

        if let Some(addr) = lookup("TABLELINK_SERVER_ADDR").filter(|a| !a.is_empty()) {
            config.server_addr = addr;
        }
        if let Some(raw) = lookup("TABLELINK_SSL") {
            config.secure = parse_bool("TABLELINK_SSL", &raw)?;
        }
        if let Some(raw) = lookup("TABLELINK_RETRY_ATTEMPTS") {
            config.retry.max_attempts = parse_num("TABLELINK_RETRY_ATTEMPTS", &raw)?;
            if config.retry.max_attempts == 0 {
                return Err(ClientError::Config(
                    "TABLELINK_RETRY_ATTEMPTS must be at least 1".into(),
                ));
            }
        }
        if let Some(raw) = lookup("TABLELINK_RETRY_DELAY_MS") {
            config.retry.delay =
                Duration::from_millis(parse_num("TABLELINK_RETRY_DELAY_MS", &raw)?);
        }
        if let Some(raw) = lookup("TABLELINK_EVENT_CAPACITY") {
            config.event_capacity = parse_num("TABLELINK_EVENT_CAPACITY", &raw)?;
        }

        Ok(config)
    }

    /// The endpoint of `room` on the configured server.
    ///
    /// # Errors
    /// [`ClientError::Session`] for an unusable address or room id.
    pub fn endpoint(&self, room: &str) -> Result<RoomEndpoint, ClientError> {
        Ok(RoomEndpoint::new(
            self.server_addr.as_str(),
            room,
            self.secure,
        )?)
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, ClientError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(ClientError::Config(format!("{key}: expected a boolean, got {other:?}"))),
    }
}

fn parse_num<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ClientError> {
    raw.trim()
        .parse()
        .map_err(|_| ClientError::Config(format!("{key}: expected a number, got {raw:?}")))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_config_defaults() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.server_addr, "localhost");
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.delay, Duration::from_secs(1));
    }

    #[test]
    fn test_config_reads_every_variable() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("TABLELINK_SERVER_ADDR", "poker.example.com:8443"),
            ("TABLELINK_SSL", "TRUE"),
            ("TABLELINK_RETRY_ATTEMPTS", "5"),
            ("TABLELINK_RETRY_DELAY_MS", "250"),
            ("TABLELINK_EVENT_CAPACITY", "16"),
        ]))
        .unwrap();
        assert_eq!(config.server_addr, "poker.example.com:8443");
        assert!(config.secure);
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.delay, Duration::from_millis(250));
        assert_eq!(config.event_capacity, 16);
    }

    #[test]
    fn test_config_rejects_bad_values() {
        for vars in [
            [("TABLELINK_SSL", "maybe")],
            [("TABLELINK_RETRY_ATTEMPTS", "three")],
            [("TABLELINK_RETRY_ATTEMPTS", "0")],
            [("TABLELINK_RETRY_DELAY_MS", "-1")],
        ] {
            assert!(matches!(
                ClientConfig::from_lookup(lookup(&vars)),
                Err(ClientError::Config(_))
            ));
        }
    }

    #[test]
    fn test_config_endpoint() {
        let config = ClientConfig::new("h:7777");
        let ep = config.endpoint("lobby").unwrap();
        assert_eq!(ep.check_url(), "http://h:7777/room/lobby");
        assert!(matches!(
            config.endpoint("a/b"),
            Err(ClientError::Session(_))
        ));
    }
}
