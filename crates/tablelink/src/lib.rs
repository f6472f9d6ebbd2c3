//! # Tablelink
//!
//! A reconnecting client for a networked poker table.
//!
//! The server runs the game; tablelink keeps a socket to one room alive
//! and mirrors the table it reports. A [`TableClient`] spawns a
//! [`ConnectionManager`] task that owns the socket, retries unclean drops
//! with the session's reconnection token, and hands decoded envelopes back
//! to the handle, which folds them into a
//! [`TableView`](tablelink_state::TableView).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tablelink::prelude::*;
//!
//! # async fn run() -> Result<(), ClientError> {
//! let config = ClientConfig::from_env()?;
//! let settings = ClientSettings {
//!     name: "alice".into(),
//!     ..ClientSettings::default()
//! };
//! let mut client = TableClient::connect(&config, "lobby", settings)?;
//! while let Some(update) = client.next().await {
//!     if let Update::Status(state) = update {
//!         if state.is_open() {
//!             client.send(Intent::Chat("hi all".into()))?;
//!         }
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Crates
//!
//! | Crate | Role |
//! |---|---|
//! | `tablelink-transport` | socket traits, WebSocket connector |
//! | `tablelink-protocol` | tags, envelopes, wire models, codecs |
//! | `tablelink-session` | room endpoint, token, retry state machine |
//! | `tablelink-state` | seats, merges, reducer, presentation |

mod client;
mod config;
mod error;
mod intent;
pub mod logging;
mod manager;

pub use client::{TableClient, Update};
pub use config::{
    ClientConfig, DEFAULT_EVENT_CAPACITY, DEFAULT_SERVER_ADDR, DEFAULT_SHUTDOWN_TIMEOUT,
};
pub use error::ClientError;
pub use intent::{BetAction, Intent};
pub use manager::{ConnEvent, ConnectionManager, EXIT_REASON};

/// Convenient re-exports for client code.
pub mod prelude {
    pub use crate::{BetAction, ClientConfig, ClientError, Intent, TableClient, Update};
    pub use tablelink_protocol::{Chips, Client, ClientId, ClientSettings, Envelope, Tag};
    pub use tablelink_session::{CloseReason, ConnState, RetryPolicy, RoomSession};
    pub use tablelink_state::{Advisory, Presentation, TableView};
}
