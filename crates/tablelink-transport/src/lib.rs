//! Transport abstraction layer for tablelink.
//!
//! Provides the [`Connector`] and [`Connection`] traits that abstract over
//! the client side of a persistent, message-framed socket. The connection
//! manager only ever talks to these traits, so tests can drive it with a
//! scripted fake instead of a real network.
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket connector via `tokio-tungstenite`
//! - `tls`: enables `wss://` URLs (native TLS)

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketConnector};

use std::fmt;
use std::future::Future;

/// Opaque identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Close frames
// ---------------------------------------------------------------------------

/// Close code for a deliberate, orderly shutdown by either side.
pub const CLOSE_NORMAL: u16 = 1000;

/// Close code reported when the socket dropped without a close handshake.
pub const CLOSE_ABNORMAL: u16 = 1006;

/// How a connection ended.
///
/// Only [`CLOSE_NORMAL`] counts as clean. Everything else, including a
/// socket that vanished without any close frame, is unclean and makes the
/// connection manager try again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseFrame {
    pub code: u16,
    pub reason: String,
}

impl CloseFrame {
    /// A `1000` close with the given reason.
    pub fn normal(reason: impl Into<String>) -> Self {
        Self {
            code: CLOSE_NORMAL,
            reason: reason.into(),
        }
    }

    /// A `1006` close, used when the peer disappeared.
    pub fn abnormal(reason: impl Into<String>) -> Self {
        Self {
            code: CLOSE_ABNORMAL,
            reason: reason.into(),
        }
    }

    /// Returns `true` for an orderly `1000` close.
    pub fn is_clean(&self) -> bool {
        self.code == CLOSE_NORMAL
    }
}

impl fmt::Display for CloseFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.reason.is_empty() {
            write!(f, "{}", self.code)
        } else {
            write!(f, "{} ({})", self.code, self.reason)
        }
    }
}

/// One item read from a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// A complete binary (or text) message.
    Frame(Vec<u8>),
    /// The connection ended. No further items follow.
    Closed(CloseFrame),
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Opens outgoing connections.
///
/// The futures are required to be `Send` so a generic connection manager
/// can run on a spawned Tokio task.
pub trait Connector: Send + Sync + 'static {
    /// The connection type produced by this connector.
    type Connection: Connection;

    /// Opens a new connection to `url`.
    fn connect(
        &self,
        url: &str,
    ) -> impl Future<Output = Result<Self::Connection, TransportError>> + Send;
}

/// A single connection that can send and receive bytes.
///
/// `send` and `recv` take `&self` and must be usable concurrently: the
/// connection manager waits on `recv` while user intents arrive.
pub trait Connection: Send + Sync + 'static {
    /// Sends one binary message to the remote peer.
    fn send(
        &self,
        data: &[u8],
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Receives the next message from the remote peer.
    ///
    /// Returns `Ok(Inbound::Closed(..))` exactly once when the peer closes
    /// or the socket drops. An `Err` means the read itself failed and is
    /// treated by callers like an abnormal close.
    fn recv(&self) -> impl Future<Output = Result<Inbound, TransportError>> + Send;

    /// Closes the connection with the given code and reason.
    fn close(
        &self,
        frame: CloseFrame,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}
