//! Error types for the session layer.

/// Errors that can occur while describing or checking a room session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The room identifier can't be used in a URL path segment.
    #[error("invalid room id {0:?}")]
    InvalidRoom(String),

    /// The server address is empty or carries a scheme/path.
    #[error("invalid server address {0:?}")]
    InvalidHost(String),

    /// A reconnection was attempted before the server ever issued a
    /// private token for this session.
    #[error("no reconnection token has been issued for this session")]
    MissingToken,

    /// The room existence check could not be completed.
    #[error("room check failed: {0}")]
    CheckFailed(String),
}
