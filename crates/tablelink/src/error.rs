//! Unified error type for the tablelink client.

use tablelink_protocol::ProtocolError;
use tablelink_session::SessionError;
use tablelink_state::StateError;
use tablelink_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` conversions let `?` lift a layer's error into this one.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Connecting, sending or receiving failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// An envelope could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The room endpoint or session is unusable.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A server event could not be applied to the seats.
    #[error(transparent)]
    State(#[from] StateError),

    /// An environment variable or setting has an unusable value.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The socket is not open; the intent was not sent.
    #[error("not connected to the room")]
    NotConnected,

    /// The server has not assigned your client (or seat) yet.
    #[error("no client has been assigned by the server yet")]
    NoClient,

    /// The client was shut down.
    #[error("client has shut down")]
    Shutdown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::ConnectionClosed("gone".into());
        let client_err: ClientError = err.into();
        assert!(matches!(client_err, ClientError::Transport(_)));
        assert!(client_err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::MissingPayload {
            tag: tablelink_protocol::Tag::NewPlayer,
            missing: "player",
        };
        let client_err: ClientError = err.into();
        assert!(matches!(client_err, ClientError::Protocol(_)));
        assert_eq!(
            client_err.to_string(),
            "NEW_PLAYER frame is missing its player payload"
        );
    }

    #[test]
    fn test_from_session_error() {
        let client_err: ClientError = SessionError::MissingToken.into();
        assert!(matches!(client_err, ClientError::Session(_)));
    }

    #[test]
    fn test_from_state_error() {
        let client_err: ClientError = StateError::MissingId.into();
        assert!(matches!(client_err, ClientError::State(_)));
        assert_eq!(client_err.to_string(), "client payload has no ID");
    }
}
