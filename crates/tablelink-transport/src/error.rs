/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The socket could not be opened (DNS, TCP, TLS or HTTP upgrade).
    #[error("connect to {url} failed: {source}")]
    ConnectFailed {
        url: String,
        #[source]
        source: std::io::Error,
    },

    /// The connection is already closed.
    #[error("connection closed: {0}")]
    ConnectionClosed(String),

    /// Sending data failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Receiving data failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),
}
