//! Error types for the protocol layer.
//!
//! Each crate in tablelink defines its own error enum. A `ProtocolError`
//! always means a problem with bytes or with what a frame carries, never
//! with the socket underneath it.

use crate::Tag;

/// Boxed source error from whichever codec produced it.
pub type CodecSource = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust value into bytes).
    #[error("encode failed: {0}")]
    Encode(#[source] CodecSource),

    /// Deserialization failed: malformed, truncated, or mistyped bytes.
    ///
    /// Fatal for the one frame only. The connection stays up.
    #[error("decode failed: {0}")]
    Decode(#[source] CodecSource),

    /// A frame decoded fine but lacks a payload its tag requires.
    #[error("{tag} frame is missing its {missing} payload")]
    MissingPayload { tag: Tag, missing: &'static str },
}
