//! Codec trait and implementations for serializing/deserializing envelopes.
//!
//! The game server speaks MessagePack with structs encoded as maps keyed by
//! field name, so [`MsgPackCodec`] is the codec used on the wire.
//! [`JsonCodec`] produces the same shape as readable JSON, which is handy
//! when logging frames or writing tests.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// `Clone` lets the client handle and the connection task each own a copy.
pub trait Codec: Clone + Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// MsgPackCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses MessagePack (via `rmp-serde`).
///
/// Structs are written as maps with their field names as keys. Integers
/// keep their full 64-bit width, so chip counts survive unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct MsgPackCodec;

impl Codec for MsgPackCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        rmp_serde::to_vec_named(value).map_err(|e| ProtocolError::Encode(e.into()))
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        rmp_serde::from_slice(data).map_err(|e| ProtocolError::Decode(e.into()))
    }
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// This is behind the `json` feature flag (enabled by default).
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(|e| ProtocolError::Encode(e.into()))
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(|e| ProtocolError::Decode(e.into()))
    }
}
