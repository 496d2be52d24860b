//! Codec trait and the JSON implementation.
//!
//! The request layer never touches `serde_json` directly; it holds a
//! [`Codec`] and calls `encode`/`decode`. Swapping the wire format means
//! adding another implementation here.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// Converts messages to bytes and back.
///
/// `Send + Sync + 'static` because one codec instance is shared by every
/// connection task for the lifetime of the server.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if the value can't be represented.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or don't
    /// match `T`.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

/// A [`Codec`] backed by `serde_json`.
///
/// ```rust
/// use turncoat_protocol::{Codec, JsonCodec, Request};
///
/// let codec = JsonCodec;
/// let req: Request = codec
///     .decode(br#"{"action":"join","playerName":"Alex"}"#)
///     .unwrap();
/// assert_eq!(req, Request::Join { player_name: "Alex".into() });
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
