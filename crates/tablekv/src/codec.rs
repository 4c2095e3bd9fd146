//! Base64 passthrough for binary values

use crate::error::{KvError, KvResult};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Encode bytes as standard padded base64 text.
pub fn encode_binary(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Decode text produced by [`encode_binary`].
pub fn decode_binary(text: &str) -> KvResult<Vec<u8>> {
    STANDARD.decode(text).map_err(KvError::from)
}
