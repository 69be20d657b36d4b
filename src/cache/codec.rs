//! Binary payload encoding.
//!
//! Media bytes are stored as a JSON string holding standard base64, the same
//! text form a JSON serializer gives a byte array.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::{CacheError, Result};

/// Encodes bytes into their stored text form.
pub fn encode_bytes(data: &[u8]) -> Result<String> {
    serde_json::to_string(&STANDARD.encode(data)).map_err(|e| CacheError::Encode(e.to_string()))
}

/// Decodes a stored text form back into bytes.
pub fn decode_bytes(stored: &str) -> Result<Vec<u8>> {
    let encoded: String = serde_json::from_str(stored)
        .map_err(|e| CacheError::Decode(format!("Binary entry is not a JSON string: {}", e)))?;
    STANDARD
        .decode(encoded.as_bytes())
        .map_err(|e| CacheError::Decode(format!("Binary entry is not valid base64: {}", e)))
}
