//! Request DTOs for the cache HTTP surface
//!
//! Defines incoming bodies and path parameters.

use serde::Deserialize;
use uuid::Uuid;

use crate::cache::{LifecycleState, MediaCategory, MediaVariant};
use crate::error::Result;

/// Maximum accepted generic cache key length in bytes.
pub const MAX_KEY_LENGTH: usize = 256;

/// Request body for storing a generic cache value (PUT /cache/:key)
///
/// # Fields
/// - `shape`: Registered shape name the value is decoded as
/// - `value`: The value as JSON
#[derive(Debug, Clone, Deserialize)]
pub struct SetValueRequest {
    pub shape: String,
    pub value: serde_json::Value,
}

impl SetValueRequest {
    /// Validates the request against the target key.
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self, key: &str) -> Option<String> {
        if let Some(msg) = validate_key(key) {
            return Some(msg);
        }
        if self.shape.trim().is_empty() {
            return Some("Shape cannot be empty".to_string());
        }
        None
    }
}

/// Checks a generic cache key taken from the request path.
pub fn validate_key(key: &str) -> Option<String> {
    if key.is_empty() {
        return Some("Key cannot be empty".to_string());
    }
    if key.len() > MAX_KEY_LENGTH {
        return Some(format!(
            "Key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        ));
    }
    None
}

/// Path parameters addressing a whole media record
/// (`/media/:category/:id`).
#[derive(Debug, Clone, Deserialize)]
pub struct MediaPath {
    pub category: String,
    pub id: Uuid,
}

impl MediaPath {
    pub fn category(&self) -> Result<MediaCategory> {
        self.category.parse()
    }
}

/// Path parameters addressing one media variant
/// (`/media/:category/:id/:state/:width[/:height]`).
#[derive(Debug, Clone, Deserialize)]
pub struct VariantPath {
    pub category: String,
    pub id: Uuid,
    pub state: String,
    pub width: u32,
    #[serde(default)]
    pub height: Option<u32>,
}

impl VariantPath {
    pub fn category(&self) -> Result<MediaCategory> {
        self.category.parse()
    }

    /// Parses and validates the addressed variant.
    pub fn variant(&self) -> Result<MediaVariant> {
        let state: LifecycleState = self.state.parse()?;
        MediaVariant::new(state, self.width, self.height)
    }
}
