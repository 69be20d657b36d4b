//! Error types for the cache layer
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Unified error type for both cache stores and the host HTTP surface.
///
/// A cache miss is never an error: stores return `Ok(None)` for absent keys.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Missing or invalid settings at construction time
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Pool exhausted, acquisition timed out, or endpoint unreachable
    #[error("Connection error: {0}")]
    Connection(String),

    /// Command rejected by the backing store
    #[error("Store error: {0}")]
    Store(String),

    /// Stored data could not be turned back into a value
    #[error("Decode error: {0}")]
    Decode(String),

    /// Value could not be serialized for storage
    #[error("Encode error: {0}")]
    Encode(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Key or variant not found (HTTP surface only)
    #[error("Not found: {0}")]
    NotFound(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::Connection(_) => StatusCode::SERVICE_UNAVAILABLE,
            CacheError::Decode(_) | CacheError::Encode(_) => StatusCode::UNPROCESSABLE_ENTITY,
            CacheError::Configuration(_) | CacheError::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache layer.
pub type Result<T> = std::result::Result<T, CacheError>;
