//! Response DTOs for the cache HTTP surface
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;
use uuid::Uuid;

use crate::cache::{CacheStats, MediaCategory};

/// Response body for reading a generic value (GET /cache/:key)
#[derive(Debug, Clone, Serialize)]
pub struct GetValueResponse {
    /// The requested key
    pub key: String,
    /// Shape the value was stored as
    pub shape: String,
    /// The stored value
    pub value: serde_json::Value,
}

impl GetValueResponse {
    pub fn new(key: impl Into<String>, shape: impl Into<String>, value: serde_json::Value) -> Self {
        Self {
            key: key.into(),
            shape: shape.into(),
            value,
        }
    }
}

/// Response body for write operations (PUT /cache/:key, PUT /media/...)
#[derive(Debug, Clone, Serialize)]
pub struct SetResponse {
    /// Success message
    pub message: String,
    /// The key that was set
    pub key: String,
}

impl SetResponse {
    /// Creates a new SetResponse
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' set successfully", key),
            key,
        }
    }
}

/// Response body for removals (DELETE /cache/:key, DELETE /media/...)
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// Success message
    pub message: String,
    /// The key that was deleted
    pub key: String,
}

impl DeleteResponse {
    /// Creates a new DeleteResponse
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' deleted successfully", key),
            key,
        }
    }
}

/// Response body for GET /cache/:key/exists
#[derive(Debug, Clone, Serialize)]
pub struct ContainsResponse {
    pub key: String,
    pub exists: bool,
}

/// Response body for GET /media/:category/:id/size
#[derive(Debug, Clone, Serialize)]
pub struct SizeResponse {
    pub id: Uuid,
    pub category: MediaCategory,
    /// Sum of the byte lengths of every cached variant
    pub total_bytes: u64,
}

/// Counters of one store plus its hit rate.
#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    #[serde(flatten)]
    pub counters: CacheStats,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl From<CacheStats> for StoreStats {
    fn from(counters: CacheStats) -> Self {
        let hit_rate = counters.hit_rate();
        Self { counters, hit_rate }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub generic: StoreStats,
    pub media: StoreStats,
}

impl StatsResponse {
    pub fn new(generic: CacheStats, media: CacheStats) -> Self {
        Self {
            generic: generic.into(),
            media: media.into(),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
