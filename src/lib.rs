//! Piranha Cache - Redis-backed caching for content and media
//!
//! A generic object cache that round-trips typed values through a shape
//! registry, and a media cache addressing binary variants by id, category,
//! lifecycle state and dimensions. Both run over a pooled hash store.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod store;

pub use api::AppState;
pub use cache::{GenericCacheStore, MediaCacheStore, MediaCategory, Shape, ShapeRegistry};
pub use config::Config;
pub use error::{CacheError, Result};
pub use store::{HashStore, MemoryStore, RedisStore};
