//! Cache Module
//!
//! The generic object cache and the media variant cache, both stateless views
//! over a pooled [`crate::store::HashStore`].

mod codec;
mod generic;
mod keys;
mod media;
mod shape;
mod stats;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use codec::{decode_bytes, encode_bytes};
pub use generic::GenericCacheStore;
pub use keys::{
    hash_key, item_key, type_key, LifecycleState, MediaCategory, MediaVariant, CACHE_HASH,
    TYPE_SUFFIX,
};
pub use media::MediaCacheStore;
pub use shape::{CacheValue, Shape, ShapeRegistry};
pub use stats::{CacheStats, StatsRecorder};
