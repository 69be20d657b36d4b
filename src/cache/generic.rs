//! Generic Cache Store
//!
//! Arbitrary application values under string keys in the single
//! `piranha:cache` hash record. Each entry is two fields: the JSON payload
//! under `key` and its shape tag under `key:type`.

use std::sync::Arc;

use tracing::debug;

use crate::cache::keys::{type_key, CACHE_HASH};
use crate::cache::shape::{decode_tag, encode_tag, CacheValue, Shape, ShapeRegistry};
use crate::cache::stats::{CacheStats, StatsRecorder};
use crate::error::{CacheError, Result};
use crate::store::HashStore;

// == Generic Cache Store ==
/// Typed object cache over a pooled hash store.
#[derive(Clone)]
pub struct GenericCacheStore {
    store: Arc<dyn HashStore>,
    registry: Arc<ShapeRegistry>,
    stats: Arc<StatsRecorder>,
}

impl std::fmt::Debug for GenericCacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenericCacheStore")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl GenericCacheStore {
    // == Constructor ==
    /// Creates a store over `store` that can read back every shape in `registry`.
    pub fn new(store: Arc<dyn HashStore>, registry: ShapeRegistry) -> Self {
        Self {
            store,
            registry: Arc::new(registry),
            stats: Arc::new(StatsRecorder::new()),
        }
    }

    pub fn registry(&self) -> &ShapeRegistry {
        &self.registry
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot()
    }

    // == Remove ==
    /// Removes the value stored under `key`.
    ///
    /// Only the value field is deleted: `key:type` may itself be a live user
    /// key. A leftover tag reads as a miss. Removing an absent key is a no-op.
    pub async fn remove(&self, key: &str) -> Result<()> {
        let mut conn = self.store.connection().await?;
        conn.hash_remove_fields(CACHE_HASH, &[key]).await?;

        debug!(key, "Removed generic cache entry");
        self.stats.record_removal();
        Ok(())
    }

    // == Contains ==
    /// Returns true if a value is stored under `key`.
    pub async fn contains(&self, key: &str) -> Result<bool> {
        let mut conn = self.store.connection().await?;
        conn.hash_contains_field(CACHE_HASH, key).await
    }

    // == Set ==
    /// Stores `value` under `key`, replacing any previous entry.
    pub async fn set<T: Shape>(&self, key: &str, value: &T) -> Result<()> {
        self.set_value(key, value).await
    }

    /// Stores a type-erased value under `key`.
    ///
    /// Payload and type tag go out in a single multi-field write, so readers
    /// never see one without the other.
    pub async fn set_value(&self, key: &str, value: &dyn CacheValue) -> Result<()> {
        let payload = value.encode()?;
        let tag = encode_tag(value.shape())?;
        let tag_field = type_key(key);

        let mut conn = self.store.connection().await?;
        conn.hash_set_fields(
            CACHE_HASH,
            &[(key, payload.as_str()), (tag_field.as_str(), tag.as_str())],
        )
        .await?;

        debug!(key, shape = value.shape(), "Stored generic cache entry");
        self.stats.record_write();
        Ok(())
    }

    // == Get ==
    /// Reads the value stored under `key`.
    ///
    /// Returns `Ok(None)` when no value is stored, even if a stale type tag
    /// remains. A value whose tag is missing, names an unregistered shape, or
    /// does not decode into that shape is a [`CacheError::Decode`].
    pub async fn get(&self, key: &str) -> Result<Option<Box<dyn CacheValue>>> {
        let tag_field = type_key(key);
        let (payload, tag) = {
            let mut conn = self.store.connection().await?;
            let mut fields = conn
                .hash_get_fields(CACHE_HASH, &[key, tag_field.as_str()])
                .await?
                .into_iter();
            (fields.next().flatten(), fields.next().flatten())
        };

        let Some(payload) = payload else {
            self.stats.record_miss();
            return Ok(None);
        };

        let tag =
            tag.ok_or_else(|| CacheError::Decode(format!("Entry '{}' has no type tag", key)))?;
        let shape = decode_tag(&tag)?;
        let value = self.registry.decode(&shape, &payload)?;

        self.stats.record_hit();
        Ok(Some(value))
    }

    /// Reads the value under `key` as `T`.
    ///
    /// An entry stored with a different shape is a [`CacheError::Decode`].
    pub async fn get_as<T: Shape>(&self, key: &str) -> Result<Option<T>> {
        let Some(value) = self.get(key).await? else {
            return Ok(None);
        };

        let shape = value.shape();
        value.downcast::<T>().map(Some).ok_or_else(|| {
            CacheError::Decode(format!(
                "Entry '{}' holds shape '{}', expected '{}'",
                key,
                shape,
                T::NAME
            ))
        })
    }
}
