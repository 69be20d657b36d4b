//! Media Cache Store
//!
//! Binary variants of media items. Every variant of one item lives as a field
//! of a single hash record (`piranha:{category}:{id}`), so deleting the
//! record drops the published and draft variants of every size at once.

use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::cache::codec::{decode_bytes, encode_bytes};
use crate::cache::keys::{hash_key, LifecycleState, MediaCategory, MediaVariant};
use crate::cache::stats::{CacheStats, StatsRecorder};
use crate::error::Result;
use crate::store::HashStore;

// == Media Cache Store ==
/// Cache of resized media binaries over a pooled hash store.
#[derive(Clone)]
pub struct MediaCacheStore {
    store: Arc<dyn HashStore>,
    stats: Arc<StatsRecorder>,
}

impl std::fmt::Debug for MediaCacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaCacheStore")
            .field("stats", &self.stats.snapshot())
            .finish_non_exhaustive()
    }
}

impl MediaCacheStore {
    // == Constructor ==
    pub fn new(store: Arc<dyn HashStore>) -> Self {
        Self {
            store,
            stats: Arc::new(StatsRecorder::new()),
        }
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot()
    }

    // == Get ==
    /// Gets the published data for the image with the given dimensions.
    ///
    /// # Arguments
    /// * `id` - The media id
    /// * `width` - The width of the image
    /// * `height` - The optional height of the image
    /// * `category` - The media category
    ///
    /// # Returns
    /// The binary data, `None` on a cache miss
    pub async fn get(
        &self,
        id: Uuid,
        width: u32,
        height: Option<u32>,
        category: MediaCategory,
    ) -> Result<Option<Vec<u8>>> {
        let variant = MediaVariant::new(LifecycleState::Published, width, height)?;
        self.get_variant(id, variant, category).await
    }

    /// Gets the draft data for the image with the given dimensions.
    ///
    /// Same as [`MediaCacheStore::get`] but addresses the draft variant.
    pub async fn get_draft(
        &self,
        id: Uuid,
        width: u32,
        height: Option<u32>,
        category: MediaCategory,
    ) -> Result<Option<Vec<u8>>> {
        let variant = MediaVariant::new(LifecycleState::Draft, width, height)?;
        self.get_variant(id, variant, category).await
    }

    /// Reads one variant of a media item.
    ///
    /// A stored entry that fails to decode is an error, not a miss.
    pub async fn get_variant(
        &self,
        id: Uuid,
        variant: MediaVariant,
        category: MediaCategory,
    ) -> Result<Option<Vec<u8>>> {
        let hash = hash_key(category, &id);
        let item = variant.item_key();

        let stored = {
            let mut conn = self.store.connection().await?;
            conn.hash_get_field(&hash, &item).await?
        };

        self.stats.record_lookup(stored.is_some());
        match stored {
            Some(text) => {
                debug!(hash = %hash, item = %item, "Media cache hit");
                decode_bytes(&text).map(Some)
            }
            None => {
                debug!(hash = %hash, item = %item, "Media cache miss");
                Ok(None)
            }
        }
    }

    // == Put ==
    /// Stores the published data for the image with the given dimensions,
    /// replacing any data already cached for them.
    ///
    /// # Arguments
    /// * `id` - The media id
    /// * `data` - The media data
    /// * `width` - The width of the image
    /// * `height` - The optional height of the image
    /// * `category` - The media category
    pub async fn put(
        &self,
        id: Uuid,
        data: &[u8],
        width: u32,
        height: Option<u32>,
        category: MediaCategory,
    ) -> Result<()> {
        let variant = MediaVariant::new(LifecycleState::Published, width, height)?;
        self.put_variant(id, data, variant, category).await
    }

    /// Stores the draft data for the image with the given dimensions.
    pub async fn put_draft(
        &self,
        id: Uuid,
        data: &[u8],
        width: u32,
        height: Option<u32>,
        category: MediaCategory,
    ) -> Result<()> {
        let variant = MediaVariant::new(LifecycleState::Draft, width, height)?;
        self.put_variant(id, data, variant, category).await
    }

    /// Writes one variant of a media item.
    pub async fn put_variant(
        &self,
        id: Uuid,
        data: &[u8],
        variant: MediaVariant,
        category: MediaCategory,
    ) -> Result<()> {
        let hash = hash_key(category, &id);
        let item = variant.item_key();
        let encoded = encode_bytes(data)?;

        let mut conn = self.store.connection().await?;
        conn.hash_set_field(&hash, &item, &encoded).await?;

        debug!(hash = %hash, item = %item, bytes = data.len(), "Stored media variant");
        self.stats.record_write();
        Ok(())
    }

    // == Delete ==
    /// Deletes all cached images related to the given id, both draft and
    /// published, in the given category.
    pub async fn delete(&self, id: Uuid, category: MediaCategory) -> Result<()> {
        let hash = hash_key(category, &id);

        let mut conn = self.store.connection().await?;
        conn.remove_key(&hash).await?;

        debug!(hash = %hash, "Deleted media record");
        self.stats.record_removal();
        Ok(())
    }

    // == Total Size ==
    /// Gets the total size in bytes of every cached variant of the given id.
    ///
    /// Best-effort: entries that cannot be decoded count as zero bytes and are
    /// logged rather than failing the call.
    pub async fn get_total_size(&self, id: Uuid, category: MediaCategory) -> Result<u64> {
        let hash = hash_key(category, &id);

        let entries = {
            let mut conn = self.store.connection().await?;
            conn.hash_get_all(&hash).await?
        };

        let total = entries
            .iter()
            .map(|(item, text)| match decode_bytes(text) {
                Ok(bytes) => bytes.len() as u64,
                Err(err) => {
                    warn!(hash = %hash, item = %item, error = %err, "Skipping undecodable media entry");
                    0
                }
            })
            .sum();

        debug!(hash = %hash, variants = entries.len(), total, "Computed media cache size");
        Ok(total)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CacheError;
    use crate::store::MemoryStore;
    use std::time::Duration;

    const MEDIA: MediaCategory = MediaCategory::Media;

    fn sample_id() -> Uuid {
        Uuid::parse_str("3f2504e0-4f89-41d3-9a0c-0305e82c3301").unwrap()
    }

    fn cache_with(store: &MemoryStore) -> MediaCacheStore {
        MediaCacheStore::new(Arc::new(store.clone()))
    }

    async fn raw_field(store: &MemoryStore, hash: &str, field: &str) -> Option<String> {
        let mut conn = store.connection().await.unwrap();
        conn.hash_get_field(hash, field).await.unwrap()
    }

    #[tokio::test]
    async fn test_put_uses_expected_keys() {
        let store = MemoryStore::new();
        let cache = cache_with(&store);

        cache
            .put(sample_id(), b"Something testable", 100, Some(100), MEDIA)
            .await
            .unwrap();

        assert_eq!(
            raw_field(
                &store,
                "piranha:media:3f2504e0-4f89-41d3-9a0c-0305e82c3301",
                "published:100:100"
            )
            .await
            .as_deref(),
            Some("\"U29tZXRoaW5nIHRlc3RhYmxl\"")
        );
    }

    #[tokio::test]
    async fn test_put_draft_uses_draft_key() {
        let store = MemoryStore::new();
        let cache = cache_with(&store);

        cache
            .put_draft(sample_id(), b"draft", 100, Some(100), MEDIA)
            .await
            .unwrap();

        let hash = "piranha:media:3f2504e0-4f89-41d3-9a0c-0305e82c3301";
        assert!(raw_field(&store, hash, "draft:100:100").await.is_some());
        assert!(raw_field(&store, hash, "published:100:100").await.is_none());
    }

    #[tokio::test]
    async fn test_get_returns_bytes() {
        let store = MemoryStore::new();
        let cache = cache_with(&store);
        let data = b"Something testable".to_vec();

        cache.put(sample_id(), &data, 100, Some(100), MEDIA).await.unwrap();

        assert_eq!(
            cache.get(sample_id(), 100, Some(100), MEDIA).await.unwrap(),
            Some(data)
        );
    }

    #[tokio::test]
    async fn test_get_miss_returns_none() {
        let store = MemoryStore::new();
        let cache = cache_with(&store);

        assert!(cache.get(sample_id(), 100, Some(100), MEDIA).await.unwrap().is_none());
        assert!(cache
            .get_draft(sample_id(), 100, Some(100), MEDIA)
            .await
            .unwrap()
            .is_none());
        assert_eq!(cache.stats().misses, 2);
    }

    #[tokio::test]
    async fn test_missing_height_is_its_own_variant() {
        let store = MemoryStore::new();
        let cache = cache_with(&store);

        cache.put(sample_id(), b"free", 320, None, MEDIA).await.unwrap();

        let hash = "piranha:media:3f2504e0-4f89-41d3-9a0c-0305e82c3301";
        assert!(raw_field(&store, hash, "published:320:").await.is_some());
        assert_eq!(
            cache.get(sample_id(), 320, None, MEDIA).await.unwrap(),
            Some(b"free".to_vec())
        );
        assert!(cache.get(sample_id(), 320, Some(240), MEDIA).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_variant_isolation() {
        let store = MemoryStore::new();
        let cache = cache_with(&store);

        cache.put(sample_id(), b"published", 100, Some(100), MEDIA).await.unwrap();
        cache.put_draft(sample_id(), b"draft", 100, Some(100), MEDIA).await.unwrap();

        assert_eq!(
            cache.get(sample_id(), 100, Some(100), MEDIA).await.unwrap(),
            Some(b"published".to_vec())
        );
        assert_eq!(
            cache.get_draft(sample_id(), 100, Some(100), MEDIA).await.unwrap(),
            Some(b"draft".to_vec())
        );
    }

    #[tokio::test]
    async fn test_put_overwrites_variant() {
        let store = MemoryStore::new();
        let cache = cache_with(&store);

        cache.put(sample_id(), b"first", 50, Some(50), MEDIA).await.unwrap();
        cache.put(sample_id(), b"second", 50, Some(50), MEDIA).await.unwrap();

        assert_eq!(
            cache.get(sample_id(), 50, Some(50), MEDIA).await.unwrap(),
            Some(b"second".to_vec())
        );
    }

    #[tokio::test]
    async fn test_delete_removes_all_variants() {
        let store = MemoryStore::new();
        let cache = cache_with(&store);

        for (w, h) in [(100, Some(100)), (200, None), (640, Some(480))] {
            cache.put(sample_id(), b"p", w, h, MEDIA).await.unwrap();
            cache.put_draft(sample_id(), b"d", w, h, MEDIA).await.unwrap();
        }

        cache.delete(sample_id(), MEDIA).await.unwrap();

        for (w, h) in [(100, Some(100)), (200, None), (640, Some(480))] {
            assert!(cache.get(sample_id(), w, h, MEDIA).await.unwrap().is_none());
            assert!(cache.get_draft(sample_id(), w, h, MEDIA).await.unwrap().is_none());
        }
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_delete_keeps_other_category() {
        let store = MemoryStore::new();
        let cache = cache_with(&store);

        cache.put(sample_id(), b"media", 100, Some(100), MEDIA).await.unwrap();
        cache
            .put(sample_id(), b"upload", 100, Some(100), MediaCategory::Upload)
            .await
            .unwrap();

        cache.delete(sample_id(), MediaCategory::Upload).await.unwrap();

        assert_eq!(
            cache.get(sample_id(), 100, Some(100), MEDIA).await.unwrap(),
            Some(b"media".to_vec())
        );
        assert!(cache
            .get(sample_id(), 100, Some(100), MediaCategory::Upload)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_total_size() {
        let store = MemoryStore::new();
        let cache = cache_with(&store);

        cache
            .put(sample_id(), b"Something testable.", 100, Some(100), MEDIA)
            .await
            .unwrap();
        cache
            .put(sample_id(), b"Something testable..", 200, Some(200), MEDIA)
            .await
            .unwrap();
        cache
            .put_draft(sample_id(), b"Something testable...", 200, Some(200), MEDIA)
            .await
            .unwrap();

        assert_eq!(cache.get_total_size(sample_id(), MEDIA).await.unwrap(), 19 + 20 + 21);
    }

    #[tokio::test]
    async fn test_total_size_skips_undecodable_entries() {
        let store = MemoryStore::new();
        let cache = cache_with(&store);

        cache.put(sample_id(), &[7_u8; 22], 100, None, MEDIA).await.unwrap();
        {
            let mut conn = store.connection().await.unwrap();
            conn.hash_set_field(
                &hash_key(MEDIA, &sample_id()),
                "published:1:1",
                "{\"not\":\"bytes\"}",
            )
            .await
            .unwrap();
        }

        assert_eq!(cache.get_total_size(sample_id(), MEDIA).await.unwrap(), 22);
    }

    #[tokio::test]
    async fn test_total_size_of_unknown_id_is_zero() {
        let store = MemoryStore::new();
        let cache = cache_with(&store);

        assert_eq!(cache.get_total_size(Uuid::new_v4(), MEDIA).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_get_undecodable_entry_is_error() {
        let store = MemoryStore::new();
        let cache = cache_with(&store);
        {
            let mut conn = store.connection().await.unwrap();
            conn.hash_set_field(&hash_key(MEDIA, &sample_id()), "published:10:10", "garbage")
                .await
                .unwrap();
        }

        let result = cache.get(sample_id(), 10, Some(10), MEDIA).await;
        assert!(matches!(result, Err(CacheError::Decode(_))));
    }

    #[tokio::test]
    async fn test_zero_width_rejected() {
        let store = MemoryStore::new();
        let cache = cache_with(&store);

        let result = cache.put(sample_id(), b"x", 0, Some(10), MEDIA).await;
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_connection_released_on_every_path() {
        let store = MemoryStore::with_pool(1, Duration::from_millis(50));
        let cache = cache_with(&store);

        cache.put(sample_id(), b"x", 10, None, MEDIA).await.unwrap();
        cache.get(sample_id(), 10, None, MEDIA).await.unwrap();
        cache.get_draft(sample_id(), 10, None, MEDIA).await.unwrap();
        cache.get_total_size(sample_id(), MEDIA).await.unwrap();
        cache.delete(sample_id(), MEDIA).await.unwrap();

        assert_eq!(store.available_connections(), 1);
    }

    #[tokio::test]
    async fn test_exhausted_pool_surfaces_connection_error() {
        let store = MemoryStore::with_pool(1, Duration::from_millis(20));
        let cache = cache_with(&store);
        let _held = store.connection().await.unwrap();

        let result = cache.delete(sample_id(), MEDIA).await;
        assert!(matches!(result, Err(CacheError::Connection(_))));
    }
}
