//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the addressing and encoding properties of both
//! stores against the in-memory backend.

use std::sync::Arc;

use proptest::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cache::{
    item_key, GenericCacheStore, LifecycleState, MediaCacheStore, MediaCategory, Shape,
    ShapeRegistry,
};
use crate::store::MemoryStore;

// == Test Shapes ==
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Page {
    title: String,
    sort_order: i64,
    tags: Vec<String>,
    published: bool,
}

impl Shape for Page {
    const NAME: &'static str = "page";
}

// == Strategies ==
/// Generates cache keys, including ones with separators
fn valid_key_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_:.-]{1,64}".prop_map(|s| s)
}

fn page_strategy() -> impl Strategy<Value = Page> {
    (
        "[a-zA-Z0-9 ]{0,64}",
        any::<i64>(),
        prop::collection::vec("[a-z]{1,12}", 0..5),
        any::<bool>(),
    )
        .prop_map(|(title, sort_order, tags, published)| Page {
            title,
            sort_order,
            tags,
            published,
        })
}

fn category_strategy() -> impl Strategy<Value = MediaCategory> {
    prop_oneof![Just(MediaCategory::Media), Just(MediaCategory::Upload)]
}

fn dimension_strategy() -> impl Strategy<Value = (u32, Option<u32>)> {
    (1u32..4096, prop::option::of(1u32..4096))
}

fn id_strategy() -> impl Strategy<Value = Uuid> {
    any::<u128>().prop_map(Uuid::from_u128)
}

fn generic_cache(store: &MemoryStore) -> GenericCacheStore {
    GenericCacheStore::new(
        Arc::new(store.clone()),
        ShapeRegistry::with_builtins().with::<Page>(),
    )
}

fn media_cache(store: &MemoryStore) -> MediaCacheStore {
    MediaCacheStore::new(Arc::new(store.clone()))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Round-trip: set followed by get returns a structurally equal value
    #[test]
    fn prop_generic_roundtrip(key in valid_key_strategy(), page in page_strategy()) {
        let store = MemoryStore::new();
        let cache = generic_cache(&store);

        let retrieved = tokio_test::block_on(async {
            cache.set(&key, &page).await.unwrap();
            cache.get_as::<Page>(&key).await.unwrap()
        });

        prop_assert_eq!(retrieved, Some(page), "Round-trip value mismatch");
    }

    // Overwriting with a different shape returns the latest value
    #[test]
    fn prop_generic_overwrite(key in valid_key_strategy(), page in page_strategy(), n in any::<i64>()) {
        let store = MemoryStore::new();
        let cache = generic_cache(&store);

        let retrieved = tokio_test::block_on(async {
            cache.set(&key, &page).await.unwrap();
            cache.set(&key, &n).await.unwrap();
            cache.get(&key).await.unwrap()
        });

        let value = retrieved.expect("value should be present");
        prop_assert_eq!(value.shape(), "i64");
        prop_assert_eq!(value.downcast::<i64>(), Some(n));
    }

    // Removal is idempotent and leaves the key absent
    #[test]
    fn prop_remove_idempotent(key in valid_key_strategy(), page in page_strategy()) {
        let store = MemoryStore::new();
        let cache = generic_cache(&store);

        let (contains, value) = tokio_test::block_on(async {
            cache.remove(&key).await.unwrap();
            cache.set(&key, &page).await.unwrap();
            cache.remove(&key).await.unwrap();
            cache.remove(&key).await.unwrap();
            (cache.contains(&key).await.unwrap(), cache.get(&key).await.unwrap())
        });

        prop_assert!(!contains);
        prop_assert!(value.is_none());
    }

    // Changing only the lifecycle state never changes the dimension segments
    #[test]
    fn prop_item_key_determinism((width, height) in dimension_strategy()) {
        let published = item_key(width, height, LifecycleState::Published);
        let draft = item_key(width, height, LifecycleState::Draft);

        let published_dims = published.strip_prefix("published:").unwrap();
        let draft_dims = draft.strip_prefix("draft:").unwrap();
        prop_assert_eq!(published_dims, draft_dims);

        let expected = match height {
            Some(h) => format!("{}:{}", width, h),
            None => format!("{}:", width),
        };
        prop_assert_eq!(published_dims, expected.as_str());
    }

    // Published and draft variants of the same size never shadow each other
    #[test]
    fn prop_variant_isolation(
        id in id_strategy(),
        category in category_strategy(),
        (width, height) in dimension_strategy(),
        published in prop::collection::vec(any::<u8>(), 0..256),
        draft in prop::collection::vec(any::<u8>(), 0..256),
    ) {
        let store = MemoryStore::new();
        let cache = media_cache(&store);

        let (got, got_draft) = tokio_test::block_on(async {
            cache.put(id, &published, width, height, category).await.unwrap();
            cache.put_draft(id, &draft, width, height, category).await.unwrap();
            (
                cache.get(id, width, height, category).await.unwrap(),
                cache.get_draft(id, width, height, category).await.unwrap(),
            )
        });

        prop_assert_eq!(got, Some(published));
        prop_assert_eq!(got_draft, Some(draft));
    }

    // Delete removes every variant of the id in that category
    #[test]
    fn prop_bulk_delete(
        id in id_strategy(),
        category in category_strategy(),
        dims in prop::collection::vec(dimension_strategy(), 1..8),
    ) {
        let store = MemoryStore::new();
        let cache = media_cache(&store);

        let remaining = tokio_test::block_on(async {
            for (w, h) in &dims {
                cache.put(id, b"published", *w, *h, category).await.unwrap();
                cache.put_draft(id, b"draft", *w, *h, category).await.unwrap();
            }
            cache.delete(id, category).await.unwrap();

            let mut remaining = 0;
            for (w, h) in &dims {
                if cache.get(id, *w, *h, category).await.unwrap().is_some() {
                    remaining += 1;
                }
                if cache.get_draft(id, *w, *h, category).await.unwrap().is_some() {
                    remaining += 1;
                }
            }
            remaining
        });

        prop_assert_eq!(remaining, 0);
    }

    // Total size equals the sum of the distinct variants' lengths
    #[test]
    fn prop_total_size(
        id in id_strategy(),
        payloads in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..512), 0..6),
    ) {
        let store = MemoryStore::new();
        let cache = media_cache(&store);

        let total = tokio_test::block_on(async {
            for (i, payload) in payloads.iter().enumerate() {
                let width = (i + 1) as u32;
                cache.put(id, payload, width, None, MediaCategory::Media).await.unwrap();
            }
            cache.get_total_size(id, MediaCategory::Media).await.unwrap()
        });

        let expected: u64 = payloads.iter().map(|p| p.len() as u64).sum();
        prop_assert_eq!(total, expected);
    }

    // Deleting one category leaves the other untouched
    #[test]
    fn prop_category_separation(
        id in id_strategy(),
        (width, height) in dimension_strategy(),
        data in prop::collection::vec(any::<u8>(), 1..128),
    ) {
        let store = MemoryStore::new();
        let cache = media_cache(&store);

        let kept = tokio_test::block_on(async {
            cache.put(id, &data, width, height, MediaCategory::Media).await.unwrap();
            cache.put(id, &data, width, height, MediaCategory::Upload).await.unwrap();
            cache.delete(id, MediaCategory::Upload).await.unwrap();
            cache.get(id, width, height, MediaCategory::Media).await.unwrap()
        });

        prop_assert_eq!(kept, Some(data));
    }
}

#[test]
fn test_total_size_of_three_variants() {
    let store = MemoryStore::new();
    let cache = media_cache(&store);
    let id = Uuid::new_v4();

    let total = tokio_test::block_on(async {
        cache.put(id, &[1u8; 19], 100, Some(100), MediaCategory::Media).await.unwrap();
        cache.put(id, &[2u8; 21], 200, Some(200), MediaCategory::Media).await.unwrap();
        cache.put_draft(id, &[3u8; 22], 200, Some(200), MediaCategory::Media).await.unwrap();
        cache.get_total_size(id, MediaCategory::Media).await.unwrap()
    });

    assert_eq!(total, 62);
}
