//! Key Construction
//!
//! Hash-record and field names for both caches. These strings are the
//! addressable key space in the backing store and must stay stable.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CacheError, Result};

/// Hash record holding every generic cache entry.
pub const CACHE_HASH: &str = "piranha:cache";

/// Suffix of the field holding an entry's type tag.
pub const TYPE_SUFFIX: &str = ":type";

/// Field name of the type tag paired with `key`.
pub fn type_key(key: &str) -> String {
    format!("{}{}", key, TYPE_SUFFIX)
}

// == Media Category ==
/// Logical media store a binary belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaCategory {
    #[default]
    Media,
    Upload,
}

impl MediaCategory {
    /// Hash-record prefix for this category.
    pub fn prefix(&self) -> &'static str {
        match self {
            MediaCategory::Media => "piranha:media",
            MediaCategory::Upload => "piranha:upload",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaCategory::Media => "media",
            MediaCategory::Upload => "upload",
        }
    }
}

impl fmt::Display for MediaCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaCategory {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "media" => Ok(MediaCategory::Media),
            "upload" => Ok(MediaCategory::Upload),
            other => Err(CacheError::InvalidRequest(format!(
                "Unknown media category '{}'",
                other
            ))),
        }
    }
}

// == Lifecycle State ==
/// Whether a cached variant belongs to the published or the draft version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    #[default]
    Published,
    Draft,
}

impl LifecycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Published => "published",
            LifecycleState::Draft => "draft",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LifecycleState {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "published" => Ok(LifecycleState::Published),
            "draft" => Ok(LifecycleState::Draft),
            other => Err(CacheError::InvalidRequest(format!(
                "Unknown lifecycle state '{}'",
                other
            ))),
        }
    }
}

// == Media Variant ==
/// One (state, width, height) combination of a media item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MediaVariant {
    pub state: LifecycleState,
    pub width: u32,
    pub height: Option<u32>,
}

impl MediaVariant {
    /// Creates a variant, rejecting zero dimensions.
    pub fn new(state: LifecycleState, width: u32, height: Option<u32>) -> Result<Self> {
        if width == 0 {
            return Err(CacheError::InvalidRequest(
                "Width must be a positive integer".to_string(),
            ));
        }
        if height == Some(0) {
            return Err(CacheError::InvalidRequest(
                "Height must be a positive integer".to_string(),
            ));
        }
        Ok(Self {
            state,
            width,
            height,
        })
    }

    /// Field name of this variant inside the item's hash record.
    pub fn item_key(&self) -> String {
        item_key(self.width, self.height, self.state)
    }
}

/// Hash-record name holding every variant of `id` in `category`.
pub fn hash_key(category: MediaCategory, id: &Uuid) -> String {
    format!("{}:{}", category.prefix(), id.hyphenated())
}

/// Field name of one variant. A missing height renders as an empty segment,
/// so `item_key(100, None, Published)` is `"published:100:"`.
pub fn item_key(width: u32, height: Option<u32>, state: LifecycleState) -> String {
    match height {
        Some(height) => format!("{}:{}:{}", state, width, height),
        None => format!("{}:{}:", state, width),
    }
}
