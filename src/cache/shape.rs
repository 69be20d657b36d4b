//! Shape Registry
//!
//! The generic cache stores values of any type in one untyped hash. Each
//! entry carries a shape tag, a stable name chosen by the host application,
//! and reads resolve that tag through a [`ShapeRegistry`] to decode the
//! payload back into the right Rust type.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::error::{CacheError, Result};

// == Shape ==
/// A type that can live in the generic cache under a stable shape name.
///
/// ```ignore
/// #[derive(Debug, Serialize, Deserialize)]
/// struct Page { title: String }
///
/// impl Shape for Page {
///     const NAME: &'static str = "page";
/// }
/// ```
pub trait Shape: Serialize + DeserializeOwned + fmt::Debug + Send + Sync + 'static {
    /// Stable shape name written as the entry's type tag.
    const NAME: &'static str;
}

impl Shape for String {
    const NAME: &'static str = "string";
}

impl Shape for bool {
    const NAME: &'static str = "bool";
}

impl Shape for i64 {
    const NAME: &'static str = "i64";
}

impl Shape for u64 {
    const NAME: &'static str = "u64";
}

impl Shape for f64 {
    const NAME: &'static str = "f64";
}

impl Shape for serde_json::Value {
    const NAME: &'static str = "json";
}

// == Cache Value ==
/// Type-erased value read from or written to the generic cache.
pub trait CacheValue: fmt::Debug + Send + Sync {
    /// Shape name of the concrete type.
    fn shape(&self) -> &'static str;

    /// Stored text form of the value.
    fn encode(&self) -> Result<String>;

    /// Value as a JSON tree.
    fn to_json(&self) -> Result<serde_json::Value>;

    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync>;
}

impl<T: Shape> CacheValue for T {
    fn shape(&self) -> &'static str {
        T::NAME
    }

    fn encode(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| CacheError::Encode(e.to_string()))
    }

    fn to_json(&self) -> Result<serde_json::Value> {
        serde_json::to_value(self).map_err(|e| CacheError::Encode(e.to_string()))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync> {
        self
    }
}

impl dyn CacheValue {
    /// Borrows the value as `T` if that is its concrete type.
    pub fn downcast_ref<T: Shape>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Takes the value as `T` if that is its concrete type.
    pub fn downcast<T: Shape>(self: Box<Self>) -> Option<T> {
        self.into_any().downcast::<T>().ok().map(|boxed| *boxed)
    }
}

// == Tag Encoding ==
/// Stored text form of a shape tag: the name as a JSON string.
pub fn encode_tag(shape: &str) -> Result<String> {
    serde_json::to_string(shape).map_err(|e| CacheError::Encode(e.to_string()))
}

/// Reads a shape name back out of its stored text form.
pub fn decode_tag(stored: &str) -> Result<String> {
    serde_json::from_str(stored)
        .map_err(|e| CacheError::Decode(format!("Malformed type tag {}: {}", stored, e)))
}

// == Shape Registry ==
type Decoder = fn(&str) -> serde_json::Result<Box<dyn CacheValue>>;

fn decode_as<T: Shape>(payload: &str) -> serde_json::Result<Box<dyn CacheValue>> {
    let value: T = serde_json::from_str(payload)?;
    Ok(Box::new(value))
}

/// Shapes the host application knows how to decode.
#[derive(Clone, Default)]
pub struct ShapeRegistry {
    decoders: HashMap<&'static str, Decoder>,
}

impl fmt::Debug for ShapeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.decoders.keys().collect();
        names.sort();
        f.debug_struct("ShapeRegistry").field("shapes", &names).finish()
    }
}

impl ShapeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the primitive shapes
    /// (`string`, `bool`, `i64`, `u64`, `f64`, `json`).
    pub fn with_builtins() -> Self {
        Self::new()
            .with::<String>()
            .with::<bool>()
            .with::<i64>()
            .with::<u64>()
            .with::<f64>()
            .with::<serde_json::Value>()
    }

    /// Builder form of [`ShapeRegistry::register`].
    pub fn with<T: Shape>(mut self) -> Self {
        self.register::<T>();
        self
    }

    /// Registers `T` under `T::NAME`. A later registration under the same
    /// name replaces the earlier one.
    pub fn register<T: Shape>(&mut self) -> &mut Self {
        if self.decoders.insert(T::NAME, decode_as::<T>).is_some() {
            warn!(shape = T::NAME, "Shape registered twice, keeping the latest");
        }
        self
    }

    pub fn contains(&self, shape: &str) -> bool {
        self.decoders.contains_key(shape)
    }

    /// Registered shape names, sorted.
    pub fn shapes(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.decoders.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Decodes `payload` as the shape named `shape`.
    ///
    /// Unknown shapes and payloads that do not fit the shape are decode errors.
    pub fn decode(&self, shape: &str, payload: &str) -> Result<Box<dyn CacheValue>> {
        let decoder = self
            .decoders
            .get(shape)
            .ok_or_else(|| CacheError::Decode(format!("Unknown shape '{}'", shape)))?;
        decoder(payload).map_err(|e| {
            CacheError::Decode(format!("Payload does not match shape '{}': {}", shape, e))
        })
    }
}
