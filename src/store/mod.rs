//! Backing Store Module
//!
//! The capability surface both caches consume from a hash-oriented key-value
//! store, plus the pooled-connection discipline around it.
//!
//! Every cache operation calls [`HashStore::connection`] once, issues its hash
//! commands on the returned connection, and lets the connection drop before
//! returning. Dropping a [`PooledConnection`] hands it back to the pool, so the
//! connection is released on success, miss, and error paths alike.

mod memory;
mod redis;

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::Result;

pub use self::memory::MemoryStore;
pub use self::redis::RedisStore;

/// A connection checked out of a pool. Released when dropped.
pub type PooledConnection = Box<dyn HashConnection>;

// == Hash Connection ==
/// Hash commands available on a single pooled connection.
#[async_trait]
pub trait HashConnection: Send {
    /// Sets one field of a hash record.
    async fn hash_set_field(&mut self, hash: &str, field: &str, value: &str) -> Result<()>;

    /// Sets several fields of a hash record in a single write.
    async fn hash_set_fields(&mut self, hash: &str, fields: &[(&str, &str)]) -> Result<()>;

    /// Reads one field, `None` when the field is absent.
    async fn hash_get_field(&mut self, hash: &str, field: &str) -> Result<Option<String>>;

    /// Reads several fields in a single round trip, preserving order.
    async fn hash_get_fields(&mut self, hash: &str, fields: &[&str])
        -> Result<Vec<Option<String>>>;

    async fn hash_contains_field(&mut self, hash: &str, field: &str) -> Result<bool>;

    /// Removes fields from a hash record. Absent fields are ignored.
    async fn hash_remove_fields(&mut self, hash: &str, fields: &[&str]) -> Result<()>;

    /// Reads every field of a hash record; empty when the record is absent.
    async fn hash_get_all(&mut self, hash: &str) -> Result<HashMap<String, String>>;

    /// Removes a whole hash record with all its fields.
    async fn remove_key(&mut self, hash: &str) -> Result<()>;
}

// == Hash Store ==
/// A pool of connections to a hash store.
#[async_trait]
pub trait HashStore: Send + Sync {
    /// Checks a connection out of the pool.
    ///
    /// Waits at most the pool timeout; an exhausted pool or unreachable
    /// endpoint yields [`crate::error::CacheError::Connection`].
    async fn connection(&self) -> Result<PooledConnection>;
}
