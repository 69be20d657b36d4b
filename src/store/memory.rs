//! Memory Store
//!
//! In-process [`HashStore`] with Redis hash semantics. A semaphore stands in
//! for the connection pool so pool exhaustion and timeouts behave the same way
//! they do against a remote store.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{OwnedSemaphorePermit, RwLock, Semaphore};

use super::{HashConnection, HashStore, PooledConnection};
use crate::config::{DEFAULT_POOL_SIZE, DEFAULT_POOL_TIMEOUT_SECS};
use crate::error::{CacheError, Result};

type Hashes = Arc<RwLock<HashMap<String, HashMap<String, String>>>>;

// == Memory Store ==
/// Hash records held in process memory.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    /// Hash name -> (field -> value)
    hashes: Hashes,
    /// One permit per pooled connection
    permits: Arc<Semaphore>,
    /// Maximum wait for a permit
    timeout: Duration,
}

impl MemoryStore {
    // == Constructor ==
    /// Creates an empty store with the default pool size and timeout.
    pub fn new() -> Self {
        Self::with_pool(
            DEFAULT_POOL_SIZE,
            Duration::from_secs(DEFAULT_POOL_TIMEOUT_SECS),
        )
    }

    /// Creates an empty store that hands out at most `max_size` connections.
    ///
    /// # Arguments
    /// * `max_size` - Maximum number of concurrently checked-out connections,
    ///   capped at [`Semaphore::MAX_PERMITS`]
    /// * `timeout` - Maximum wait for a connection before failing
    pub fn with_pool(max_size: usize, timeout: Duration) -> Self {
        Self {
            hashes: Arc::new(RwLock::new(HashMap::new())),
            permits: Arc::new(Semaphore::new(max_size.min(Semaphore::MAX_PERMITS))),
            timeout,
        }
    }

    /// Number of connections that can be checked out right now.
    pub fn available_connections(&self) -> usize {
        self.permits.available_permits()
    }

    /// Number of hash records currently stored.
    pub async fn len(&self) -> usize {
        self.hashes.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.hashes.read().await.is_empty()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HashStore for MemoryStore {
    async fn connection(&self) -> Result<PooledConnection> {
        let permit = tokio::time::timeout(self.timeout, self.permits.clone().acquire_owned())
            .await
            .map_err(|_| {
                CacheError::Connection(format!(
                    "Timed out after {:?} waiting for a pooled connection",
                    self.timeout
                ))
            })?
            .map_err(|_| CacheError::Connection("Connection pool closed".to_string()))?;

        Ok(Box::new(MemoryConnection {
            hashes: self.hashes.clone(),
            _permit: permit,
        }))
    }
}

// == Memory Connection ==
/// Holds a pool permit for as long as the connection is alive.
struct MemoryConnection {
    hashes: Hashes,
    _permit: OwnedSemaphorePermit,
}

#[async_trait]
impl HashConnection for MemoryConnection {
    async fn hash_set_field(&mut self, hash: &str, field: &str, value: &str) -> Result<()> {
        self.hash_set_fields(hash, &[(field, value)]).await
    }

    async fn hash_set_fields(&mut self, hash: &str, fields: &[(&str, &str)]) -> Result<()> {
        if fields.is_empty() {
            return Ok(());
        }
        let mut hashes = self.hashes.write().await;
        let record = hashes.entry(hash.to_string()).or_default();
        for (field, value) in fields {
            record.insert(field.to_string(), value.to_string());
        }
        Ok(())
    }

    async fn hash_get_field(&mut self, hash: &str, field: &str) -> Result<Option<String>> {
        let hashes = self.hashes.read().await;
        Ok(hashes.get(hash).and_then(|record| record.get(field)).cloned())
    }

    async fn hash_get_fields(
        &mut self,
        hash: &str,
        fields: &[&str],
    ) -> Result<Vec<Option<String>>> {
        let hashes = self.hashes.read().await;
        let record = hashes.get(hash);
        Ok(fields
            .iter()
            .map(|field| record.and_then(|r| r.get(*field)).cloned())
            .collect())
    }

    async fn hash_contains_field(&mut self, hash: &str, field: &str) -> Result<bool> {
        let hashes = self.hashes.read().await;
        Ok(hashes
            .get(hash)
            .map(|record| record.contains_key(field))
            .unwrap_or(false))
    }

    async fn hash_remove_fields(&mut self, hash: &str, fields: &[&str]) -> Result<()> {
        let mut hashes = self.hashes.write().await;
        if let Some(record) = hashes.get_mut(hash) {
            for field in fields {
                record.remove(*field);
            }
            // Redis drops a hash once its last field is gone
            if record.is_empty() {
                hashes.remove(hash);
            }
        }
        Ok(())
    }

    async fn hash_get_all(&mut self, hash: &str) -> Result<HashMap<String, String>> {
        let hashes = self.hashes.read().await;
        Ok(hashes.get(hash).cloned().unwrap_or_default())
    }

    async fn remove_key(&mut self, hash: &str) -> Result<()> {
        self.hashes.write().await.remove(hash);
        Ok(())
    }
}
