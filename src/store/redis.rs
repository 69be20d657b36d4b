//! Redis Store
//!
//! [`HashStore`] backed by a `deadpool-redis` connection pool.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use deadpool_redis::{Pool, PoolConfig, PoolError, Runtime, Timeouts};
use redis::{AsyncCommands, RedisError};
use tracing::debug;

use super::{HashConnection, HashStore, PooledConnection};
use crate::config::Config;
use crate::error::{CacheError, Result};

// == Redis Store ==
/// Pooled connections to a Redis endpoint.
#[derive(Clone)]
pub struct RedisStore {
    pool: Pool,
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = self.pool.status();
        f.debug_struct("RedisStore")
            .field("max_size", &status.max_size)
            .field("size", &status.size)
            .field("available", &status.available)
            .finish()
    }
}

impl RedisStore {
    // == Constructor ==
    /// Creates a pool for the given endpoint.
    ///
    /// The URL is validated here; connections are opened lazily on first use.
    ///
    /// # Arguments
    /// * `url` - Redis connection string, e.g. `redis://127.0.0.1:6379`
    /// * `max_size` - Maximum number of pooled connections
    /// * `timeout` - Maximum wait for a connection to become available
    pub fn new(url: &str, max_size: usize, timeout: Duration) -> Result<Self> {
        if url.trim().is_empty() {
            return Err(CacheError::Configuration(
                "Must provide a valid redis url".to_string(),
            ));
        }

        if timeout.is_zero() {
            return Err(CacheError::Configuration(
                "Pool timeout must be greater than zero".to_string(),
            ));
        }

        let mut timeouts = Timeouts::default();
        timeouts.wait = Some(timeout);
        timeouts.create = Some(timeout);
        timeouts.recycle = Some(timeout);

        let mut pool_config = PoolConfig::new(max_size);
        pool_config.timeouts = timeouts;

        let mut config = deadpool_redis::Config::from_url(url);
        config.pool = Some(pool_config);

        let pool = config
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| CacheError::Configuration(format!("Invalid redis url: {}", e)))?;

        debug!(max_size, ?timeout, "Redis connection pool created");
        Ok(Self { pool })
    }

    /// Creates a pool from the loaded configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let url = config.redis_url.as_deref().ok_or_else(|| {
            CacheError::Configuration("Must provide a valid redis url".to_string())
        })?;
        Self::new(url, config.pool_size, config.pool_timeout)
    }
}

#[async_trait]
impl HashStore for RedisStore {
    async fn connection(&self) -> Result<PooledConnection> {
        let conn = self.pool.get().await.map_err(pool_error)?;
        Ok(Box::new(RedisConnection(conn)))
    }
}

// == Error Mapping ==
fn pool_error(err: PoolError) -> CacheError {
    match err {
        PoolError::Timeout(kind) => {
            CacheError::Connection(format!("Timed out waiting for connection ({:?})", kind))
        }
        other => CacheError::Connection(other.to_string()),
    }
}

fn command_error(err: RedisError) -> CacheError {
    if err.is_io_error() || err.is_connection_refusal() || err.is_timeout() {
        CacheError::Connection(err.to_string())
    } else {
        CacheError::Store(err.to_string())
    }
}

// == Redis Connection ==
struct RedisConnection(deadpool_redis::Connection);

#[async_trait]
impl HashConnection for RedisConnection {
    async fn hash_set_field(&mut self, hash: &str, field: &str, value: &str) -> Result<()> {
        let _: () = self.0.hset(hash, field, value).await.map_err(command_error)?;
        Ok(())
    }

    async fn hash_set_fields(&mut self, hash: &str, fields: &[(&str, &str)]) -> Result<()> {
        if fields.is_empty() {
            return Ok(());
        }
        let _: () = self
            .0
            .hset_multiple(hash, fields)
            .await
            .map_err(command_error)?;
        Ok(())
    }

    async fn hash_get_field(&mut self, hash: &str, field: &str) -> Result<Option<String>> {
        self.0.hget(hash, field).await.map_err(command_error)
    }

    async fn hash_get_fields(
        &mut self,
        hash: &str,
        fields: &[&str],
    ) -> Result<Vec<Option<String>>> {
        if fields.is_empty() {
            return Ok(Vec::new());
        }
        let values: Vec<Option<String>> = redis::cmd("HMGET")
            .arg(hash)
            .arg(fields)
            .query_async(&mut self.0)
            .await
            .map_err(command_error)?;
        Ok(values)
    }

    async fn hash_contains_field(&mut self, hash: &str, field: &str) -> Result<bool> {
        self.0.hexists(hash, field).await.map_err(command_error)
    }

    async fn hash_remove_fields(&mut self, hash: &str, fields: &[&str]) -> Result<()> {
        if fields.is_empty() {
            return Ok(());
        }
        let _: () = self.0.hdel(hash, fields).await.map_err(command_error)?;
        Ok(())
    }

    async fn hash_get_all(&mut self, hash: &str) -> Result<HashMap<String, String>> {
        self.0.hgetall(hash).await.map_err(command_error)
    }

    async fn remove_key(&mut self, hash: &str) -> Result<()> {
        let _: () = self.0.del(hash).await.map_err(command_error)?;
        Ok(())
    }
}
