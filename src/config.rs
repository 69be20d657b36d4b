//! Configuration Module
//!
//! Loads backing-store and server settings from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use tokio::sync::Semaphore;

use crate::error::{CacheError, Result};

/// Default maximum number of pooled connections.
pub const DEFAULT_POOL_SIZE: usize = 1000;

/// Default pool acquisition timeout in seconds.
pub const DEFAULT_POOL_TIMEOUT_SECS: u64 = 1;

/// Largest accepted pool size.
pub const MAX_POOL_SIZE: usize = Semaphore::MAX_PERMITS;

// == Backend ==
/// Which backing store the host binary connects to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// Remote Redis through a connection pool
    #[default]
    Redis,
    /// In-process hash store, mainly for local runs
    Memory,
}

impl FromStr for Backend {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "redis" => Ok(Backend::Redis),
            "memory" => Ok(Backend::Memory),
            other => Err(CacheError::Configuration(format!(
                "Unknown cache backend '{}'",
                other
            ))),
        }
    }
}

/// Cache layer configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Backing store selection
    pub backend: Backend,
    /// Redis endpoint, required for the redis backend
    pub redis_url: Option<String>,
    /// Maximum number of pooled connections
    pub pool_size: usize,
    /// How long an operation may wait for a pooled connection
    pub pool_timeout: Duration,
    /// HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// Fails fast: a missing `REDIS_URL` for the redis backend, or any value
    /// that does not parse, is a configuration error.
    ///
    /// # Environment Variables
    /// - `CACHE_BACKEND` - `redis` or `memory` (default: redis)
    /// - `REDIS_URL` - Redis connection string
    /// - `REDIS_POOL_SIZE` - Maximum pooled connections (default: 1000)
    /// - `REDIS_POOL_TIMEOUT_SECS` - Pool wait timeout (default: 1)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a Config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend = match lookup("CACHE_BACKEND") {
            Some(v) => v.parse()?,
            None => Backend::default(),
        };

        let redis_url = lookup("REDIS_URL").filter(|v| !v.trim().is_empty());
        if backend == Backend::Redis && redis_url.is_none() {
            return Err(CacheError::Configuration(
                "Must provide a valid redis url (REDIS_URL)".to_string(),
            ));
        }

        let pool_size = parse_var(&lookup, "REDIS_POOL_SIZE", DEFAULT_POOL_SIZE)?;
        if pool_size == 0 || pool_size > MAX_POOL_SIZE {
            return Err(CacheError::Configuration(format!(
                "REDIS_POOL_SIZE must be between 1 and {}",
                MAX_POOL_SIZE
            )));
        }

        let timeout_secs =
            parse_var(&lookup, "REDIS_POOL_TIMEOUT_SECS", DEFAULT_POOL_TIMEOUT_SECS)?;
        if timeout_secs == 0 {
            return Err(CacheError::Configuration(
                "REDIS_POOL_TIMEOUT_SECS must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            backend,
            redis_url,
            pool_size,
            pool_timeout: Duration::from_secs(timeout_secs),
            server_port: parse_var(&lookup, "SERVER_PORT", 3000)?,
        })
    }
}

fn parse_var<F, T>(lookup: &F, name: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(raw) => raw.trim().parse().map_err(|_| {
            CacheError::Configuration(format!("Invalid value '{}' for {}", raw, name))
        }),
        None => Ok(default),
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: Backend::Memory,
            redis_url: None,
            pool_size: DEFAULT_POOL_SIZE,
            pool_timeout: Duration::from_secs(DEFAULT_POOL_TIMEOUT_SECS),
            server_port: 3000,
        }
    }
}
