//! Key-value cache collaborators.
//!
//! `moka_store` keeps entries in-process, `redis_store` talks to a shared
//! Redis. Both honour a per-key TTL.

pub mod moka_store;
pub mod redis_store;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub use moka_store::MokaCacheStore;
pub use redis_store::RedisCacheStore;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("cache miss: {0}")]
    Miss(String),
    #[error("failed to deserialize cached value {key}: {reason}")]
    Deserialization { key: String, reason: String },
    #[error("failed to serialize value for {key}: {reason}")]
    Serialization { key: String, reason: String },
    #[error("cache backend error: {0}")]
    Backend(String),
}

pub type Result<T> = std::result::Result<T, CacheError>;

/// One write of a bulk [`CacheStore::set_many`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub key: String,
    pub value: Vec<u8>,
    pub ttl: Duration,
}

#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()>;

    async fn delete(&self, key: &str) -> Result<()>;

    /// Writes every entry, pipelined where the backend supports it.
    async fn set_many(&self, entries: Vec<CacheEntry>) -> Result<()>;
}
