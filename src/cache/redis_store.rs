//! Redis cache backend.
//!
//! Bulk writes go through a single pipeline. The pipeline is not wrapped
//! in MULTI, so a failure part way through may leave some keys written;
//! every key carries its own TTL, so a partial prewarm only means some
//! reads miss until the next one.

use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;

use super::{CacheEntry, CacheError, CacheStore, Result};

fn map_redis_error(err: redis::RedisError) -> CacheError {
    CacheError::Backend(err.to_string())
}

/// `SET EX` takes whole seconds. Partial seconds round up, with a floor of one.
fn ttl_secs(ttl: Duration) -> u64 {
    let secs = ttl.as_secs() + u64::from(ttl.subsec_nanos() > 0);
    secs.max(1)
}

/// Redis cache backend using a connection manager for reconnects.
#[derive(Clone)]
pub struct RedisCacheStore {
    conn: redis::aio::ConnectionManager,
}

impl RedisCacheStore {
    /// Connects to `url` (e.g. `redis://localhost:6379`).
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url).map_err(map_redis_error)?;
        let conn = redis::aio::ConnectionManager::new(client)
            .await
            .map_err(map_redis_error)?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.conn.clone();
        let value: Option<Vec<u8>> = conn.get(key).await.map_err(map_redis_error)?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(key, value, ttl_secs(ttl))
            .await
            .map_err(map_redis_error)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key).await.map_err(map_redis_error)
    }

    async fn set_many(&self, entries: Vec<CacheEntry>) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }

        let mut pipe = redis::pipe();
        for entry in &entries {
            pipe.set_ex(&entry.key, entry.value.as_slice(), ttl_secs(entry.ttl))
                .ignore();
        }

        let mut conn = self.conn.clone();
        let _: () = pipe.query_async(&mut conn).await.map_err(map_redis_error)?;
        Ok(())
    }
}
