use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache;

use super::{CacheEntry, CacheStore, Result};

#[derive(Debug, Clone)]
struct CachedBytes {
    bytes: Arc<[u8]>,
    ttl: Duration,
}

/// Expires each entry after the TTL it was written with.
struct WrittenTtl;

impl Expiry<String, CachedBytes> for WrittenTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CachedBytes,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CachedBytes,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// In-process cache backed by moka.
#[derive(Clone)]
pub struct MokaCacheStore {
    cache: Cache<String, CachedBytes>,
}

impl MokaCacheStore {
    pub fn new(max_capacity: u64) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(max_capacity) // tune based on memory
                .expire_after(WrittenTtl)
                .build(),
        }
    }
}

#[async_trait]
impl CacheStore for MokaCacheStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.cache.get(key).await.map(|v| v.bytes.to_vec()))
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()> {
        self.cache
            .insert(
                key.to_string(),
                CachedBytes {
                    bytes: Arc::from(value),
                    ttl,
                },
            )
            .await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.cache.invalidate(key).await;
        Ok(())
    }

    async fn set_many(&self, entries: Vec<CacheEntry>) -> Result<()> {
        let inserts: Vec<_> = entries
            .into_iter()
            .map(|entry| {
                self.cache.insert(
                    entry.key,
                    CachedBytes {
                        bytes: Arc::from(entry.value),
                        ttl: entry.ttl,
                    },
                )
            })
            .collect();

        // Await all insertions concurrently
        futures::future::join_all(inserts).await;
        Ok(())
    }
}
