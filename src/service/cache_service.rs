//! Typed read-through helper over a [`CacheStore`].
//!
//! Keys are namespaced per entity (`employee:<id>`, `leave:<id>`) and every
//! entity type has a fixed TTL. Values are JSON.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::cache::{CacheEntry, CacheError, CacheStore, Result};
use crate::model::{Employee, Leave};

pub const EMPLOYEE_KEY_PREFIX: &str = "employee:";
pub const LEAVE_KEY_PREFIX: &str = "leave:";

pub const EMPLOYEE_CACHE_TTL: Duration = Duration::from_secs(30 * 60);
pub const LEAVE_CACHE_TTL: Duration = Duration::from_secs(15 * 60);

pub fn employee_key(id: u64) -> String {
    format!("{EMPLOYEE_KEY_PREFIX}{id}")
}

pub fn leave_key(id: u64) -> String {
    format!("{LEAVE_KEY_PREFIX}{id}")
}

/// Counts of what a prewarm pass actually wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrewarmStats {
    pub employees: usize,
    pub leaves: usize,
    pub skipped: usize,
}

#[derive(Clone)]
pub struct CacheService {
    store: Arc<dyn CacheStore>,
}

impl CacheService {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        let bytes = self
            .store
            .get(key)
            .await?
            .ok_or_else(|| CacheError::Miss(key.to_string()))?;

        serde_json::from_slice(&bytes).map_err(|e| CacheError::Deserialization {
            key: key.to_string(),
            reason: e.to_string(),
        })
    }

    async fn set_json<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) -> Result<()> {
        let bytes = encode(key, value)?;
        self.store.set(key, &bytes, ttl).await
    }

    pub async fn get_employee(&self, id: u64) -> Result<Employee> {
        self.get_json(&employee_key(id)).await
    }

    pub async fn set_employee(&self, employee: &Employee) -> Result<()> {
        self.set_json(&employee_key(employee.id), employee, EMPLOYEE_CACHE_TTL)
            .await
    }

    pub async fn delete_employee(&self, id: u64) -> Result<()> {
        self.store.delete(&employee_key(id)).await
    }

    pub async fn get_leave(&self, id: u64) -> Result<Leave> {
        self.get_json(&leave_key(id)).await
    }

    pub async fn set_leave(&self, leave: &Leave) -> Result<()> {
        self.set_json(&leave_key(leave.id), leave, LEAVE_CACHE_TTL)
            .await
    }

    pub async fn delete_leave(&self, id: u64) -> Result<()> {
        self.store.delete(&leave_key(id)).await
    }

    /// Writes every record in one bulk call. A record that fails to
    /// serialize is logged and skipped; only the bulk write itself can fail.
    pub async fn prewarm_cache(
        &self,
        employees: &[Employee],
        leaves: &[Leave],
    ) -> Result<PrewarmStats> {
        let mut stats = PrewarmStats::default();
        let mut entries = Vec::with_capacity(employees.len() + leaves.len());

        for employee in employees {
            let key = employee_key(employee.id);
            match encode(&key, employee) {
                Ok(value) => {
                    entries.push(CacheEntry {
                        key,
                        value,
                        ttl: EMPLOYEE_CACHE_TTL,
                    });
                    stats.employees += 1;
                }
                Err(e) => {
                    tracing::warn!(
                        employee_id = employee.id,
                        error = %e,
                        "Skipping employee in prewarm"
                    );
                    stats.skipped += 1;
                }
            }
        }

        for leave in leaves {
            let key = leave_key(leave.id);
            match encode(&key, leave) {
                Ok(value) => {
                    entries.push(CacheEntry {
                        key,
                        value,
                        ttl: LEAVE_CACHE_TTL,
                    });
                    stats.leaves += 1;
                }
                Err(e) => {
                    tracing::warn!(leave_id = leave.id, error = %e, "Skipping leave in prewarm");
                    stats.skipped += 1;
                }
            }
        }

        self.store.set_many(entries).await?;

        tracing::info!(
            employees = stats.employees,
            leaves = stats.leaves,
            skipped = stats.skipped,
            "Cache prewarm complete"
        );
        Ok(stats)
    }
}

fn encode<T: Serialize>(key: &str, value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| CacheError::Serialization {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MokaCacheStore;
    use crate::service::test_support::{employee, leave};
    use crate::model::LeaveStatus;

    fn service() -> (CacheService, Arc<MokaCacheStore>) {
        let store = Arc::new(MokaCacheStore::new(1_000));
        (CacheService::new(store.clone()), store)
    }

    #[test]
    fn test_keys_are_namespaced() {
        assert_eq!(employee_key(1), "employee:1");
        assert_eq!(leave_key(22), "leave:22");
    }

    #[tokio::test]
    async fn test_employee_round_trip_and_miss() {
        let (cache, _) = service();
        let mut e = employee("a@x.com");
        e.id = 1;

        assert!(matches!(
            cache.get_employee(1).await,
            Err(CacheError::Miss(key)) if key == "employee:1"
        ));

        cache.set_employee(&e).await.unwrap();
        assert_eq!(cache.get_employee(1).await.unwrap(), e);

        cache.delete_employee(1).await.unwrap();
        assert!(matches!(cache.get_employee(1).await, Err(CacheError::Miss(_))));
    }

    #[tokio::test]
    async fn test_garbage_bytes_are_a_deserialization_error() {
        let (cache, store) = service();
        store
            .set("leave:5", b"not json", LEAVE_CACHE_TTL)
            .await
            .unwrap();

        assert!(matches!(
            cache.get_leave(5).await,
            Err(CacheError::Deserialization { .. })
        ));
    }

    #[tokio::test]
    async fn test_prewarm_writes_both_namespaces() {
        let (cache, _) = service();
        let mut e = employee("a@x.com");
        e.id = 3;
        let mut l = leave(3, (2024, 6, 1), (2024, 6, 3), LeaveStatus::Approved);
        l.id = 8;

        let stats = cache
            .prewarm_cache(std::slice::from_ref(&e), std::slice::from_ref(&l))
            .await
            .unwrap();
        assert_eq!(
            stats,
            PrewarmStats {
                employees: 1,
                leaves: 1,
                skipped: 0
            }
        );
        assert_eq!(cache.get_employee(3).await.unwrap(), e);
        assert_eq!(cache.get_leave(8).await.unwrap(), l);
    }
}
