//! Background task that loads every employee and leave into the cache on
//! startup and then on a fixed interval.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::CacheService;
use super::cache_service::PrewarmStats;
use crate::cache::CacheError;
use crate::store::{EmployeeStore, LeaveStore, StoreError};

pub const DEFAULT_PREWARM_INTERVAL: Duration = Duration::from_secs(30 * 60);
const MIN_PREWARM_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum PrewarmError {
    #[error("failed to load records: {0}")]
    Store(#[from] StoreError),
    #[error("failed to write cache: {0}")]
    Cache(#[from] CacheError),
}

pub struct PrewarmScheduler {
    employees: Arc<dyn EmployeeStore>,
    leaves: Arc<dyn LeaveStore>,
    cache: Arc<CacheService>,
    interval: Duration,
}

impl PrewarmScheduler {
    pub fn new(
        employees: Arc<dyn EmployeeStore>,
        leaves: Arc<dyn LeaveStore>,
        cache: Arc<CacheService>,
    ) -> Self {
        Self {
            employees,
            leaves,
            cache,
            interval: DEFAULT_PREWARM_INTERVAL,
        }
    }

    /// Intervals below one second are raised to one second.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval.max(MIN_PREWARM_INTERVAL);
        self
    }

    /// One full pass: read everything, write it in a single bulk call.
    pub async fn prewarm_once(&self) -> Result<PrewarmStats, PrewarmError> {
        let employees = self.employees.all().await?;
        let leaves = self.leaves.all().await?;
        Ok(self.cache.prewarm_cache(&employees, &leaves).await?)
    }

    /// Spawns the loop. The first pass runs immediately, later passes every
    /// `interval`. A failed pass is logged and the loop keeps going.
    /// Cancelling `token` stops the loop, interrupting a pass in flight.
    pub fn start(self, token: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            tracing::info!(
                interval_secs = self.interval.as_secs(),
                "Cache prewarm scheduler started"
            );

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        tokio::select! {
                            _ = token.cancelled() => break,
                            result = self.prewarm_once() => {
                                if let Err(e) = result {
                                    tracing::error!(error = %e, "Cache prewarm failed");
                                }
                            }
                        }
                    }
                }
            }

            tracing::info!("Cache prewarm scheduler stopped");
        })
    }
}
