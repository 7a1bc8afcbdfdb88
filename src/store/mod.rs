//! Relational store collaborators.
//!
//! The services only talk to the [`EmployeeStore`] and [`LeaveStore`]
//! traits. `mysql` is the production backend, `memory` backs tests and
//! the `STORE_BACKEND=memory` mode.

pub mod memory;
pub mod mysql;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SubsecRound, Utc};
use thiserror::Error;

use crate::model::{Employee, Leave, LeaveType, Pagination};

pub use memory::{InMemoryEmployeeStore, InMemoryLeaveStore};
pub use mysql::{MySqlEmployeeStore, MySqlLeaveStore};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),
    #[error("foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),
    #[error("corrupt row: {0}")]
    Corrupt(String),
    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.is_unique_violation() {
                return StoreError::UniqueViolation(db.message().to_string());
            }
            if db.is_foreign_key_violation() {
                return StoreError::ForeignKeyViolation(db.message().to_string());
            }
        }
        StoreError::Database(err)
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Persistence for employee records.
#[async_trait]
pub trait EmployeeStore: Send + Sync {
    /// Persists a new employee. The `id` and timestamps of the input are
    /// ignored and assigned by the store.
    async fn insert(&self, employee: &Employee) -> Result<Employee>;

    async fn find_by_id(&self, id: u64) -> Result<Option<Employee>>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Employee>>;

    /// Overwrites every mutable column. Returns `None` when `employee.id`
    /// does not exist.
    async fn update(&self, employee: &Employee) -> Result<Option<Employee>>;

    /// Returns whether a row was removed.
    async fn delete(&self, id: u64) -> Result<bool>;

    /// One page ordered by id, plus the total row count.
    async fn list(&self, pagination: Pagination) -> Result<(Vec<Employee>, u64)>;

    async fn all(&self) -> Result<Vec<Employee>>;
}

/// Persistence for leave records. Reads attach the employee snapshot.
#[async_trait]
pub trait LeaveStore: Send + Sync {
    /// Persists a new leave. The `id` and timestamps of the input are
    /// ignored and assigned by the store.
    async fn insert(&self, leave: &Leave) -> Result<Leave>;

    async fn find_by_id(&self, id: u64) -> Result<Option<Leave>>;

    /// Returns `None` when `leave.id` does not exist.
    async fn update(&self, leave: &Leave) -> Result<Option<Leave>>;

    async fn delete(&self, id: u64) -> Result<bool>;

    /// Newest first, optionally restricted to one employee.
    async fn list(
        &self,
        pagination: Pagination,
        employee_id: Option<u64>,
    ) -> Result<(Vec<Leave>, u64)>;

    async fn all(&self) -> Result<Vec<Leave>>;

    /// Every leave of `employee_id`, whatever its status, whose inclusive
    /// range intersects `[from, to]`.
    async fn find_in_range(
        &self,
        employee_id: u64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Leave>>;

    /// Total duration of approved leave of `leave_type` starting in `year`.
    async fn sum_approved_duration(
        &self,
        employee_id: u64,
        leave_type: LeaveType,
        year: i32,
    ) -> Result<i64>;
}

/// Store timestamps carry second precision so that a record read back
/// from MySQL equals the one returned by the write.
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}
