//! Business services consumed by the HTTP handlers.
//!
//! Handlers depend on the [`EmployeeService`] and [`LeaveService`] traits,
//! never on the concrete managers, so stores and caches stay swappable.

pub mod cache_service;
pub mod employee_service;
pub mod leave_service;
pub mod prewarm;

use async_trait::async_trait;

use crate::error::ServiceError;
use crate::model::{Employee, Leave, LeaveStatus, NewLeave, Page, Pagination};

pub use cache_service::CacheService;
pub use employee_service::EmployeeManager;
pub use leave_service::LeaveManager;
pub use prewarm::PrewarmScheduler;

pub type Result<T> = std::result::Result<T, ServiceError>;

#[async_trait]
pub trait EmployeeService: Send + Sync {
    /// Fails with `Conflict` when the email is already taken.
    async fn create_employee(&self, employee: Employee) -> Result<Employee>;

    /// Cache-aside read.
    async fn get_employee(&self, id: u64) -> Result<Employee>;

    /// Replaces the record identified by `employee.id`.
    async fn update_employee(&self, employee: Employee) -> Result<Employee>;

    async fn delete_employee(&self, id: u64) -> Result<()>;

    /// Reads straight from the store.
    async fn list_employees(&self, pagination: Pagination) -> Result<Page<Employee>>;
}

#[async_trait]
pub trait LeaveService: Send + Sync {
    /// Validates the window, overlap and annual quota, then stores the
    /// request as `pending`.
    async fn create_leave(&self, request: NewLeave) -> Result<Leave>;

    /// Cache-aside read.
    async fn get_leave(&self, id: u64) -> Result<Leave>;

    /// Approves or rejects a pending leave.
    async fn update_leave_status(
        &self,
        id: u64,
        status: LeaveStatus,
        approver_id: u64,
        reject_reason: &str,
    ) -> Result<Leave>;

    /// Withdraws a pending leave on behalf of its owner.
    async fn cancel_leave(&self, id: u64, requesting_employee_id: u64) -> Result<Leave>;

    async fn delete_leave(&self, id: u64) -> Result<()>;

    /// Newest first, straight from the store.
    async fn list_leaves(
        &self,
        pagination: Pagination,
        employee_id: Option<u64>,
    ) -> Result<Page<Leave>>;
}
