//! In-memory store backend.
//!
//! Uses ordered maps wrapped in `Arc<RwLock<_>>` for thread-safe access.
//! Data is not persisted and is lost when the store is dropped. The
//! employee store enforces email uniqueness the way the MySQL schema does,
//! and when built with [`InMemoryEmployeeStore::cascading_to`] deleting an
//! employee also deletes their leaves, like `ON DELETE CASCADE`.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use tokio::sync::RwLock;

use super::{EmployeeStore, LeaveStore, Result, StoreError, now};
use crate::model::{Employee, Leave, LeaveStatus, LeaveType, Pagination};

fn page_of<T: Clone>(items: &[T], pagination: Pagination) -> Vec<T> {
    items
        .iter()
        .skip(pagination.offset() as usize)
        .take(pagination.page_size() as usize)
        .cloned()
        .collect()
}

type LeaveMap = Arc<RwLock<BTreeMap<u64, Leave>>>;

#[derive(Debug, Clone, Default)]
pub struct InMemoryEmployeeStore {
    employees: Arc<RwLock<BTreeMap<u64, Employee>>>,
    next_id: Arc<AtomicU64>,
    cascade: Option<LeaveMap>,
}

impl InMemoryEmployeeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// An employee store whose deletes also remove the employee's leaves
    /// from `leaves`.
    pub fn cascading_to(leaves: &InMemoryLeaveStore) -> Self {
        Self {
            cascade: Some(leaves.leaves.clone()),
            ..Self::default()
        }
    }
}

#[async_trait]
impl EmployeeStore for InMemoryEmployeeStore {
    async fn insert(&self, employee: &Employee) -> Result<Employee> {
        let mut employees = self.employees.write().await;
        if employees.values().any(|e| e.email == employee.email) {
            return Err(StoreError::UniqueViolation(format!(
                "duplicate email {}",
                employee.email
            )));
        }

        let ts = now();
        let stored = Employee {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            created_at: ts,
            updated_at: ts,
            ..employee.clone()
        };
        employees.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, id: u64) -> Result<Option<Employee>> {
        Ok(self.employees.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Employee>> {
        Ok(self
            .employees
            .read()
            .await
            .values()
            .find(|e| e.email == email)
            .cloned())
    }

    async fn update(&self, employee: &Employee) -> Result<Option<Employee>> {
        let mut employees = self.employees.write().await;
        if employees
            .values()
            .any(|e| e.id != employee.id && e.email == employee.email)
        {
            return Err(StoreError::UniqueViolation(format!(
                "duplicate email {}",
                employee.email
            )));
        }

        let Some(existing) = employees.get_mut(&employee.id) else {
            return Ok(None);
        };
        *existing = Employee {
            created_at: existing.created_at,
            updated_at: now(),
            ..employee.clone()
        };
        Ok(Some(existing.clone()))
    }

    async fn delete(&self, id: u64) -> Result<bool> {
        let removed = self.employees.write().await.remove(&id).is_some();
        if removed {
            if let Some(leaves) = &self.cascade {
                leaves.write().await.retain(|_, l| l.employee_id != id);
            }
        }
        Ok(removed)
    }

    async fn list(&self, pagination: Pagination) -> Result<(Vec<Employee>, u64)> {
        let employees = self.employees.read().await;
        let all: Vec<Employee> = employees.values().cloned().collect();
        Ok((page_of(&all, pagination), all.len() as u64))
    }

    async fn all(&self) -> Result<Vec<Employee>> {
        Ok(self.employees.read().await.values().cloned().collect())
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryLeaveStore {
    leaves: LeaveMap,
    next_id: Arc<AtomicU64>,
}

impl InMemoryLeaveStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LeaveStore for InMemoryLeaveStore {
    async fn insert(&self, leave: &Leave) -> Result<Leave> {
        let ts = now();
        let stored = Leave {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            created_at: ts,
            updated_at: ts,
            ..leave.clone()
        };
        self.leaves.write().await.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, id: u64) -> Result<Option<Leave>> {
        Ok(self.leaves.read().await.get(&id).cloned())
    }

    async fn update(&self, leave: &Leave) -> Result<Option<Leave>> {
        let mut leaves = self.leaves.write().await;
        let Some(existing) = leaves.get_mut(&leave.id) else {
            return Ok(None);
        };
        *existing = Leave {
            created_at: existing.created_at,
            updated_at: now(),
            ..leave.clone()
        };
        Ok(Some(existing.clone()))
    }

    async fn delete(&self, id: u64) -> Result<bool> {
        Ok(self.leaves.write().await.remove(&id).is_some())
    }

    async fn list(
        &self,
        pagination: Pagination,
        employee_id: Option<u64>,
    ) -> Result<(Vec<Leave>, u64)> {
        let leaves = self.leaves.read().await;
        // Ids grow with insertion order, so reverse id order is newest first.
        let matching: Vec<Leave> = leaves
            .values()
            .rev()
            .filter(|l| employee_id.is_none_or(|id| l.employee_id == id))
            .cloned()
            .collect();
        Ok((page_of(&matching, pagination), matching.len() as u64))
    }

    async fn all(&self) -> Result<Vec<Leave>> {
        Ok(self.leaves.read().await.values().cloned().collect())
    }

    async fn find_in_range(
        &self,
        employee_id: u64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Leave>> {
        Ok(self
            .leaves
            .read()
            .await
            .values()
            .filter(|l| l.employee_id == employee_id && l.overlaps(from, to))
            .cloned()
            .collect())
    }

    async fn sum_approved_duration(
        &self,
        employee_id: u64,
        leave_type: LeaveType,
        year: i32,
    ) -> Result<i64> {
        Ok(self
            .leaves
            .read()
            .await
            .values()
            .filter(|l| {
                l.employee_id == employee_id
                    && l.leave_type == leave_type
                    && l.status == LeaveStatus::Approved
                    && l.start_date.year() == year
            })
            .map(|l| l.duration)
            .sum())
    }
}
