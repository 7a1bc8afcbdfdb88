use std::sync::Arc;

use async_trait::async_trait;

use super::{CacheService, EmployeeService, Result};
use crate::cache::CacheError;
use crate::error::ServiceError;
use crate::model::{Employee, Page, Pagination};
use crate::store::EmployeeStore;

/// Employee CRUD over the store, with the cache kept warm on a best-effort
/// basis. A store write that succeeds is a success even when the cache
/// write after it fails; the failure is only logged.
pub struct EmployeeManager {
    store: Arc<dyn EmployeeStore>,
    cache: Arc<CacheService>,
}

impl EmployeeManager {
    pub fn new(store: Arc<dyn EmployeeStore>, cache: Arc<CacheService>) -> Self {
        Self { store, cache }
    }

    async fn ensure_email_free(&self, email: &str, owner: Option<u64>) -> Result<()> {
        match self.store.find_by_email(email).await? {
            Some(existing) if Some(existing.id) != owner => Err(ServiceError::Conflict(format!(
                "email {email} already exists"
            ))),
            _ => Ok(()),
        }
    }

    async fn cache_employee(&self, employee: &Employee) {
        if let Err(err) = self.cache.set_employee(employee).await {
            tracing::warn!(employee_id = employee.id, error = %err, "Failed to cache employee");
        }
    }
}

#[async_trait]
impl EmployeeService for EmployeeManager {
    async fn create_employee(&self, employee: Employee) -> Result<Employee> {
        self.ensure_email_free(&employee.email, None).await?;

        let created = self.store.insert(&employee).await?;
        self.cache_employee(&created).await;

        tracing::info!(employee_id = created.id, "Employee created");
        Ok(created)
    }

    async fn get_employee(&self, id: u64) -> Result<Employee> {
        match self.cache.get_employee(id).await {
            Ok(employee) => {
                tracing::trace!(employee_id = id, "Cache hit for employee");
                return Ok(employee);
            }
            Err(CacheError::Miss(_)) => {
                tracing::trace!(employee_id = id, "Cache miss for employee");
            }
            Err(err) => {
                tracing::warn!(employee_id = id, error = %err, "Employee cache read failed");
            }
        }

        let employee = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::employee_not_found(id))?;

        self.cache_employee(&employee).await;
        Ok(employee)
    }

    async fn update_employee(&self, employee: Employee) -> Result<Employee> {
        let current = self
            .store
            .find_by_id(employee.id)
            .await?
            .ok_or_else(|| ServiceError::employee_not_found(employee.id))?;

        if current.email != employee.email {
            self.ensure_email_free(&employee.email, Some(employee.id))
                .await?;
        }

        let updated = self
            .store
            .update(&employee)
            .await?
            .ok_or_else(|| ServiceError::employee_not_found(employee.id))?;
        self.cache_employee(&updated).await;

        tracing::info!(employee_id = updated.id, "Employee updated");
        Ok(updated)
    }

    async fn delete_employee(&self, id: u64) -> Result<()> {
        if !self.store.delete(id).await? {
            return Err(ServiceError::employee_not_found(id));
        }

        if let Err(err) = self.cache.delete_employee(id).await {
            tracing::warn!(employee_id = id, error = %err, "Failed to evict employee from cache");
        }

        tracing::info!(employee_id = id, "Employee deleted");
        Ok(())
    }

    async fn list_employees(&self, pagination: Pagination) -> Result<Page<Employee>> {
        let (items, total) = self.store.list(pagination).await?;
        Ok(Page {
            items,
            total,
            pagination,
        })
    }
}
