use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, SubsecRound, Utc};

use super::{CacheService, LeaveService, Result};
use crate::cache::CacheError;
use crate::error::ServiceError;
use crate::model::{
    ANNUAL_LEAVE_QUOTA_DAYS, Leave, LeaveStatus, LeaveType, NewLeave, Page, Pagination,
    exceeds_annual_quota, inclusive_days,
};
use crate::store::{EmployeeStore, LeaveStore};

/// Leave requests and their approval workflow.
///
/// Creation checks run in a fixed order: the employee must exist, the
/// window must be well formed, it must not collide with another leave
/// that still holds its dates, and annual leave must fit the yearly quota.
pub struct LeaveManager {
    leaves: Arc<dyn LeaveStore>,
    employees: Arc<dyn EmployeeStore>,
    cache: Arc<CacheService>,
}

impl LeaveManager {
    pub fn new(
        leaves: Arc<dyn LeaveStore>,
        employees: Arc<dyn EmployeeStore>,
        cache: Arc<CacheService>,
    ) -> Self {
        Self {
            leaves,
            employees,
            cache,
        }
    }

    async fn ensure_no_overlap(
        &self,
        employee_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<()> {
        let clash = self
            .leaves
            .find_in_range(employee_id, start, end)
            .await?
            .into_iter()
            .find(|l| l.holds_dates() && l.overlaps(start, end));

        match clash {
            Some(existing) => Err(ServiceError::Conflict(format!(
                "leave overlaps existing leave {} ({} to {})",
                existing.id, existing.start_date, existing.end_date
            ))),
            None => Ok(()),
        }
    }

    /// Annual quota is counted per calendar year of the leave's start date,
    /// over approved annual leave only.
    async fn ensure_within_quota(
        &self,
        employee_id: u64,
        start: NaiveDate,
        requested: i64,
    ) -> Result<()> {
        let used = self
            .leaves
            .sum_approved_duration(employee_id, LeaveType::Annual, start.year())
            .await?;

        if exceeds_annual_quota(used, requested) {
            return Err(ServiceError::QuotaExceeded {
                used,
                requested,
                quota: ANNUAL_LEAVE_QUOTA_DAYS,
            });
        }
        Ok(())
    }

    async fn load(&self, id: u64) -> Result<Leave> {
        self.leaves
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::leave_not_found(id))
    }

    async fn save(&self, leave: &Leave) -> Result<Leave> {
        let saved = self
            .leaves
            .update(leave)
            .await?
            .ok_or_else(|| ServiceError::leave_not_found(leave.id))?;
        self.cache_leave(&saved).await;
        Ok(saved)
    }

    async fn cache_leave(&self, leave: &Leave) {
        if let Err(err) = self.cache.set_leave(leave).await {
            tracing::warn!(leave_id = leave.id, error = %err, "Failed to cache leave");
        }
    }
}

#[async_trait]
impl LeaveService for LeaveManager {
    async fn create_leave(&self, request: NewLeave) -> Result<Leave> {
        let employee = self
            .employees
            .find_by_id(request.employee_id)
            .await?
            .ok_or_else(|| ServiceError::employee_not_found(request.employee_id))?;

        if request.start_date > request.end_date {
            return Err(ServiceError::Validation(
                "start_date must not be after end_date".to_string(),
            ));
        }
        let duration = inclusive_days(request.start_date, request.end_date);

        self.ensure_no_overlap(employee.id, request.start_date, request.end_date)
            .await?;

        if request.leave_type == LeaveType::Annual {
            self.ensure_within_quota(employee.id, request.start_date, duration)
                .await?;
        }

        let now = Utc::now();
        let leave = Leave {
            id: 0,
            employee_id: employee.id,
            employee: Some(employee),
            leave_type: request.leave_type,
            start_date: request.start_date,
            end_date: request.end_date,
            duration,
            reason: request.reason,
            status: LeaveStatus::Pending,
            approved_by: None,
            approved_at: None,
            reject_reason: String::new(),
            created_at: now,
            updated_at: now,
        };

        let created = self.leaves.insert(&leave).await?;
        self.cache_leave(&created).await;

        tracing::info!(
            leave_id = created.id,
            employee_id = created.employee_id,
            leave_type = %created.leave_type,
            duration = created.duration,
            "Leave requested"
        );
        Ok(created)
    }

    async fn get_leave(&self, id: u64) -> Result<Leave> {
        match self.cache.get_leave(id).await {
            Ok(leave) => return Ok(leave),
            Err(CacheError::Miss(_)) => {
                tracing::trace!(leave_id = id, "Cache miss for leave");
            }
            Err(err) => {
                tracing::warn!(leave_id = id, error = %err, "Leave cache read failed");
            }
        }

        let leave = self.load(id).await?;
        self.cache_leave(&leave).await;
        Ok(leave)
    }

    async fn update_leave_status(
        &self,
        id: u64,
        status: LeaveStatus,
        approver_id: u64,
        reject_reason: &str,
    ) -> Result<Leave> {
        let mut leave = self.load(id).await?;

        if leave.status != LeaveStatus::Pending {
            return Err(ServiceError::InvalidState {
                id,
                status: leave.status,
            });
        }

        match status {
            LeaveStatus::Approved => {
                if leave.leave_type == LeaveType::Annual {
                    self.ensure_within_quota(leave.employee_id, leave.start_date, leave.duration)
                        .await?;
                }
            }
            LeaveStatus::Rejected => {
                if reject_reason.trim().is_empty() {
                    return Err(ServiceError::Validation(
                        "reject_reason is required when rejecting leave".to_string(),
                    ));
                }
            }
            other => {
                return Err(ServiceError::Validation(format!(
                    "status must be approved or rejected, got {other}"
                )));
            }
        }

        leave.status = status;
        leave.approved_by = Some(approver_id);
        leave.approved_at = Some(Utc::now().trunc_subsecs(0));
        leave.reject_reason = if status == LeaveStatus::Rejected {
            reject_reason.to_string()
        } else {
            String::new()
        };

        let saved = self.save(&leave).await?;
        tracing::info!(
            leave_id = id,
            status = %saved.status,
            approver_id,
            "Leave status updated"
        );
        Ok(saved)
    }

    async fn cancel_leave(&self, id: u64, requesting_employee_id: u64) -> Result<Leave> {
        let mut leave = self.load(id).await?;

        if leave.employee_id != requesting_employee_id {
            return Err(ServiceError::Authorization(
                "only the owner can cancel this leave".to_string(),
            ));
        }
        if !leave.status.can_transition_to(LeaveStatus::Cancelled) {
            return Err(ServiceError::InvalidState {
                id,
                status: leave.status,
            });
        }

        leave.status = LeaveStatus::Cancelled;
        let saved = self.save(&leave).await?;

        tracing::info!(leave_id = id, employee_id = requesting_employee_id, "Leave cancelled");
        Ok(saved)
    }

    async fn delete_leave(&self, id: u64) -> Result<()> {
        if !self.leaves.delete(id).await? {
            return Err(ServiceError::leave_not_found(id));
        }

        if let Err(err) = self.cache.delete_leave(id).await {
            tracing::warn!(leave_id = id, error = %err, "Failed to evict leave from cache");
        }

        tracing::info!(leave_id = id, "Leave deleted");
        Ok(())
    }

    async fn list_leaves(
        &self,
        pagination: Pagination,
        employee_id: Option<u64>,
    ) -> Result<Page<Leave>> {
        let (items, total) = self.leaves.list(pagination, employee_id).await?;
        Ok(Page {
            items,
            total,
            pagination,
        })
    }
}
