use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use super::employee::Employee;

/// Days of annual leave an employee may take per calendar year.
pub const ANNUAL_LEAVE_QUOTA_DAYS: i64 = 15;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeaveType {
    Annual,
    Sick,
    Personal,
    Maternity,
    Marriage,
    Bereavement,
}

/// Leave lifecycle: `pending` is the only state that can move, and only
/// to one of the three terminal states.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl LeaveStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, LeaveStatus::Pending)
    }

    pub fn can_transition_to(self, next: LeaveStatus) -> bool {
        self == LeaveStatus::Pending && next.is_terminal()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Leave {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = 1)]
    pub employee_id: u64,

    /// Snapshot of the owning employee, for display only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee: Option<Employee>,

    #[schema(example = "annual")]
    pub leave_type: LeaveType,

    #[schema(example = "2024-06-01", value_type = String, format = "date")]
    pub start_date: NaiveDate,

    #[schema(example = "2024-06-03", value_type = String, format = "date")]
    pub end_date: NaiveDate,

    /// Inclusive day count between `start_date` and `end_date`.
    #[schema(example = 3)]
    pub duration: i64,

    #[serde(default)]
    pub reason: String,

    #[schema(example = "pending")]
    pub status: LeaveStatus,

    #[serde(default)]
    pub approved_by: Option<u64>,

    #[serde(default)]
    #[schema(value_type = Option<String>, format = "date-time")]
    pub approved_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub reject_reason: String,

    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,

    #[schema(value_type = String, format = "date-time")]
    pub updated_at: DateTime<Utc>,
}

/// What a caller supplies to request leave; everything else is derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLeave {
    pub employee_id: u64,
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
}

impl Leave {
    /// Whether this leave still occupies its dates for the purpose of
    /// overlap checks. Cancelled leave frees its range.
    pub fn holds_dates(&self) -> bool {
        self.status != LeaveStatus::Cancelled
    }

    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        ranges_overlap(self.start_date, self.end_date, start, end)
    }
}

/// Inclusive day count, `start == end` is one day.
pub fn inclusive_days(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days() + 1
}

/// True when the inclusive ranges `[a_start, a_end]` and `[b_start, b_end]`
/// share at least one day.
pub fn ranges_overlap(
    a_start: NaiveDate,
    a_end: NaiveDate,
    b_start: NaiveDate,
    b_end: NaiveDate,
) -> bool {
    a_start <= b_end && a_end >= b_start
}

/// True when taking `requested` more annual days on top of `used` would go
/// past [`ANNUAL_LEAVE_QUOTA_DAYS`].
pub fn exceeds_annual_quota(used: i64, requested: i64) -> bool {
    used + requested > ANNUAL_LEAVE_QUOTA_DAYS
}
