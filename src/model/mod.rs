pub mod employee;
pub mod leave;
pub mod pagination;

pub use employee::{Employee, EmployeeStatus};
pub use leave::{
    ANNUAL_LEAVE_QUOTA_DAYS, Leave, LeaveStatus, LeaveType, NewLeave, exceeds_annual_quota,
    inclusive_days, ranges_overlap,
};
pub use pagination::{Page, PageQuery, Pagination};
