use crate::api::employee::{EmployeeInput, EmployeeListResponse};
use crate::api::leave::{CreateLeaveRequest, LeaveFilter, LeaveListResponse, UpdateStatusRequest};
use crate::model::{Employee, EmployeeStatus, Leave, LeaveStatus, LeaveType};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HRM Leave API",
        version = "1.0.0",
        description = r#"
## Employee & Leave Management

Employee records and the leave approval workflow of an HR system.

### Key Features
- **Employee Management**
  - Create, update, list, view and delete employee profiles
- **Leave Management**
  - Request leave, approve/reject, cancel your own pending request
  - Overlapping requests are refused
  - Annual leave is capped at 15 approved days per calendar year

### Caching
Single-record reads are served from a cache that is refreshed on every
write and fully re-populated in the background every 30 minutes.

### Response Format
- JSON-based RESTful responses
- Errors are `{"message": "..."}`
- Pagination (`page`, `page_size`) supported for list endpoints

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::health::ping,

        crate::api::employee::create_employee,
        crate::api::employee::get_employee,
        crate::api::employee::list_employees,
        crate::api::employee::update_employee,
        crate::api::employee::delete_employee,

        crate::api::leave::create_leave,
        crate::api::leave::list_leaves,
        crate::api::leave::get_leave,
        crate::api::leave::update_leave_status,
        crate::api::leave::cancel_leave,
        crate::api::leave::delete_leave
    ),
    components(
        schemas(
            Employee,
            EmployeeStatus,
            EmployeeInput,
            EmployeeListResponse,
            Leave,
            LeaveType,
            LeaveStatus,
            LeaveFilter,
            CreateLeaveRequest,
            UpdateStatusRequest,
            LeaveListResponse
        )
    ),
    tags(
        (name = "Health", description = "Liveness check"),
        (name = "Employee", description = "Employee management APIs"),
        (name = "Leave", description = "Leave management APIs"),
    )
)]
pub struct ApiDoc;
