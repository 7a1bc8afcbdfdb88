use actix_web::{HttpRequest, HttpResponse, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

use crate::error::ServiceError;
use crate::model::{Leave, LeaveStatus, LeaveType, NewLeave, Pagination};
use crate::service::LeaveService;

/// Header carrying the id of the employee acting on their own leave.
pub const EMPLOYEE_ID_HEADER: &str = "X-Employee-ID";

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateLeaveRequest {
    #[schema(example = 1)]
    pub employee_id: u64,
    #[schema(example = "annual")]
    pub leave_type: LeaveType, // enum ensures Swagger dropdown
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-03", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[serde(default)]
    #[schema(example = "Family trip")]
    pub reason: String,
}

impl From<CreateLeaveRequest> for NewLeave {
    fn from(req: CreateLeaveRequest) -> Self {
        NewLeave {
            employee_id: req.employee_id,
            leave_type: req.leave_type,
            start_date: req.start_date,
            end_date: req.end_date,
            reason: req.reason,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    #[schema(example = "approved")]
    pub status: LeaveStatus,
    #[schema(example = 2)]
    pub approver_id: u64,
    /// Required when rejecting
    #[serde(default)]
    #[schema(example = "")]
    pub reject_reason: String,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct LeaveFilter {
    #[schema(example = 123)]
    /// Filter by employee ID
    pub employee_id: Option<u64>,
    #[schema(example = 1)]
    /// Pagination page number (start with 1)
    pub page: Option<u32>,
    #[schema(example = 10)]
    /// Items per page, at most 100
    pub page_size: Option<u32>,
}

#[derive(Serialize, ToSchema)]
pub struct LeaveListResponse {
    pub data: Vec<Leave>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub page_size: u32,
    #[schema(example = 1)]
    pub total: u64,
}

fn requesting_employee(req: &HttpRequest) -> Result<u64, ServiceError> {
    req.headers()
        .get(EMPLOYEE_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
        .ok_or_else(|| {
            ServiceError::Validation(format!("{EMPLOYEE_ID_HEADER} header must be an employee id"))
        })
}

/* =========================
Create leave request
========================= */
#[utoipa::path(
    post,
    path = "/api/leaves",
    request_body(
        content = CreateLeaveRequest,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave request submitted as pending", body = Leave),
        (status = 400, description = "start_date after end_date"),
        (status = 404, description = "Employee not found"),
        (
            status = 409,
            description = "Overlapping leave or annual quota exceeded",
            body = Object,
            example = json!({
                "message": "annual leave quota exceeded: 12 days used, 4 requested, quota is 15"
            })
        )
    ),
    tag = "Leave"
)]
pub async fn create_leave(
    svc: web::Data<dyn LeaveService>,
    payload: web::Json<CreateLeaveRequest>,
) -> Result<HttpResponse, ServiceError> {
    let created = svc.create_leave(payload.into_inner().into()).await?;
    Ok(HttpResponse::Created().json(created))
}

/* =========================
List leave requests
========================= */
#[utoipa::path(
    get,
    path = "/api/leaves",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Leave requests, newest first", body = LeaveListResponse)
    ),
    tag = "Leave"
)]
pub async fn list_leaves(
    svc: web::Data<dyn LeaveService>,
    query: web::Query<LeaveFilter>,
) -> Result<HttpResponse, ServiceError> {
    let pagination = Pagination::new(query.page, query.page_size);
    let page = svc.list_leaves(pagination, query.employee_id).await?;

    Ok(HttpResponse::Ok().json(LeaveListResponse {
        data: page.items,
        page: page.pagination.page(),
        page_size: page.pagination.page_size(),
        total: page.total,
    }))
}

#[utoipa::path(
    get,
    path = "/api/leaves/{id}",
    params(
        ("id" = u64, Path, description = "Leave ID")
    ),
    responses(
        (status = 200, description = "Leave found", body = Leave),
        (status = 404, description = "Leave not found")
    ),
    tag = "Leave"
)]
pub async fn get_leave(
    svc: web::Data<dyn LeaveService>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ServiceError> {
    let leave = svc.get_leave(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(leave))
}

/* =========================
Approve / reject
========================= */
#[utoipa::path(
    put,
    path = "/api/leaves/{id}/status",
    params(
        ("id" = u64, Path, description = "Leave ID")
    ),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Leave status updated", body = Leave),
        (status = 400, description = "Unsupported target status or missing reject reason"),
        (status = 404, description = "Leave not found"),
        (
            status = 409,
            description = "Leave is no longer pending, or approval would exceed the quota"
        )
    ),
    tag = "Leave"
)]
pub async fn update_leave_status(
    svc: web::Data<dyn LeaveService>,
    path: web::Path<u64>,
    payload: web::Json<UpdateStatusRequest>,
) -> Result<HttpResponse, ServiceError> {
    let leave = svc
        .update_leave_status(
            path.into_inner(),
            payload.status,
            payload.approver_id,
            &payload.reject_reason,
        )
        .await?;
    Ok(HttpResponse::Ok().json(leave))
}

/* =========================
Cancel own leave
========================= */
#[utoipa::path(
    put,
    path = "/api/leaves/{id}/cancel",
    params(
        ("id" = u64, Path, description = "Leave ID"),
        ("X-Employee-ID" = u64, Header, description = "Employee cancelling their own leave")
    ),
    responses(
        (status = 200, description = "Leave cancelled", body = Leave),
        (status = 400, description = "Missing or malformed X-Employee-ID"),
        (status = 403, description = "Leave belongs to another employee"),
        (status = 404, description = "Leave not found"),
        (status = 409, description = "Leave is no longer pending")
    ),
    tag = "Leave"
)]
pub async fn cancel_leave(
    req: HttpRequest,
    svc: web::Data<dyn LeaveService>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ServiceError> {
    let employee_id = requesting_employee(&req)?;
    let leave = svc.cancel_leave(path.into_inner(), employee_id).await?;
    Ok(HttpResponse::Ok().json(leave))
}

#[utoipa::path(
    delete,
    path = "/api/leaves/{id}",
    params(
        ("id" = u64, Path, description = "Leave ID")
    ),
    responses(
        (status = 200, description = "Successfully deleted", body = Object, example = json!({
            "message": "Leave deleted successfully"
        })),
        (status = 404, description = "Leave not found")
    ),
    tag = "Leave"
)]
pub async fn delete_leave(
    svc: web::Data<dyn LeaveService>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ServiceError> {
    svc.delete_leave(path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Leave deleted successfully"
    })))
}
