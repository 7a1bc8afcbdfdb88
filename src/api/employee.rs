use actix_web::{HttpResponse, web};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::error::ServiceError;
use crate::model::{Employee, EmployeeStatus, PageQuery};
use crate::service::EmployeeService;

/// Body of create and update. Update replaces the whole record.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct EmployeeInput {
    #[schema(example = "John Doe")]
    pub name: String,
    #[schema(example = "john@email.com", format = "email")]
    pub email: String,
    #[serde(default)]
    #[schema(example = "+886912345678")]
    pub phone: String,
    #[serde(default)]
    #[schema(example = "Backend Engineer")]
    pub position: String,
    #[serde(default)]
    #[schema(example = "R&D")]
    pub department: String,
    #[serde(default)]
    #[schema(example = 2)]
    pub level: i32,
    #[serde(default)]
    #[schema(example = 65000.0)]
    pub salary: f64,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub hire_date: NaiveDate,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub emergency_contact: String,
    #[serde(default)]
    #[schema(example = "active")]
    pub status: Option<EmployeeStatus>,
}

impl EmployeeInput {
    fn validate(&self) -> Result<(), ServiceError> {
        if self.name.trim().is_empty() {
            return Err(ServiceError::Validation("name is required".to_string()));
        }
        if !self.email.contains('@') {
            return Err(ServiceError::Validation(
                "email must be a valid address".to_string(),
            ));
        }
        if !self.salary.is_finite() || self.salary < 0.0 {
            return Err(ServiceError::Validation(
                "salary must not be negative".to_string(),
            ));
        }
        Ok(())
    }

    fn into_employee(self, id: u64) -> Employee {
        let now = Utc::now();
        Employee {
            id,
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone,
            position: self.position,
            department: self.department,
            level: self.level,
            salary: self.salary,
            hire_date: self.hire_date,
            address: self.address,
            emergency_contact: self.emergency_contact,
            status: self.status.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeListResponse {
    pub data: Vec<Employee>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub page_size: u32,
    #[schema(example = 42)]
    pub total: u64,
}

/// Create Employee
#[utoipa::path(
    post,
    path = "/api/employees",
    request_body = EmployeeInput,
    responses(
        (status = 201, description = "Employee created", body = Employee),
        (status = 400, description = "Invalid payload", body = Object, example = json!({
            "message": "name is required"
        })),
        (status = 409, description = "Email already exists", body = Object, example = json!({
            "message": "email john@email.com already exists"
        }))
    ),
    tag = "Employee"
)]
pub async fn create_employee(
    svc: web::Data<dyn EmployeeService>,
    payload: web::Json<EmployeeInput>,
) -> Result<HttpResponse, ServiceError> {
    let payload = payload.into_inner();
    payload.validate()?;

    let created = svc.create_employee(payload.into_employee(0)).await?;
    Ok(HttpResponse::Created().json(created))
}

#[utoipa::path(
    get,
    path = "/api/employees",
    params(PageQuery),
    responses(
        (status = 200, description = "Paginated employee list", body = EmployeeListResponse)
    ),
    tag = "Employee"
)]
pub async fn list_employees(
    svc: web::Data<dyn EmployeeService>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, ServiceError> {
    let page = svc.list_employees(query.pagination()).await?;

    Ok(HttpResponse::Ok().json(EmployeeListResponse {
        data: page.items,
        page: page.pagination.page(),
        page_size: page.pagination.page_size(),
        total: page.total,
    }))
}

/// Get Employee by ID
#[utoipa::path(
    get,
    path = "/api/employees/{id}",
    params(
        ("id" = u64, Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Employee found", body = Employee),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "message": "employee 7 not found"
        }))
    ),
    tag = "Employee"
)]
pub async fn get_employee(
    svc: web::Data<dyn EmployeeService>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ServiceError> {
    let employee = svc.get_employee(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(employee))
}

/// Update Employee
#[utoipa::path(
    put,
    path = "/api/employees/{id}",
    params(
        ("id" = u64, Path, description = "Employee ID")
    ),
    request_body = EmployeeInput,
    responses(
        (status = 200, description = "Employee updated", body = Employee),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Employee not found"),
        (status = 409, description = "Email already exists")
    ),
    tag = "Employee"
)]
pub async fn update_employee(
    svc: web::Data<dyn EmployeeService>,
    path: web::Path<u64>,
    payload: web::Json<EmployeeInput>,
) -> Result<HttpResponse, ServiceError> {
    let payload = payload.into_inner();
    payload.validate()?;

    let updated = svc
        .update_employee(payload.into_employee(path.into_inner()))
        .await?;
    Ok(HttpResponse::Ok().json(updated))
}

/// Delete Employee
#[utoipa::path(
    delete,
    path = "/api/employees/{id}",
    params(
        ("id" = u64, Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Successfully deleted", body = Object, example = json!({
            "message": "Employee deleted successfully"
        })),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee"
)]
pub async fn delete_employee(
    svc: web::Data<dyn EmployeeService>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ServiceError> {
    svc.delete_employee(path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Employee deleted successfully"
    })))
}
