use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

use crate::model::LeaveStatus;
use crate::store::StoreError;

/// Failures a caller of the employee and leave services can observe.
///
/// Cache failures never appear here; they are logged where they happen.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: u64 },

    #[error("{0}")]
    Conflict(String),

    #[error("annual leave quota exceeded: {used} days used, {requested} requested, quota is {quota}")]
    QuotaExceeded { used: i64, requested: i64, quota: i64 },

    #[error("leave {id} is {status}, only pending leave can change status")]
    InvalidState { id: u64, status: LeaveStatus },

    #[error("{0}")]
    Authorization(String),

    #[error(transparent)]
    Store(StoreError),
}

impl ServiceError {
    pub fn employee_not_found(id: u64) -> Self {
        ServiceError::NotFound {
            entity: "employee",
            id,
        }
    }

    pub fn leave_not_found(id: u64) -> Self {
        ServiceError::NotFound { entity: "leave", id }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            // Schema constraints catch what the service pre-checks can race past.
            StoreError::UniqueViolation(msg) => ServiceError::Conflict(msg),
            StoreError::ForeignKeyViolation(msg) => ServiceError::Validation(msg),
            other => ServiceError::Store(other),
        }
    }
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound { .. } => StatusCode::NOT_FOUND,
            ServiceError::Conflict(_)
            | ServiceError::QuotaExceeded { .. }
            | ServiceError::InvalidState { .. } => StatusCode::CONFLICT,
            ServiceError::Authorization(_) => StatusCode::FORBIDDEN,
            ServiceError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            ServiceError::Store(e) => {
                tracing::error!(error = %e, "Store operation failed");
                "Internal Server Error".to_string()
            }
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code()).json(json!({ "message": message }))
    }
}
