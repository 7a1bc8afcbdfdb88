use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

/// Employment status. Stored as lowercase text.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    ToSchema,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EmployeeStatus {
    #[default]
    Active,
    Inactive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "name": "Jane Doe",
        "email": "jane.doe@company.com",
        "phone": "+8801712345678",
        "position": "Engineer",
        "department": "R&D",
        "level": 2,
        "salary": 60000.0,
        "hire_date": "2024-01-01",
        "address": "12 Main Street",
        "emergency_contact": "John Doe +8801700000000",
        "status": "active",
        "created_at": "2024-01-01T00:00:00Z",
        "updated_at": "2024-01-01T00:00:00Z"
    })
)]
pub struct Employee {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "Jane Doe")]
    pub name: String,

    /// Unique across all employees.
    #[schema(example = "jane.doe@company.com")]
    pub email: String,

    #[serde(default)]
    pub phone: String,

    #[serde(default)]
    pub position: String,

    #[serde(default)]
    pub department: String,

    #[schema(example = 2)]
    pub level: i32,

    #[schema(example = 60000.0)]
    pub salary: f64,

    #[schema(example = "2024-01-01", value_type = String, format = "date")]
    pub hire_date: NaiveDate,

    #[serde(default)]
    pub address: String,

    #[serde(default)]
    pub emergency_contact: String,

    #[serde(default)]
    pub status: EmployeeStatus,

    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,

    #[schema(value_type = String, format = "date-time")]
    pub updated_at: DateTime<Utc>,
}
