//! MySQL backend.
//!
//! Expected tables:
//!
//! ```sql
//! CREATE TABLE employees (
//!     id                BIGINT UNSIGNED AUTO_INCREMENT PRIMARY KEY,
//!     name              VARCHAR(100) NOT NULL,
//!     email             VARCHAR(100) NOT NULL UNIQUE,
//!     phone             VARCHAR(20)  NOT NULL DEFAULT '',
//!     position          VARCHAR(50)  NOT NULL DEFAULT '',
//!     department        VARCHAR(50)  NOT NULL DEFAULT '',
//!     level             INT          NOT NULL DEFAULT 0,
//!     salary            DOUBLE       NOT NULL DEFAULT 0,
//!     hire_date         DATE         NOT NULL,
//!     address           VARCHAR(200) NOT NULL DEFAULT '',
//!     emergency_contact VARCHAR(100) NOT NULL DEFAULT '',
//!     status            VARCHAR(20)  NOT NULL DEFAULT 'active',
//!     created_at        DATETIME     NOT NULL,
//!     updated_at        DATETIME     NOT NULL
//! );
//!
//! CREATE TABLE leaves (
//!     id            BIGINT UNSIGNED AUTO_INCREMENT PRIMARY KEY,
//!     employee_id   BIGINT UNSIGNED NOT NULL,
//!     leave_type    VARCHAR(20)  NOT NULL,
//!     start_date    DATE         NOT NULL,
//!     end_date      DATE         NOT NULL,
//!     duration      INT          NOT NULL,
//!     reason        VARCHAR(500) NOT NULL DEFAULT '',
//!     status        VARCHAR(20)  NOT NULL DEFAULT 'pending',
//!     approved_by   BIGINT UNSIGNED NULL,
//!     approved_at   DATETIME NULL,
//!     reject_reason VARCHAR(500) NOT NULL DEFAULT '',
//!     employee_snapshot TEXT     NULL,
//!     created_at    DATETIME     NOT NULL,
//!     updated_at    DATETIME     NOT NULL,
//!     INDEX idx_leaves_employee (employee_id),
//!     FOREIGN KEY (employee_id) REFERENCES employees(id) ON DELETE CASCADE
//! );
//! ```
//!
//! `employee_snapshot` holds the JSON of the employee as it was when the
//! leave was requested. Later edits to the employee do not touch it.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, MySqlPool};

use super::{EmployeeStore, LeaveStore, Result, StoreError, now};
use crate::model::{Employee, Leave, LeaveStatus, LeaveType, Pagination};

const EMPLOYEE_COLUMNS: &str = "id, name, email, phone, position, department, level, salary, \
     hire_date, address, emergency_contact, status, created_at, updated_at";

const LEAVE_COLUMNS: &str = "id, employee_id, leave_type, start_date, end_date, duration, reason, \
     status, approved_by, approved_at, reject_reason, employee_snapshot, created_at, updated_at";

#[derive(FromRow)]
struct EmployeeRow {
    id: u64,
    name: String,
    email: String,
    phone: String,
    position: String,
    department: String,
    level: i32,
    salary: f64,
    hire_date: NaiveDate,
    address: String,
    emergency_contact: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<EmployeeRow> for Employee {
    type Error = StoreError;

    fn try_from(row: EmployeeRow) -> Result<Self> {
        let status = row.status.parse().map_err(|_| {
            StoreError::Corrupt(format!("employee {} has status {:?}", row.id, row.status))
        })?;

        Ok(Employee {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            position: row.position,
            department: row.department,
            level: row.level,
            salary: row.salary,
            hire_date: row.hire_date,
            address: row.address,
            emergency_contact: row.emergency_contact,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct LeaveRow {
    id: u64,
    employee_id: u64,
    leave_type: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    duration: i32,
    reason: String,
    status: String,
    approved_by: Option<u64>,
    approved_at: Option<DateTime<Utc>>,
    reject_reason: String,
    employee_snapshot: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<LeaveRow> for Leave {
    type Error = StoreError;

    fn try_from(row: LeaveRow) -> Result<Self> {
        let leave_type: LeaveType = row.leave_type.parse().map_err(|_| {
            StoreError::Corrupt(format!("leave {} has type {:?}", row.id, row.leave_type))
        })?;
        let status: LeaveStatus = row.status.parse().map_err(|_| {
            StoreError::Corrupt(format!("leave {} has status {:?}", row.id, row.status))
        })?;
        let employee = row
            .employee_snapshot
            .as_deref()
            .map(serde_json::from_str::<Employee>)
            .transpose()
            .map_err(|e| {
                StoreError::Corrupt(format!("leave {} has bad employee snapshot: {e}", row.id))
            })?;

        Ok(Leave {
            id: row.id,
            employee_id: row.employee_id,
            employee,
            leave_type,
            start_date: row.start_date,
            end_date: row.end_date,
            duration: i64::from(row.duration),
            reason: row.reason,
            status,
            approved_by: row.approved_by,
            approved_at: row.approved_at,
            reject_reason: row.reject_reason,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn snapshot_column(leave: &Leave) -> Result<Option<String>> {
    leave
        .employee
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(|e| StoreError::Corrupt(format!("employee snapshot not serializable: {e}")))
}

fn decode_leaves(rows: Vec<LeaveRow>) -> Result<Vec<Leave>> {
    rows.into_iter().map(Leave::try_from).collect()
}

fn duration_column(leave: &Leave) -> Result<i32> {
    i32::try_from(leave.duration)
        .map_err(|_| StoreError::Corrupt(format!("leave duration {} out of range", leave.duration)))
}

#[derive(Clone)]
pub struct MySqlEmployeeStore {
    pool: MySqlPool,
}

impl MySqlEmployeeStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn exists(&self, id: u64) -> Result<bool> {
        let found = sqlx::query_scalar::<_, u64>("SELECT id FROM employees WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }
}

#[async_trait]
impl EmployeeStore for MySqlEmployeeStore {
    async fn insert(&self, employee: &Employee) -> Result<Employee> {
        let ts = now();
        let result = sqlx::query(
            r#"
            INSERT INTO employees
                (name, email, phone, position, department, level, salary,
                 hire_date, address, emergency_contact, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&employee.name)
        .bind(&employee.email)
        .bind(&employee.phone)
        .bind(&employee.position)
        .bind(&employee.department)
        .bind(employee.level)
        .bind(employee.salary)
        .bind(employee.hire_date)
        .bind(&employee.address)
        .bind(&employee.emergency_contact)
        .bind(employee.status.as_ref())
        .bind(ts)
        .bind(ts)
        .execute(&self.pool)
        .await?;

        Ok(Employee {
            id: result.last_insert_id(),
            created_at: ts,
            updated_at: ts,
            ..employee.clone()
        })
    }

    async fn find_by_id(&self, id: u64) -> Result<Option<Employee>> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ?");
        sqlx::query_as::<_, EmployeeRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Employee::try_from)
            .transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Employee>> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE email = ? LIMIT 1");
        sqlx::query_as::<_, EmployeeRow>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .map(Employee::try_from)
            .transpose()
    }

    async fn update(&self, employee: &Employee) -> Result<Option<Employee>> {
        let ts = now();
        let result = sqlx::query(
            r#"
            UPDATE employees
            SET name = ?, email = ?, phone = ?, position = ?, department = ?, level = ?,
                salary = ?, hire_date = ?, address = ?, emergency_contact = ?, status = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&employee.name)
        .bind(&employee.email)
        .bind(&employee.phone)
        .bind(&employee.position)
        .bind(&employee.department)
        .bind(employee.level)
        .bind(employee.salary)
        .bind(employee.hire_date)
        .bind(&employee.address)
        .bind(&employee.emergency_contact)
        .bind(employee.status.as_ref())
        .bind(ts)
        .bind(employee.id)
        .execute(&self.pool)
        .await?;

        // MySQL reports changed rows, not matched rows.
        if result.rows_affected() == 0 && !self.exists(employee.id).await? {
            return Ok(None);
        }

        self.find_by_id(employee.id).await
    }

    async fn delete(&self, id: u64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM employees WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, pagination: Pagination) -> Result<(Vec<Employee>, u64)> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM employees")
            .fetch_one(&self.pool)
            .await?;

        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees ORDER BY id LIMIT ? OFFSET ?");
        let employees = sqlx::query_as::<_, EmployeeRow>(&sql)
            .bind(pagination.page_size())
            .bind(pagination.offset())
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Employee::try_from)
            .collect::<Result<Vec<_>>>()?;

        Ok((employees, total.max(0) as u64))
    }

    async fn all(&self) -> Result<Vec<Employee>> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees ORDER BY id");
        sqlx::query_as::<_, EmployeeRow>(&sql)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Employee::try_from)
            .collect()
    }
}

#[derive(Clone)]
pub struct MySqlLeaveStore {
    pool: MySqlPool,
}

impl MySqlLeaveStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn exists(&self, id: u64) -> Result<bool> {
        let found = sqlx::query_scalar::<_, u64>("SELECT id FROM leaves WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }
}

#[async_trait]
impl LeaveStore for MySqlLeaveStore {
    async fn insert(&self, leave: &Leave) -> Result<Leave> {
        let ts = now();
        let result = sqlx::query(
            r#"
            INSERT INTO leaves
                (employee_id, leave_type, start_date, end_date, duration, reason, status,
                 approved_by, approved_at, reject_reason, employee_snapshot, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(leave.employee_id)
        .bind(leave.leave_type.as_ref())
        .bind(leave.start_date)
        .bind(leave.end_date)
        .bind(duration_column(leave)?)
        .bind(&leave.reason)
        .bind(leave.status.as_ref())
        .bind(leave.approved_by)
        .bind(leave.approved_at)
        .bind(&leave.reject_reason)
        .bind(snapshot_column(leave)?)
        .bind(ts)
        .bind(ts)
        .execute(&self.pool)
        .await?;

        Ok(Leave {
            id: result.last_insert_id(),
            created_at: ts,
            updated_at: ts,
            ..leave.clone()
        })
    }

    async fn find_by_id(&self, id: u64) -> Result<Option<Leave>> {
        let sql = format!("SELECT {LEAVE_COLUMNS} FROM leaves WHERE id = ?");
        let row = sqlx::query_as::<_, LeaveRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Leave::try_from).transpose()
    }

    async fn update(&self, leave: &Leave) -> Result<Option<Leave>> {
        let ts = now();
        let result = sqlx::query(
            r#"
            UPDATE leaves
            SET leave_type = ?, start_date = ?, end_date = ?, duration = ?, reason = ?,
                status = ?, approved_by = ?, approved_at = ?, reject_reason = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(leave.leave_type.as_ref())
        .bind(leave.start_date)
        .bind(leave.end_date)
        .bind(duration_column(leave)?)
        .bind(&leave.reason)
        .bind(leave.status.as_ref())
        .bind(leave.approved_by)
        .bind(leave.approved_at)
        .bind(&leave.reject_reason)
        .bind(ts)
        .bind(leave.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 && !self.exists(leave.id).await? {
            return Ok(None);
        }

        Ok(Some(Leave {
            updated_at: ts,
            ..leave.clone()
        }))
    }

    async fn delete(&self, id: u64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM leaves WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list(
        &self,
        pagination: Pagination,
        employee_id: Option<u64>,
    ) -> Result<(Vec<Leave>, u64)> {
        let where_sql = if employee_id.is_some() {
            " WHERE employee_id = ?"
        } else {
            ""
        };

        let count_sql = format!("SELECT COUNT(*) FROM leaves{where_sql}");
        let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
        if let Some(id) = employee_id {
            count_q = count_q.bind(id);
        }
        let total = count_q.fetch_one(&self.pool).await?;

        let data_sql = format!(
            "SELECT {LEAVE_COLUMNS} FROM leaves{where_sql} \
             ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?"
        );
        let mut data_q = sqlx::query_as::<_, LeaveRow>(&data_sql);
        if let Some(id) = employee_id {
            data_q = data_q.bind(id);
        }
        let rows = data_q
            .bind(pagination.page_size())
            .bind(pagination.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok((decode_leaves(rows)?, total.max(0) as u64))
    }

    async fn all(&self) -> Result<Vec<Leave>> {
        let sql = format!("SELECT {LEAVE_COLUMNS} FROM leaves ORDER BY id");
        let rows = sqlx::query_as::<_, LeaveRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        decode_leaves(rows)
    }

    async fn find_in_range(
        &self,
        employee_id: u64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Leave>> {
        let sql = format!(
            "SELECT {LEAVE_COLUMNS} FROM leaves \
             WHERE employee_id = ? AND start_date <= ? AND end_date >= ?"
        );
        let rows = sqlx::query_as::<_, LeaveRow>(&sql)
            .bind(employee_id)
            .bind(to)
            .bind(from)
            .fetch_all(&self.pool)
            .await?;

        decode_leaves(rows)
    }

    async fn sum_approved_duration(
        &self,
        employee_id: u64,
        leave_type: LeaveType,
        year: i32,
    ) -> Result<i64> {
        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT CAST(COALESCE(SUM(duration), 0) AS SIGNED)
            FROM leaves
            WHERE employee_id = ? AND leave_type = ? AND status = ? AND YEAR(start_date) = ?
            "#,
        )
        .bind(employee_id)
        .bind(leave_type.as_ref())
        .bind(LeaveStatus::Approved.as_ref())
        .bind(year)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EmployeeStatus;

    fn row(snapshot: Option<String>) -> LeaveRow {
        let ts = now();
        LeaveRow {
            id: 7,
            employee_id: 1,
            leave_type: "sick".to_string(),
            start_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 6, 2).unwrap(),
            duration: 2,
            reason: String::new(),
            status: "pending".to_string(),
            approved_by: None,
            approved_at: None,
            reject_reason: String::new(),
            employee_snapshot: snapshot,
            created_at: ts,
            updated_at: ts,
        }
    }

    fn employee() -> Employee {
        let ts = now();
        Employee {
            id: 1,
            name: "Alice".to_string(),
            email: "alice@x.com".to_string(),
            phone: String::new(),
            position: String::new(),
            department: String::new(),
            level: 1,
            salary: 1000.0,
            hire_date: NaiveDate::from_ymd_opt(2022, 1, 10).unwrap(),
            address: String::new(),
            emergency_contact: String::new(),
            status: EmployeeStatus::Active,
            created_at: ts,
            updated_at: ts,
        }
    }

    #[test]
    fn test_leave_row_keeps_the_stored_employee_snapshot() {
        let snapshot = employee();
        let json = serde_json::to_string(&snapshot).unwrap();

        let leave = Leave::try_from(row(Some(json))).unwrap();
        assert_eq!(leave.employee, Some(snapshot));
        assert_eq!(leave.leave_type, LeaveType::Sick);
        assert_eq!(leave.duration, 2);

        assert_eq!(Leave::try_from(row(None)).unwrap().employee, None);
    }

    #[test]
    fn test_snapshot_column_round_trips() {
        let mut leave = Leave::try_from(row(None)).unwrap();
        assert_eq!(snapshot_column(&leave).unwrap(), None);

        leave.employee = Some(employee());
        let stored = snapshot_column(&leave).unwrap();
        let back = Leave::try_from(row(stored)).unwrap();
        assert_eq!(back.employee, leave.employee);
    }

    #[test]
    fn test_undecodable_rows_are_corrupt() {
        assert!(matches!(
            Leave::try_from(row(Some("{not json".to_string()))),
            Err(StoreError::Corrupt(_))
        ));

        let mut bad_status = row(None);
        bad_status.status = "archived".to_string();
        assert!(matches!(Leave::try_from(bad_status), Err(StoreError::Corrupt(_))));
    }
}
