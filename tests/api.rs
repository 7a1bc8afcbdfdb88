use std::sync::Arc;

use actix_web::dev::ServiceResponse;
use actix_web::http::StatusCode;
use actix_web::web::Data;
use actix_web::{App, test};
use serde_json::{Value, json};

use hrm_leave::cache::MokaCacheStore;
use hrm_leave::config::Config;
use hrm_leave::routes;
use hrm_leave::service::{
    CacheService, EmployeeManager, EmployeeService, LeaveManager, LeaveService,
};
use hrm_leave::store::{InMemoryEmployeeStore, InMemoryLeaveStore};

fn test_config() -> Config {
    Config::from_lookup(|key| match key {
        "STORE_BACKEND" => Some("memory".to_string()),
        "RATE_PROTECTED_PER_MIN" => Some("0".to_string()),
        _ => None,
    })
    .unwrap()
}

macro_rules! app {
    () => {{
        let leave_store = InMemoryLeaveStore::new();
        let employees = Arc::new(InMemoryEmployeeStore::cascading_to(&leave_store));
        let leaves = Arc::new(leave_store);
        let cache = Arc::new(CacheService::new(Arc::new(MokaCacheStore::new(1_000))));
        let employee_service: Arc<dyn EmployeeService> =
            Arc::new(EmployeeManager::new(employees.clone(), cache.clone()));
        let leave_service: Arc<dyn LeaveService> =
            Arc::new(LeaveManager::new(leaves, employees, cache));
        let config = test_config();

        test::init_service(
            App::new()
                .app_data(Data::from(employee_service))
                .app_data(Data::from(leave_service))
                .configure(|cfg| routes::configure(cfg, &config)),
        )
        .await
    }};
}

async fn body(resp: ServiceResponse) -> (StatusCode, Value) {
    let status = resp.status();
    let value: Value = test::read_body_json(resp).await;
    (status, value)
}

fn employee_body(name: &str, email: &str) -> Value {
    json!({
        "name": name,
        "email": email,
        "phone": "0912345678",
        "position": "Engineer",
        "department": "R&D",
        "level": 2,
        "salary": 55000.0,
        "hire_date": "2023-02-01"
    })
}

fn leave_body(employee_id: u64, leave_type: &str, start: &str, end: &str) -> Value {
    json!({
        "employee_id": employee_id,
        "leave_type": leave_type,
        "start_date": start,
        "end_date": end,
        "reason": "personal matters"
    })
}

#[actix_web::test]
async fn ping_answers_pong() {
    let app = app!();
    let resp = test::call_service(&app, test::TestRequest::get().uri("/ping").to_request()).await;

    let (status, value) = body(resp).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value, json!({ "message": "pong" }));
}

#[actix_web::test]
async fn employee_crud_round_trip() {
    let app = app!();

    let req = test::TestRequest::post()
        .uri("/api/employees")
        .set_json(employee_body("Alice", "alice@x.com"))
        .to_request();
    let (status, created) = body(test::call_service(&app, req).await).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["id"], 1);
    assert_eq!(created["status"], "active");

    let req = test::TestRequest::get().uri("/api/employees/1").to_request();
    let (status, fetched) = body(test::call_service(&app, req).await).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);

    let mut changed = employee_body("Alice", "alice@x.com");
    changed["level"] = json!(3);
    let req = test::TestRequest::put()
        .uri("/api/employees/1")
        .set_json(changed)
        .to_request();
    let (status, updated) = body(test::call_service(&app, req).await).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["level"], 3);

    let req = test::TestRequest::get()
        .uri("/api/employees?page=1&page_size=5")
        .to_request();
    let (status, list) = body(test::call_service(&app, req).await).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["total"], 1);
    assert_eq!(list["page_size"], 5);
    assert_eq!(list["data"][0]["level"], 3);

    let req = test::TestRequest::delete().uri("/api/employees/1").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::get().uri("/api/employees/1").to_request();
    let (status, err) = body(test::call_service(&app, req).await).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(err["message"].as_str().unwrap().contains("not found"));
}

#[actix_web::test]
async fn employee_input_errors_are_400_or_409() {
    let app = app!();

    let req = test::TestRequest::post()
        .uri("/api/employees")
        .set_json(employee_body("Alice", "alice@x.com"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    let req = test::TestRequest::post()
        .uri("/api/employees")
        .set_json(employee_body("Alice Again", "alice@x.com"))
        .to_request();
    let (status, err) = body(test::call_service(&app, req).await).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(err["message"].as_str().unwrap().contains("already exists"));

    let req = test::TestRequest::post()
        .uri("/api/employees")
        .set_json(employee_body("", "blank@x.com"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/api/employees")
        .insert_header(("content-type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let (status, err) = body(test::call_service(&app, req).await).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(err["message"].is_string());

    let req = test::TestRequest::get().uri("/api/employees/abc").to_request();
    let (status, err) = body(test::call_service(&app, req).await).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(err["message"].is_string());
}

#[actix_web::test]
async fn leave_request_and_approval_workflow() {
    let app = app!();
    for (name, email) in [("Alice", "alice@x.com"), ("Bob", "bob@x.com")] {
        let req = test::TestRequest::post()
            .uri("/api/employees")
            .set_json(employee_body(name, email))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);
    }

    let req = test::TestRequest::post()
        .uri("/api/leaves")
        .set_json(leave_body(1, "annual", "2024-06-01", "2024-06-03"))
        .to_request();
    let (status, leave) = body(test::call_service(&app, req).await).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(leave["duration"], 3);
    assert_eq!(leave["status"], "pending");
    assert_eq!(leave["employee"]["email"], "alice@x.com");

    // Overlaps on 2024-06-03.
    let req = test::TestRequest::post()
        .uri("/api/leaves")
        .set_json(leave_body(1, "sick", "2024-06-03", "2024-06-04"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);

    let req = test::TestRequest::post()
        .uri("/api/leaves")
        .set_json(leave_body(1, "annual", "2024-06-09", "2024-06-08"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/api/leaves")
        .set_json(leave_body(99, "annual", "2024-06-09", "2024-06-10"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

    // Only approve/reject are valid targets.
    let req = test::TestRequest::put()
        .uri("/api/leaves/1/status")
        .set_json(json!({ "status": "cancelled", "approver_id": 2 }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::put()
        .uri("/api/leaves/1/status")
        .set_json(json!({ "status": "approved", "approver_id": 2 }))
        .to_request();
    let (status, approved) = body(test::call_service(&app, req).await).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(approved["status"], "approved");
    assert_eq!(approved["approved_by"], 2);
    assert!(approved["approved_at"].is_string());

    let req = test::TestRequest::put()
        .uri("/api/leaves/1/status")
        .set_json(json!({ "status": "rejected", "approver_id": 2, "reject_reason": "late" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);

    let req = test::TestRequest::get().uri("/api/leaves/1").to_request();
    let (status, fetched) = body(test::call_service(&app, req).await).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["status"], "approved");
}

#[actix_web::test]
async fn annual_quota_is_enforced_over_http() {
    let app = app!();
    let req = test::TestRequest::post()
        .uri("/api/employees")
        .set_json(employee_body("Alice", "alice@x.com"))
        .to_request();
    test::call_service(&app, req).await;

    // 12 approved days in March.
    let req = test::TestRequest::post()
        .uri("/api/leaves")
        .set_json(leave_body(1, "annual", "2024-03-01", "2024-03-12"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);
    let req = test::TestRequest::put()
        .uri("/api/leaves/1/status")
        .set_json(json!({ "status": "approved", "approver_id": 9 }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::post()
        .uri("/api/leaves")
        .set_json(leave_body(1, "annual", "2024-06-01", "2024-06-04"))
        .to_request();
    let (status, err) = body(test::call_service(&app, req).await).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(err["message"].as_str().unwrap().contains("quota"));

    let req = test::TestRequest::post()
        .uri("/api/leaves")
        .set_json(leave_body(1, "annual", "2024-06-01", "2024-06-03"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);
}

#[actix_web::test]
async fn cancel_requires_the_owner_header() {
    let app = app!();
    for email in ["alice@x.com", "bob@x.com"] {
        let req = test::TestRequest::post()
            .uri("/api/employees")
            .set_json(employee_body("Someone", email))
            .to_request();
        test::call_service(&app, req).await;
    }
    let req = test::TestRequest::post()
        .uri("/api/leaves")
        .set_json(leave_body(1, "personal", "2024-06-01", "2024-06-01"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    let req = test::TestRequest::put().uri("/api/leaves/1/cancel").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::put()
        .uri("/api/leaves/1/cancel")
        .insert_header(("X-Employee-ID", "2"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::put()
        .uri("/api/leaves/1/cancel")
        .insert_header(("X-Employee-ID", "1"))
        .to_request();
    let (status, cancelled) = body(test::call_service(&app, req).await).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["status"], "cancelled");

    let req = test::TestRequest::put()
        .uri("/api/leaves/1/cancel")
        .insert_header(("X-Employee-ID", "1"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn leave_list_filter_and_delete() {
    let app = app!();
    for email in ["alice@x.com", "bob@x.com"] {
        let req = test::TestRequest::post()
            .uri("/api/employees")
            .set_json(employee_body("Someone", email))
            .to_request();
        test::call_service(&app, req).await;
    }
    for (employee_id, day) in [(1, "2024-06-01"), (2, "2024-06-01"), (1, "2024-07-01")] {
        let req = test::TestRequest::post()
            .uri("/api/leaves")
            .set_json(leave_body(employee_id, "sick", day, day))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);
    }

    let req = test::TestRequest::get()
        .uri("/api/leaves?employee_id=1")
        .to_request();
    let (status, list) = body(test::call_service(&app, req).await).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["total"], 2);
    assert_eq!(list["data"][0]["id"], 3);
    assert_eq!(list["data"][1]["id"], 1);

    let req = test::TestRequest::delete().uri("/api/leaves/3").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::get().uri("/api/leaves/3").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::delete().uri("/api/leaves/3").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn deleting_an_employee_removes_their_leaves() {
    let app = app!();
    for (name, email) in [("Alice", "alice@x.com"), ("Bob", "bob@x.com")] {
        let req = test::TestRequest::post()
            .uri("/api/employees")
            .set_json(employee_body(name, email))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);
    }
    for employee_id in [1, 2] {
        let req = test::TestRequest::post()
            .uri("/api/leaves")
            .set_json(leave_body(employee_id, "sick", "2024-06-01", "2024-06-02"))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);
    }

    let req = test::TestRequest::delete().uri("/api/employees/1").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri("/api/leaves?employee_id=1")
        .to_request();
    let (status, list) = body(test::call_service(&app, req).await).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["total"], 0);

    let req = test::TestRequest::get().uri("/api/leaves").to_request();
    let (_, list) = body(test::call_service(&app, req).await).await;
    assert_eq!(list["total"], 1);
    assert_eq!(list["data"][0]["employee_id"], 2);
}
