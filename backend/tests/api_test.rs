use axum::body::Body;
use axum::Router;
use http::{header, Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use ems_backend::app;
use ems_backend::test_util::create_test_state;

fn test_app() -> Router {
    app(create_test_state())
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, body)
}

fn register_body(username: &str, role: &str, hourly_rate: f64) -> Value {
    json!({
        "username": username,
        "email": format!("{}@ems.com", username),
        "password": "password123",
        "firstName": "Test",
        "lastName": "User",
        "role": role,
        "department": "Engineering",
        "position": "Engineer",
        "hourlyRate": hourly_rate,
    })
}

/// Registers a user and returns their bearer token.
async fn register(app: &Router, username: &str, role: &str, hourly_rate: f64) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/auth/register",
        None,
        Some(register_body(username, role, hourly_rate)),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "registration failed: {}", body);
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_endpoint_is_public() {
    let app = test_app();
    let (status, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn register_login_and_validate() {
    let app = test_app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(register_body("jdoe", "EMPLOYEE", 25.0)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "jdoe");
    assert_eq!(body["role"], "EMPLOYEE");
    assert_eq!(body["message"], "User registered successfully");

    let (status, body) = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "username": "jdoe", "password": "password123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap().to_string();

    let (status, body) = send(&app, Method::GET, "/auth/validate", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("Token is valid".to_string()));
}

#[tokio::test]
async fn login_rejects_bad_credentials() {
    let app = test_app();
    register(&app, "jdoe", "EMPLOYEE", 25.0).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "username": "jdoe", "password": "wrong-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Authentication Failed");
    assert_eq!(body["message"], "Invalid username or password");

    let (status, _) = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "username": "nobody", "password": "password123" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let app = test_app();
    register(&app, "jdoe", "EMPLOYEE", 25.0).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(register_body("jdoe", "EMPLOYEE", 25.0)),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Username is already taken");

    // Same email under a different username.
    let mut body_json = register_body("other", "EMPLOYEE", 25.0);
    body_json["email"] = json!("jdoe@ems.com");
    let (status, body) = send(&app, Method::POST, "/auth/register", None, Some(body_json)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Email is already registered");
}

#[tokio::test]
async fn registration_validates_input() {
    let app = test_app();

    let mut short_password = register_body("jdoe", "EMPLOYEE", 25.0);
    short_password["password"] = json!("short");
    let (status, body) = send(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(short_password),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Validation Failed");

    let (status, _) = send(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(register_body("ab", "EMPLOYEE", 25.0)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(register_body("negative", "EMPLOYEE", -5.0)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    let app = test_app();

    let (status, body) = send(&app, Method::GET, "/work-logs", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Authentication Failed");

    let (status, _) = send(
        &app,
        Method::GET,
        "/work-logs",
        Some("not-a-real-token"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn work_log_lifecycle() {
    let app = test_app();
    let employee = register(&app, "jdoe", "EMPLOYEE", 25.0).await;
    let admin = register(&app, "admin", "ADMIN", 50.0).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/work-logs",
        Some(&employee),
        Some(json!({ "date": "2024-03-01", "hoursWorked": 10.0, "remarks": "release day" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "PENDING");
    assert_eq!(body["userName"], "Test User");
    // 8h x $25 + 2h x $37.50 overtime.
    assert_eq!(body["calculatedPay"], 275.0);
    let id = body["id"].as_i64().unwrap();

    // One entry per date.
    let (status, _) = send(
        &app,
        Method::POST,
        "/work-logs",
        Some(&employee),
        Some(json!({ "date": "2024-03-01", "hoursWorked": 4.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Owner edits while pending.
    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/work-logs/{}", id),
        Some(&employee),
        Some(json!({ "date": "2024-03-01", "hoursWorked": 8.0, "remarks": "corrected" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["hoursWorked"], 8.0);

    // Employees cannot approve.
    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/work-logs/{}/status?status=APPROVED", id),
        Some(&employee),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Access Denied");

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/work-logs/{}/status?status=APPROVED", id),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "APPROVED");

    // Approved entries are frozen.
    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/work-logs/{}", id),
        Some(&employee),
        Some(json!({ "date": "2024-03-01", "hoursWorked": 6.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Terminal states never flip.
    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/work-logs/{}/status?status=REJECTED", id),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/work-logs/{}/status?status=PENDING", id),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, Method::GET, "/work-logs", Some(&employee), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn work_log_date_range_and_monthly_summary() {
    let app = test_app();
    let employee = register(&app, "jdoe", "EMPLOYEE", 25.0).await;

    for (date, hours) in [("2024-03-01", 8.0), ("2024-03-02", 10.0), ("2024-04-01", 4.0)] {
        let (status, _) = send(
            &app,
            Method::POST,
            "/work-logs",
            Some(&employee),
            Some(json!({ "date": date, "hoursWorked": hours })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = send(
        &app,
        Method::GET,
        "/work-logs/date-range?startDate=2024-03-01&endDate=2024-03-31",
        Some(&employee),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (status, body) = send(
        &app,
        Method::GET,
        "/work-logs/monthly-summary?startDate=2024-03-01&endDate=2024-04-30",
        Some(&employee),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let summaries = body.as_array().unwrap();
    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0]["yearMonth"], "2024-03");
    assert_eq!(summaries[0]["totalHoursWorked"], 18.0);
    assert_eq!(summaries[0]["overtimeHours"], 2.0);
    assert_eq!(summaries[1]["yearMonth"], "2024-04");
}

#[tokio::test]
async fn payroll_endpoints() {
    let app = test_app();
    let employee = register(&app, "jdoe", "EMPLOYEE", 20.0).await;
    let admin = register(&app, "admin", "ADMIN", 50.0).await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/work-logs",
        Some(&employee),
        Some(json!({ "date": "2024-03-01", "hoursWorked": 10.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // 8h x $20 + 2h x $30 = $220 gross, 30% deducted.
    let (status, body) = send(
        &app,
        Method::GET,
        "/payroll/my-payroll?yearMonth=2024-03",
        Some(&employee),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["earnings"]["grossPay"], 220.0);
    assert_eq!(body["netPay"], 154.0);

    // Admin can read any payroll, another employee cannot.
    let employee_id = {
        let (_, profile) = send(&app, Method::GET, "/users/profile", Some(&employee), None).await;
        profile["id"].as_i64().unwrap()
    };
    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/payroll/calculate/{}?yearMonth=2024-03", employee_id),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        Method::GET,
        "/payroll/report?yearMonth=2024-03",
        Some(&employee),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Access Denied");

    let (status, body) = send(
        &app,
        Method::GET,
        "/payroll/report?yearMonth=2024-03",
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (status, body) = send(
        &app,
        Method::GET,
        "/payroll/summary?startMonth=2024-03&endMonth=2024-03",
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalEmployees"], 2);
    assert_eq!(body["departmentTotals"]["Engineering"], 220.0);

    // Inverted range.
    let (status, _) = send(
        &app,
        Method::GET,
        "/payroll/summary?startMonth=2024-04&endMonth=2024-03",
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Malformed period.
    let (status, _) = send(
        &app,
        Method::GET,
        "/payroll/my-payroll?yearMonth=march",
        Some(&employee),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn user_management() {
    let app = test_app();
    let employee = register(&app, "jdoe", "EMPLOYEE", 25.0).await;
    let admin = register(&app, "admin", "ADMIN", 50.0).await;

    let (status, body) = send(&app, Method::GET, "/users", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (status, _) = send(&app, Method::GET, "/users", Some(&employee), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, Method::GET, "/users/profile", Some(&employee), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "jdoe");
    assert!(body.get("passwordHash").is_none());
    let employee_id = body["id"].as_i64().unwrap();
    let admin_id = {
        let (_, profile) = send(&app, Method::GET, "/users/profile", Some(&admin), None).await;
        profile["id"].as_i64().unwrap()
    };

    // Employees cannot read other users.
    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/users/{}", admin_id),
        Some(&employee),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Owner updates their own record, keeping the rate.
    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/users/{}", employee_id),
        Some(&employee),
        Some(json!({
            "firstName": "Jane",
            "lastName": "Doe",
            "department": "Platform",
            "position": "Senior Engineer",
            "hourlyRate": 25.0,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["firstName"], "Jane");
    assert_eq!(body["department"], "Platform");

    // Owners cannot change their own rate; admins can.
    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/users/{}", employee_id),
        Some(&employee),
        Some(json!({
            "firstName": "Jane",
            "lastName": "Doe",
            "department": "Platform",
            "position": "Senior Engineer",
            "hourlyRate": 30.0,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Only administrators can change the hourly rate");

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/users/{}", employee_id),
        Some(&admin),
        Some(json!({
            "firstName": "Jane",
            "lastName": "Doe",
            "department": "Platform",
            "position": "Senior Engineer",
            "hourlyRate": 30.0,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["hourlyRate"], 30.0);

    let (status, body) = send(
        &app,
        Method::GET,
        "/users/check-username?username=jdoe",
        Some(&employee),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["exists"], true);

    let (status, body) = send(
        &app,
        Method::GET,
        "/users/check-email?email=unknown@ems.com",
        Some(&employee),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["exists"], false);

    // Unknown user is a plain 404.
    let (status, body) = send(&app, Method::GET, "/users/999", Some(&admin), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not Found");
}

#[tokio::test]
async fn last_admin_cannot_be_removed() {
    let app = test_app();
    let admin = register(&app, "admin", "ADMIN", 50.0).await;
    register(&app, "jdoe", "EMPLOYEE", 25.0).await;

    let admin_id = {
        let (_, profile) = send(&app, Method::GET, "/users/profile", Some(&admin), None).await;
        profile["id"].as_i64().unwrap()
    };

    let (status, body) = send(
        &app,
        Method::DELETE,
        &format!("/users/{}", admin_id),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Access Denied");

    let (status, _) = send(
        &app,
        Method::PATCH,
        &format!("/users/{}/status", admin_id),
        Some(&admin),
        Some(json!({ "enabled": false })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // With a second admin in place the first one can go.
    register(&app, "admin2", "ADMIN", 50.0).await;
    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/users/{}", admin_id),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // The deleted admin's token no longer authenticates.
    let (status, _) = send(&app, Method::GET, "/users", Some(&admin), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn disabled_accounts_lose_access() {
    let app = test_app();
    let admin = register(&app, "admin", "ADMIN", 50.0).await;
    let employee = register(&app, "jdoe", "EMPLOYEE", 25.0).await;

    let employee_id = {
        let (_, profile) = send(&app, Method::GET, "/users/profile", Some(&employee), None).await;
        profile["id"].as_i64().unwrap()
    };

    let (status, body) = send(
        &app,
        Method::PATCH,
        &format!("/users/{}/status", employee_id),
        Some(&admin),
        Some(json!({ "enabled": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["enabled"], false);

    // Existing token stops working and login is refused.
    let (status, _) = send(&app, Method::GET, "/work-logs", Some(&employee), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "username": "jdoe", "password": "password123" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Account is disabled");

    // Re-enabling restores login.
    let (status, _) = send(
        &app,
        Method::PATCH,
        &format!("/users/{}/status", employee_id),
        Some(&admin),
        Some(json!({ "enabled": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "username": "jdoe", "password": "password123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}
