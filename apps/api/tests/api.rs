//! End-to-end tests of the HTTP surface against an in-memory database.

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use registrar_api::{router, ApiConfig, AppState};
use registrar_db::{Database, DbConfig};

async fn app() -> Router {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    router(AppState::new(db, ApiConfig::default()))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header("content-type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create_student(app: &Router, student_id: &str, email: &str) -> i64 {
    let (status, body) = send(
        app,
        Method::POST,
        "/students",
        Some(json!({ "student_id": student_id, "name": "Test Student", "email": email })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_i64().unwrap()
}

async fn create_course(app: &Router, code: &str, max_students: i64) -> i64 {
    let (status, body) = send(
        app,
        Method::POST,
        "/courses",
        Some(json!({
            "course_code": code,
            "name": format!("Course {code}"),
            "credits": 3,
            "max_students": max_students,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_i64().unwrap()
}

async fn enroll(app: &Router, student_id: i64, course_id: i64) -> (StatusCode, Value) {
    send(
        app,
        Method::POST,
        "/enrollments",
        Some(json!({ "student_id": student_id, "course_id": course_id })),
    )
    .await
}

// =============================================================================
// System
// =============================================================================

#[tokio::test]
async fn health_reports_service_name() {
    let app = app().await;
    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "status": "healthy", "service": "student-enrollment-api" })
    );
}

#[tokio::test]
async fn stats_count_active_enrollments() {
    let app = app().await;
    let a = create_student(&app, "STU001", "a@university.edu").await;
    let b = create_student(&app, "STU002", "b@university.edu").await;
    let course = create_course(&app, "CS101", 30).await;

    enroll(&app, a, course).await;
    let (_, dropped) = enroll(&app, b, course).await;
    let id = dropped["id"].as_i64().unwrap();
    send(
        &app,
        Method::PUT,
        &format!("/enrollments/{id}"),
        Some(json!({ "status": "dropped" })),
    )
    .await;

    let (status, body) = send(&app, Method::GET, "/stats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "total_students": 2,
            "total_courses": 1,
            "total_enrollments": 1,
            "active_enrollments": 1,
        })
    );
}

// =============================================================================
// Students
// =============================================================================

#[tokio::test]
async fn duplicate_student_id_and_email_rejected() {
    let app = app().await;
    create_student(&app, "STU001", "alice@university.edu").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/students",
        Some(json!({ "student_id": "STU001", "name": "Other", "email": "other@university.edu" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Student ID already exists");

    let (status, body) = send(
        &app,
        Method::POST,
        "/students",
        Some(json!({ "student_id": "STU002", "name": "Other", "email": "alice@university.edu" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Email already exists");
}

#[tokio::test]
async fn invalid_email_rejected() {
    let app = app().await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/students",
        Some(json!({ "student_id": "STU001", "name": "A", "email": "not-an-email" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("email"));
}

#[tokio::test]
async fn malformed_body_gets_detail() {
    let app = app().await;
    let (status, body) = send(&app, Method::POST, "/students", Some(json!({ "name": "A" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn student_list_pagination_and_search() {
    let app = app().await;
    for n in 1..=5 {
        create_student(&app, &format!("STU00{n}"), &format!("s{n}@university.edu")).await;
    }

    let (status, body) = send(&app, Method::GET, "/students?skip=2&limit=2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 5);
    assert_eq!(body["page"], 2);
    assert_eq!(body["per_page"], 2);
    assert_eq!(body["items"].as_array().unwrap().len(), 2);
    assert_eq!(body["items"][0]["student_id"], "STU003");

    let (_, body) = send(&app, Method::GET, "/students?search=stu004", None).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["student_id"], "STU004");

    let (status, _) = send(&app, Method::GET, "/students?limit=0", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn student_detail_update_delete() {
    let app = app().await;
    let id = create_student(&app, "STU001", "alice@university.edu").await;
    let course = create_course(&app, "CS101", 30).await;
    enroll(&app, id, course).await;

    let (status, body) = send(&app, Method::GET, &format!("/students/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["enrollments"].as_array().unwrap().len(), 1);
    assert_eq!(body["enrollments"][0]["course"]["course_code"], "CS101");

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/students/{id}"),
        Some(json!({ "name": "Alice Cooper" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Alice Cooper");
    assert_eq!(body["email"], "alice@university.edu");

    let (status, body) = send(&app, Method::DELETE, &format!("/students/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, body) = send(&app, Method::GET, &format!("/students/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Student not found");

    // Enrollments went with the student
    let (_, body) = send(&app, Method::GET, "/enrollments", None).await;
    assert_eq!(body["total"], 0);
}

#[tokio::test]
async fn non_numeric_id_rejected() {
    let app = app().await;
    let (status, body) = send(&app, Method::GET, "/students/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string());
}

// =============================================================================
// Courses
// =============================================================================

#[tokio::test]
async fn course_seat_counts_and_available_filter() {
    let app = app().await;
    let student = create_student(&app, "STU001", "a@university.edu").await;
    let small = create_course(&app, "CS101", 1).await;
    create_course(&app, "CS201", 10).await;

    enroll(&app, student, small).await;

    let (_, body) = send(&app, Method::GET, &format!("/courses/{small}"), None).await;
    assert_eq!(body["enrolled_count"], 1);
    assert_eq!(body["available_seats"], 0);

    let (_, body) = send(&app, Method::GET, "/courses?available_only=true", None).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["course_code"], "CS201");

    let (_, body) = send(&app, Method::GET, &format!("/courses/{small}/students"), None).await;
    assert_eq!(body["enrollments"].as_array().unwrap().len(), 1);
    assert_eq!(body["enrollments"][0]["student"]["student_id"], "STU001");
}

#[tokio::test]
async fn capacity_cannot_drop_below_enrollment() {
    let app = app().await;
    let a = create_student(&app, "STU001", "a@university.edu").await;
    let b = create_student(&app, "STU002", "b@university.edu").await;
    let course = create_course(&app, "CS101", 5).await;
    enroll(&app, a, course).await;
    enroll(&app, b, course).await;

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/courses/{course}"),
        Some(json!({ "max_students": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["detail"],
        "Cannot set max_students to 1 when 2 students are enrolled"
    );

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/courses/{course}"),
        Some(json!({ "max_students": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["available_seats"], 0);
}

#[tokio::test]
async fn course_delete_guarded_by_active_enrollments() {
    let app = app().await;
    let student = create_student(&app, "STU001", "a@university.edu").await;
    let course = create_course(&app, "CS101", 5).await;
    let (_, enrollment) = enroll(&app, student, course).await;
    let enrollment_id = enrollment["id"].as_i64().unwrap();

    let (status, body) = send(&app, Method::DELETE, &format!("/courses/{course}"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Cannot delete course with 1 active enrollments");

    send(
        &app,
        Method::PUT,
        &format!("/enrollments/{enrollment_id}"),
        Some(json!({ "status": "completed" })),
    )
    .await;

    let (status, _) = send(&app, Method::DELETE, &format!("/courses/{course}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, Method::GET, &format!("/enrollments/{enrollment_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Enrollments
// =============================================================================

#[tokio::test]
async fn full_course_rejects_enrollment() {
    let app = app().await;
    let a = create_student(&app, "STU001", "a@university.edu").await;
    let b = create_student(&app, "STU002", "b@university.edu").await;
    let course = create_course(&app, "CS101", 1).await;

    let (status, _) = enroll(&app, a, course).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = enroll(&app, b, course).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Course is full");
}

#[tokio::test]
async fn duplicate_active_enrollment_rejected() {
    let app = app().await;
    let student = create_student(&app, "STU001", "a@university.edu").await;
    let course = create_course(&app, "CS101", 5).await;
    enroll(&app, student, course).await;

    let (status, body) = enroll(&app, student, course).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Student is already enrolled in this course");
}

#[tokio::test]
async fn re_enrolling_after_drop_reactivates_same_row() {
    let app = app().await;
    let student = create_student(&app, "STU001", "a@university.edu").await;
    let course = create_course(&app, "CS101", 5).await;
    let (_, first) = enroll(&app, student, course).await;
    let id = first["id"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/enrollments/{id}"),
        Some(json!({ "status": "dropped" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "dropped");

    let (status, again) = enroll(&app, student, course).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(again["id"], id);
    assert_eq!(again["status"], "active");
    assert_eq!(again["enrollment_date"], first["enrollment_date"]);
}

#[tokio::test]
async fn enrollment_requires_existing_student_and_course() {
    let app = app().await;
    let course = create_course(&app, "CS101", 5).await;

    let (status, body) = enroll(&app, 999, course).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Student not found");

    let student = create_student(&app, "STU001", "a@university.edu").await;
    let (status, body) = enroll(&app, student, 999).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Course not found");
}

#[tokio::test]
async fn enrollment_listings_filter_by_status() {
    let app = app().await;
    let a = create_student(&app, "STU001", "a@university.edu").await;
    let b = create_student(&app, "STU002", "b@university.edu").await;
    let course = create_course(&app, "CS101", 5).await;
    enroll(&app, a, course).await;
    let (_, second) = enroll(&app, b, course).await;
    let id = second["id"].as_i64().unwrap();
    send(
        &app,
        Method::PUT,
        &format!("/enrollments/{id}"),
        Some(json!({ "status": "completed" })),
    )
    .await;

    let (_, body) = send(&app, Method::GET, "/enrollments?status=active", None).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["student_id"], a);

    let (_, body) = send(&app, Method::GET, &format!("/enrollments/course/{course}"), None).await;
    assert_eq!(body["total"], 2);
    assert_eq!(body["items"][1]["student"]["student_id"], "STU002");

    let (_, body) = send(
        &app,
        Method::GET,
        &format!("/enrollments/student/{b}?status=completed"),
        None,
    )
    .await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["course"]["course_code"], "CS101");

    let (status, _) = send(&app, Method::GET, "/enrollments/student/999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_status_rejected() {
    let app = app().await;
    let (status, body) = send(&app, Method::GET, "/enrollments?status=paused", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string());

    let student = create_student(&app, "STU001", "a@university.edu").await;
    let course = create_course(&app, "CS101", 5).await;
    let (_, enrollment) = enroll(&app, student, course).await;
    let id = enrollment["id"].as_i64().unwrap();

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/enrollments/{id}"),
        Some(json!({ "status": "paused" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delete_enrollment_then_missing() {
    let app = app().await;
    let student = create_student(&app, "STU001", "a@university.edu").await;
    let course = create_course(&app, "CS101", 5).await;
    let (_, enrollment) = enroll(&app, student, course).await;
    let id = enrollment["id"].as_i64().unwrap();

    let (status, _) = send(&app, Method::DELETE, &format!("/enrollments/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, Method::DELETE, &format!("/enrollments/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Enrollment not found");
}
