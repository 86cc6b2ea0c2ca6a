//! Frontend tests against a real API server on a local port.

use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use tokio::net::TcpListener;
use tower::ServiceExt;
use url::Url;

use registrar_api::{ApiConfig, AppState};
use registrar_db::{Database, DbConfig};
use registrar_web::{router, ApiClient, WebConfig, WebState};

/// Starts the API on an ephemeral port and returns the frontend router
/// pointed at it.
async fn stack() -> Router {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let api = registrar_api::router(AppState::new(db, ApiConfig::default()));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, api).await.unwrap();
    });

    frontend(&format!("http://{addr}"))
}

fn frontend(api_base: &str) -> Router {
    let client = ApiClient::new(Url::parse(api_base).unwrap(), Duration::from_secs(5)).unwrap();
    router(WebState::new(client, WebConfig::default()))
}

struct Reply {
    status: StatusCode,
    location: Option<String>,
    body: String,
}

async fn request(app: &Router, method: Method, uri: &str, form: Option<&str>) -> Reply {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match form {
        Some(form) => {
            builder = builder.header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
            Body::from(form.to_string())
        }
        None => Body::empty(),
    };

    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let location = response
        .headers()
        .get(header::LOCATION)
        .map(|value| value.to_str().unwrap().to_string());
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();

    Reply {
        status,
        location,
        body: String::from_utf8(bytes.to_vec()).unwrap(),
    }
}

async fn get(app: &Router, uri: &str) -> Reply {
    request(app, Method::GET, uri, None).await
}

async fn post(app: &Router, uri: &str, form: &str) -> Reply {
    request(app, Method::POST, uri, Some(form)).await
}

/// Follows a 303 and returns the rendered page.
async fn follow(app: &Router, reply: Reply) -> String {
    assert_eq!(reply.status, StatusCode::SEE_OTHER, "{}", reply.body);
    let location = reply.location.unwrap();
    let page = get(app, &location).await;
    assert_eq!(page.status, StatusCode::OK, "{location}");
    page.body
}

/// Id in a `/section/{id}?...` redirect.
fn id_from(location: &str) -> i64 {
    location
        .split('?')
        .next()
        .unwrap()
        .rsplit('/')
        .next()
        .unwrap()
        .parse()
        .unwrap()
}

#[tokio::test]
async fn health_and_dashboard() {
    let app = stack().await;

    let health = get(&app, "/health").await;
    assert_eq!(health.status, StatusCode::OK);
    assert!(health.body.contains("registrar-web"));

    let dashboard = get(&app, "/").await;
    assert_eq!(dashboard.status, StatusCode::OK);
    assert!(dashboard.body.contains("Active enrollments"));
}

#[tokio::test]
async fn dashboard_survives_api_outage() {
    let unused = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = unused.local_addr().unwrap();
    drop(unused);

    let app = frontend(&format!("http://{addr}"));
    let page = get(&app, "/").await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("A server error occurred. Please try again later."));
}

#[tokio::test]
async fn create_and_view_student() {
    let app = stack().await;

    let created = post(
        &app,
        "/students",
        "student_id=STU001&name=Alice+Johnson&email=alice%40university.edu",
    )
    .await;
    let location = created.location.clone().unwrap();
    assert!(location.starts_with("/students/"));
    assert!(location.contains("level=success"));

    let page = follow(&app, created).await;
    assert!(page.contains("Alice Johnson"));
    assert!(page.contains(r#"Student &quot;Alice Johnson&quot; created successfully!"#));

    let list = get(&app, "/students?search=alice").await;
    assert!(list.body.contains("STU001"));
}

#[tokio::test]
async fn student_form_errors_rerender() {
    let app = stack().await;

    let blank = post(&app, "/students", "student_id=&name=&email=").await;
    assert_eq!(blank.status, StatusCode::OK);
    assert!(blank.body.contains("Student ID is required"));

    post(&app, "/students", "student_id=STU001&name=A&email=a%40university.edu").await;
    let duplicate = post(&app, "/students", "student_id=STU002&name=B&email=a%40university.edu").await;
    assert_eq!(duplicate.status, StatusCode::OK);
    assert!(duplicate.body.contains("Error creating student: Email already exists"));
    assert!(duplicate.body.contains(r#"value="STU002""#));
}

#[tokio::test]
async fn missing_student_redirects_to_list() {
    let app = stack().await;
    let reply = get(&app, "/students/999").await;
    assert_eq!(reply.status, StatusCode::SEE_OTHER);
    assert_eq!(
        reply.location.as_deref(),
        Some("/students?notice=The+requested+resource+was+not+found.&level=error")
    );
}

#[tokio::test]
async fn enroll_drop_and_reenroll() {
    let app = stack().await;

    let student = post(&app, "/students", "student_id=STU001&name=Alice&email=a%40university.edu").await;
    let student_id = id_from(student.location.as_deref().unwrap());
    let course = post(
        &app,
        "/courses",
        "course_code=CS101&name=Intro+to+CS&description=&credits=3&max_students=1",
    )
    .await;
    let course_id = id_from(course.location.as_deref().unwrap());

    let form = format!("student_id={student_id}&course_id={course_id}");
    let enrolled = post(&app, "/enrollments/enroll", &form).await;
    assert_eq!(
        enrolled.location.as_deref().map(|l| l.split('?').next().unwrap()),
        Some(format!("/enrollments/student/{student_id}").as_str())
    );
    let page = follow(&app, enrolled).await;
    assert!(page.contains("Successfully enrolled in Intro to CS!"));
    assert!(page.contains("No courses with open seats are available."));

    let again = post(&app, "/enrollments/enroll", &form).await;
    assert!(again.location.unwrap().contains("level=warning"));

    let course_page = get(&app, &format!("/courses/{course_id}")).await;
    assert!(course_page.body.contains("Enrolled: 1 of 1 (0 seats left)"));

    let delete_course = post(&app, &format!("/courses/{course_id}/delete"), "").await;
    let location = delete_course.location.unwrap();
    assert!(location.starts_with(&format!("/courses/{course_id}?")));
    assert!(location.contains("Cannot+delete+course+with+1+active+enrollments"));

    // The enrollment row id is the first one created
    let dropped = post(&app, "/enrollments/1/drop", "").await;
    let page = follow(&app, dropped).await;
    assert!(page.contains("Successfully dropped Intro to CS."));
    assert!(page.contains("CS101 - Intro to CS (1 seats)"));

    let back = post(&app, "/enrollments/enroll", &form).await;
    assert!(back.location.unwrap().contains("level=success"));
}

#[tokio::test]
async fn course_form_validation_and_edit() {
    let app = stack().await;

    let missing = post(&app, "/courses", "course_code=&name=Calc&credits=4").await;
    assert_eq!(missing.status, StatusCode::OK);
    assert!(missing.body.contains("Course code, name, and credits are required"));

    let created = post(
        &app,
        "/courses",
        "course_code=MATH101&name=Calculus&description=Limits&credits=4&max_students=40",
    )
    .await;
    let id = id_from(created.location.as_deref().unwrap());

    let unchanged = post(
        &app,
        &format!("/courses/{id}/edit"),
        "name=Calculus&description=Limits&credits=4&max_students=40",
    )
    .await;
    assert!(unchanged.location.unwrap().contains("No+changes+made"));

    let updated = post(
        &app,
        &format!("/courses/{id}/edit"),
        "name=Calculus+I&description=&credits=4&max_students=40",
    )
    .await;
    let page = follow(&app, updated).await;
    assert!(page.contains("Course updated successfully!"));
    assert!(page.contains("Calculus I"));
    assert!(page.contains("No description."));
}

#[tokio::test]
async fn huge_page_number_renders_empty_list() {
    let app = stack().await;
    post(&app, "/students", "student_id=STU001&name=Alice&email=a%40university.edu").await;

    let max = i64::MAX;
    let students = get(&app, &format!("/students?page={max}")).await;
    assert_eq!(students.status, StatusCode::OK);
    assert!(students.body.contains("No students found."));

    for path in ["/courses", "/enrollments"] {
        let reply = get(&app, &format!("{path}?page={max}")).await;
        assert_eq!(reply.status, StatusCode::OK, "{path}");
    }
}

#[tokio::test]
async fn unknown_page_is_404() {
    let app = stack().await;
    let reply = get(&app, "/nowhere").await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert!(reply.body.contains("Page not found"));
}
