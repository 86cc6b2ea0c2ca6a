//! Enrollment pages: the admin list, per-student and per-course views, and
//! the enroll / drop / complete / delete actions.
//!
//! ```text
//! /enrollments/student/7 ──[Enroll form]──► POST /enrollments/enroll
//!        ▲                                        │
//!        └──────────── 303 + flash ───────────────┘
//!
//! row buttons ──► POST /enrollments/{id}/drop | complete | delete
//!                     └─► 303 back to the page they came from
//! ```

use std::collections::BTreeMap;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Form, Router};
use serde::Deserialize;
use tracing::{info, warn};

use registrar_core::{
    Course, Enrollment, EnrollmentStatus, EnrollmentWithCourse, NewEnrollment, PageRequest,
    MAX_PAGE_LIMIT,
};

use crate::client::ApiClient;
use crate::error::{ClientError, ClientResult};
use crate::flash::{back_or, Flash, FlashParams};
use crate::pages::{status_filter, status_tabs, OrRedirect, PageError, PageResult};
use crate::render::{escape, layout, pagination, post_button, status_badge};
use crate::SharedState;

const LIST_PATH: &str = "/enrollments";

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/enrollments", get(list))
        .route("/enrollments/student/{id}", get(for_student))
        .route("/enrollments/course/{id}", get(for_course))
        .route("/enrollments/enroll", post(enroll))
        .route("/enrollments/{id}/drop", post(drop_enrollment))
        .route("/enrollments/{id}/complete", post(complete))
        .route("/enrollments/{id}/delete", post(delete))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<i64>,
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EnrollForm {
    pub student_id: String,
    pub course_id: String,
}

impl EnrollForm {
    fn parse(&self) -> Option<NewEnrollment> {
        Some(NewEnrollment {
            student_id: self.student_id.trim().parse().ok()?,
            course_id: self.course_id.trim().parse().ok()?,
        })
    }
}

/// Row action buttons for an enrollment.
fn actions(enrollment: &Enrollment) -> String {
    let id = enrollment.id;
    let mut buttons = String::new();
    if enrollment.status.is_active() {
        buttons.push_str(&post_button(
            &format!("/enrollments/{id}/complete"),
            "Complete",
            None,
        ));
        buttons.push(' ');
        buttons.push_str(&post_button(
            &format!("/enrollments/{id}/drop"),
            "Drop",
            Some("Drop this course?"),
        ));
        buttons.push(' ');
    }
    buttons.push_str(&post_button(
        &format!("/enrollments/{id}/delete"),
        "Delete",
        Some("Delete this enrollment record?"),
    ));
    buttons
}

// =============================================================================
// Admin list
// =============================================================================

async fn list(
    State(state): State<SharedState>,
    Query(params): Query<ListParams>,
    Query(flash): Query<FlashParams>,
) -> PageResult {
    let status = status_filter(params.status.as_deref(), None);
    let request = PageRequest::for_page(params.page.unwrap_or(1), state.config.page_size);
    let page = state
        .api
        .list_enrollments(status, request)
        .await
        .or_redirect("/")?;
    let names = Names::resolve(&state.api, &page.items).await;

    let mut content = String::from("<h1>Enrollments</h1>");
    content.push_str(&status_tabs(LIST_PATH, status));

    if page.items.is_empty() {
        content.push_str("<p>No enrollments found.</p>");
    } else {
        content.push_str(
            "<table><tr><th>Student</th><th>Course</th><th>Enrolled</th><th>Status</th><th></th></tr>",
        );
        for enrollment in &page.items {
            content.push_str(&format!(
                r#"<tr><td><a href="/enrollments/student/{}">{}</a></td><td><a href="/enrollments/course/{}">{}</a></td><td>{}</td><td>{}</td><td>{}</td></tr>"#,
                enrollment.student_id,
                escape(&names.student(enrollment.student_id)),
                enrollment.course_id,
                escape(&names.course(enrollment.course_id)),
                enrollment.enrollment_date.format("%Y-%m-%d"),
                status_badge(enrollment.status),
                actions(enrollment),
            ));
        }
        content.push_str("</table>");
    }

    let base_query = status
        .map(|status| format!("status={}", status.as_str()))
        .unwrap_or_default();
    content.push_str(&pagination(LIST_PATH, &base_query, &page));

    Ok(layout("Enrollments", flash.into_flash().as_ref(), &content).into_response())
}

/// The looked-up label, or "`kind` `id`" when the lookup failed. The
/// failure is logged since the page still renders.
fn label_or_fallback(lookup: ClientResult<String>, kind: &str, id: i64) -> String {
    match lookup {
        Ok(label) => label,
        Err(err) => {
            warn!(kind, id, error = %err, "Could not resolve name");
            format!("{kind} {id}")
        }
    }
}

/// Display names for the students and courses on one list page.
///
/// Each distinct id is fetched once. A failed lookup falls back to
/// "Student 7" / "Course 3" rather than failing the page.
struct Names {
    students: BTreeMap<i64, String>,
    courses: BTreeMap<i64, String>,
}

impl Names {
    async fn resolve(api: &ApiClient, enrollments: &[Enrollment]) -> Self {
        let mut names = Names {
            students: BTreeMap::new(),
            courses: BTreeMap::new(),
        };

        for enrollment in enrollments {
            let (student_id, course_id) = (enrollment.student_id, enrollment.course_id);
            if !names.students.contains_key(&student_id) {
                let name = label_or_fallback(
                    api.get_student(student_id).await.map(|found| found.student.name),
                    "Student",
                    student_id,
                );
                names.students.insert(student_id, name);
            }
            if !names.courses.contains_key(&course_id) {
                let name = label_or_fallback(
                    api.get_course(course_id)
                        .await
                        .map(|course| format!("{} - {}", course.course_code, course.name)),
                    "Course",
                    course_id,
                );
                names.courses.insert(course_id, name);
            }
        }
        names
    }

    fn student(&self, id: i64) -> String {
        self.students
            .get(&id)
            .cloned()
            .unwrap_or_else(|| format!("Student {id}"))
    }

    fn course(&self, id: i64) -> String {
        self.courses
            .get(&id)
            .cloned()
            .unwrap_or_else(|| format!("Course {id}"))
    }
}

// =============================================================================
// Per-student view
// =============================================================================

async fn for_student(
    State(state): State<SharedState>,
    Path(student_id): Path<i64>,
    Query(params): Query<ListParams>,
    Query(flash): Query<FlashParams>,
) -> PageResult {
    let student = state
        .api
        .get_student(student_id)
        .await
        .or_redirect("/students")?;
    let status = status_filter(params.status.as_deref(), Some(EnrollmentStatus::Active));
    let enrollments = state
        .api
        .student_enrollments(student_id, status, every_row())
        .await
        .or_redirect(&format!("/students/{student_id}"))?;
    let courses = state.api.all_courses().await.or_redirect(&format!("/students/{student_id}"))?;
    let open = open_courses(&courses, &student.enrollments);

    let path = format!("/enrollments/student/{student_id}");
    let mut content = format!(
        r#"<h1>Enrollments: {}</h1><p><a href="/students/{student_id}">Back to student</a></p>"#,
        escape(&student.student.name)
    );

    content.push_str("<h2>Enroll in a course</h2>");
    if open.is_empty() {
        content.push_str("<p>No courses with open seats are available.</p>");
    } else {
        content.push_str(&format!(
            r#"<form method="post" action="/enrollments/enroll"><input type="hidden" name="student_id" value="{student_id}"><select name="course_id">"#
        ));
        for course in &open {
            content.push_str(&format!(
                r#"<option value="{}">{} - {} ({} seats)</option>"#,
                course.id,
                escape(&course.course_code),
                escape(&course.name),
                course.available_seats,
            ));
        }
        content.push_str(r#"</select> <button type="submit">Enroll</button></form>"#);
    }

    content.push_str("<h2>Courses</h2>");
    content.push_str(&status_tabs(&path, status));
    if enrollments.items.is_empty() {
        content.push_str("<p>No enrollments.</p>");
    } else {
        content.push_str(
            "<table><tr><th>Code</th><th>Course</th><th>Credits</th><th>Enrolled</th><th>Status</th><th></th></tr>",
        );
        for item in &enrollments.items {
            content.push_str(&format!(
                r#"<tr><td>{}</td><td><a href="/courses/{}">{}</a></td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>"#,
                escape(&item.course.course_code),
                item.course.id,
                escape(&item.course.name),
                item.course.credits,
                item.enrollment.enrollment_date.format("%Y-%m-%d"),
                status_badge(item.enrollment.status),
                actions(&item.enrollment),
            ));
        }
        content.push_str("</table>");
    }

    Ok(layout(&student.student.name, flash.into_flash().as_ref(), &content).into_response())
}

/// Courses with a free seat that the student is not actively taking.
fn open_courses<'a>(courses: &'a [Course], held: &[EnrollmentWithCourse]) -> Vec<&'a Course> {
    courses
        .iter()
        .filter(|course| course.available_seats > 0)
        .filter(|course| {
            !held
                .iter()
                .any(|item| item.enrollment.course_id == course.id && item.enrollment.status.is_active())
        })
        .collect()
}

fn every_row() -> PageRequest {
    PageRequest {
        skip: 0,
        limit: MAX_PAGE_LIMIT,
    }
}

// =============================================================================
// Per-course view
// =============================================================================

async fn for_course(
    State(state): State<SharedState>,
    Path(course_id): Path<i64>,
    Query(params): Query<ListParams>,
    Query(flash): Query<FlashParams>,
) -> PageResult {
    let course = state.api.get_course(course_id).await.or_redirect("/courses")?;
    let status = status_filter(params.status.as_deref(), Some(EnrollmentStatus::Active));
    let enrollments = state
        .api
        .course_enrollments(course_id, status, every_row())
        .await
        .or_redirect(&format!("/courses/{course_id}"))?;

    let path = format!("/enrollments/course/{course_id}");
    let mut content = format!(
        r#"<h1>Enrollments: {} - {}</h1>
<p>{} of {} seats taken. <a href="/courses/{course_id}">Back to course</a></p>"#,
        escape(&course.course_code),
        escape(&course.name),
        course.enrolled_count,
        course.max_students,
    );
    content.push_str(&status_tabs(&path, status));

    if enrollments.items.is_empty() {
        content.push_str("<p>No enrollments.</p>");
    } else {
        content.push_str(
            "<table><tr><th>Student ID</th><th>Name</th><th>Email</th><th>Enrolled</th><th>Status</th><th></th></tr>",
        );
        for item in &enrollments.items {
            content.push_str(&format!(
                r#"<tr><td>{}</td><td><a href="/students/{}">{}</a></td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>"#,
                escape(&item.student.student_id),
                item.student.id,
                escape(&item.student.name),
                escape(&item.student.email),
                item.enrollment.enrollment_date.format("%Y-%m-%d"),
                status_badge(item.enrollment.status),
                actions(&item.enrollment),
            ));
        }
        content.push_str("</table>");
    }

    Ok(layout(&course.name, flash.into_flash().as_ref(), &content).into_response())
}

// =============================================================================
// Actions
// =============================================================================

async fn enroll(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Form(form): Form<EnrollForm>,
) -> PageResult {
    let Some(new) = form.parse() else {
        return Ok(Flash::error("Invalid enrollment request.")
            .redirect(&back_or(&headers, "/"))
            .into_response());
    };
    let student_page = format!("/enrollments/student/{}", new.student_id);

    let flash = match state.api.enroll(&new).await {
        Ok(enrollment) => {
            info!(
                id = enrollment.id,
                student_id = new.student_id,
                course_id = new.course_id,
                "Enrolled"
            );
            match state.api.get_course(enrollment.course_id).await {
                Ok(course) => Flash::success(format!("Successfully enrolled in {}!", course.name)),
                Err(err) => {
                    warn!(course_id = enrollment.course_id, error = %err, "Could not load enrolled course");
                    Flash::success("Successfully enrolled!")
                }
            }
        }
        Err(err) => enroll_failure(&err),
    };

    Ok(flash.redirect(&student_page).into_response())
}

/// Flash for a refused enrollment.
fn enroll_failure(err: &ClientError) -> Flash {
    let detail = err.detail();
    if detail.contains("already enrolled") {
        Flash::warning("You are already enrolled in this course.")
    } else if detail.contains("full") {
        Flash::error("This course is full.")
    } else {
        Flash::error(format!("Enrollment failed: {}", err.user_message()))
    }
}

/// Marks the enrollment dropped and returns to the student's enrollments.
async fn drop_enrollment(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> PageResult {
    let back = back_or(&headers, LIST_PATH);
    let enrollment = state
        .api
        .set_enrollment_status(id, EnrollmentStatus::Dropped)
        .await
        .map_err(|err| {
            PageError::new(
                back.clone(),
                Flash::error(format!("Failed to drop course: {}", err.user_message())),
            )
        })?;

    info!(id, "Enrollment dropped");
    let flash = match state.api.get_course(enrollment.course_id).await {
        Ok(course) => Flash::success(format!("Successfully dropped {}.", course.name)),
        Err(err) => {
            warn!(course_id = enrollment.course_id, error = %err, "Could not load dropped course");
            Flash::success("Course dropped.")
        }
    };
    Ok(flash
        .redirect(&format!("/enrollments/student/{}", enrollment.student_id))
        .into_response())
}

async fn complete(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> PageResult {
    let back = back_or(&headers, LIST_PATH);
    let flash = match state
        .api
        .set_enrollment_status(id, EnrollmentStatus::Completed)
        .await
    {
        Ok(enrollment) => {
            info!(id, "Enrollment completed");
            match state.api.get_course(enrollment.course_id).await {
                Ok(course) => Flash::success(format!("Marked {} as completed.", course.name)),
                Err(err) => {
                    warn!(course_id = enrollment.course_id, error = %err, "Could not load completed course");
                    Flash::success("Enrollment marked as completed.")
                }
            }
        }
        Err(err) => Flash::error(format!("Failed to update enrollment: {}", err.user_message())),
    };
    Ok(flash.redirect(&back).into_response())
}

async fn delete(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> PageResult {
    let back = back_or(&headers, LIST_PATH);
    let flash = match state.api.delete_enrollment(id).await {
        Ok(()) => {
            info!(id, "Enrollment deleted");
            Flash::success("Enrollment record deleted successfully.")
        }
        Err(err) => Flash::error(format!("Failed to delete enrollment: {}", err.user_message())),
    };
    Ok(flash.redirect(&back).into_response())
}
