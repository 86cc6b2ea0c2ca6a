//! `/enrollments` endpoints.
//!
//! ## Enrollment Lifecycle
//! ```text
//!   POST /enrollments ──► active ◄──────────────┐
//!                          │   │                 │ POST /enrollments
//!        PUT {"dropped"}   │   │ PUT {"completed"} (same pair)
//!                          ▼   ▼                 │
//!                    dropped   completed ────────┘
//! ```
//! Status updates accept any transition; only enrolling checks capacity.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use registrar_core::{
    Enrollment, EnrollmentStatus, EnrollmentStatusUpdate, EnrollmentWithCourse,
    EnrollmentWithStudent, NewEnrollment, Page,
};

use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::routes::{default_limit, page_request};
use crate::SharedState;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/enrollments", post(create_enrollment).get(list_enrollments))
        .route("/enrollments/student/{id}", get(student_enrollments))
        .route("/enrollments/course/{id}", get(course_enrollments))
        .route(
            "/enrollments/{id}",
            get(get_enrollment)
                .put(update_enrollment)
                .delete(delete_enrollment),
        )
}

#[derive(Debug, Deserialize)]
pub struct EnrollmentListQuery {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    pub status: Option<EnrollmentStatus>,
}

async fn create_enrollment(
    State(state): State<SharedState>,
    ApiJson(new): ApiJson<NewEnrollment>,
) -> ApiResult<(StatusCode, Json<Enrollment>)> {
    let enrollment = state.db.enrollments().enroll(&new).await?;
    Ok((StatusCode::CREATED, Json(enrollment)))
}

async fn list_enrollments(
    State(state): State<SharedState>,
    ApiQuery(query): ApiQuery<EnrollmentListQuery>,
) -> ApiResult<Json<Page<Enrollment>>> {
    let page = state
        .db
        .enrollments()
        .list(query.status, page_request(query.skip, query.limit))
        .await?;
    Ok(Json(page))
}

async fn student_enrollments(
    State(state): State<SharedState>,
    ApiPath(student_id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<EnrollmentListQuery>,
) -> ApiResult<Json<Page<EnrollmentWithCourse>>> {
    let page = state
        .db
        .enrollments()
        .list_for_student(student_id, query.status, page_request(query.skip, query.limit))
        .await?;
    Ok(Json(page))
}

async fn course_enrollments(
    State(state): State<SharedState>,
    ApiPath(course_id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<EnrollmentListQuery>,
) -> ApiResult<Json<Page<EnrollmentWithStudent>>> {
    let page = state
        .db
        .enrollments()
        .list_for_course(course_id, query.status, page_request(query.skip, query.limit))
        .await?;
    Ok(Json(page))
}

async fn get_enrollment(
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<Enrollment>> {
    let enrollment = state
        .db
        .enrollments()
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Enrollment"))?;
    Ok(Json(enrollment))
}

async fn update_enrollment(
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(update): ApiJson<EnrollmentStatusUpdate>,
) -> ApiResult<Json<Enrollment>> {
    let enrollment = state
        .db
        .enrollments()
        .update_status(id, update.status)
        .await?;
    Ok(Json(enrollment))
}

async fn delete_enrollment(
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<StatusCode> {
    state.db.enrollments().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
