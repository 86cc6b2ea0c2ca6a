//! `/courses` endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use registrar_core::{Course, CourseUpdate, CourseWithStudents, NewCourse, Page};

use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::routes::{default_limit, page_request};
use crate::SharedState;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/courses", get(list_courses).post(create_course))
        .route(
            "/courses/{id}",
            get(get_course).put(update_course).delete(delete_course),
        )
        .route("/courses/{id}/students", get(course_students))
}

#[derive(Debug, Deserialize)]
pub struct CourseListQuery {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    pub search: Option<String>,
    #[serde(default)]
    pub available_only: bool,
}

async fn list_courses(
    State(state): State<SharedState>,
    ApiQuery(query): ApiQuery<CourseListQuery>,
) -> ApiResult<Json<Page<Course>>> {
    let page = state
        .db
        .courses()
        .list(
            query.search.as_deref(),
            query.available_only,
            page_request(query.skip, query.limit),
        )
        .await?;
    Ok(Json(page))
}

async fn create_course(
    State(state): State<SharedState>,
    ApiJson(new): ApiJson<NewCourse>,
) -> ApiResult<(StatusCode, Json<Course>)> {
    let course = state.db.courses().create(&new).await?;
    Ok((StatusCode::CREATED, Json(course)))
}

async fn get_course(
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<Course>> {
    let course = state
        .db
        .courses()
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Course"))?;
    Ok(Json(course))
}

/// The course with its actively enrolled students.
async fn course_students(
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<CourseWithStudents>> {
    Ok(Json(state.db.courses().get_with_students(id).await?))
}

async fn update_course(
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(update): ApiJson<CourseUpdate>,
) -> ApiResult<Json<Course>> {
    Ok(Json(state.db.courses().update(id, &update).await?))
}

/// Refused with 400 while the course has active enrollments.
async fn delete_course(
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<StatusCode> {
    state.db.courses().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
