//! `/students` endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use registrar_core::{NewStudent, Page, Student, StudentUpdate, StudentWithEnrollments};

use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::routes::{default_limit, page_request};
use crate::SharedState;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/students", get(list_students).post(create_student))
        .route(
            "/students/{id}",
            get(get_student).put(update_student).delete(delete_student),
        )
}

#[derive(Debug, Deserialize)]
pub struct StudentListQuery {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    pub search: Option<String>,
}

async fn list_students(
    State(state): State<SharedState>,
    ApiQuery(query): ApiQuery<StudentListQuery>,
) -> ApiResult<Json<Page<Student>>> {
    let page = state
        .db
        .students()
        .list(query.search.as_deref(), page_request(query.skip, query.limit))
        .await?;
    Ok(Json(page))
}

async fn create_student(
    State(state): State<SharedState>,
    ApiJson(new): ApiJson<NewStudent>,
) -> ApiResult<(StatusCode, Json<Student>)> {
    let student = state.db.students().create(&new).await?;
    Ok((StatusCode::CREATED, Json(student)))
}

async fn get_student(
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<StudentWithEnrollments>> {
    Ok(Json(state.db.students().get_with_enrollments(id).await?))
}

async fn update_student(
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(update): ApiJson<StudentUpdate>,
) -> ApiResult<Json<Student>> {
    Ok(Json(state.db.students().update(id, &update).await?))
}

/// Deletes the student and, through the foreign keys, their enrollments.
async fn delete_student(
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<StatusCode> {
    state.db.students().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
