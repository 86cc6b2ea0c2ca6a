//! Health and dashboard counters.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use registrar_core::Stats;

use crate::error::ApiResult;
use crate::SharedState;

const SERVICE_NAME: &str = "student-enrollment-api";

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/health", get(health))
        .route("/stats", get(stats))
}

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub service: &'static str,
}

/// `200 {"status": "healthy"}` while the database answers, `503` otherwise.
async fn health(State(state): State<SharedState>) -> (StatusCode, Json<Health>) {
    if state.db.health_check().await {
        (
            StatusCode::OK,
            Json(Health {
                status: "healthy",
                service: SERVICE_NAME,
            }),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(Health {
                status: "unhealthy",
                service: SERVICE_NAME,
            }),
        )
    }
}

async fn stats(State(state): State<SharedState>) -> ApiResult<Json<Stats>> {
    Ok(Json(state.db.stats().get().await?))
}
