//! # API Error Types
//!
//! Every failure leaves the server as a JSON body `{"detail": "..."}` with
//! a status code the frontend can branch on.
//!
//! ## Status Mapping
//! ```text
//! ┌────────────────────────────────┬────────┬─────────────────────────────┐
//! │ Source                         │ Status │ detail                      │
//! ├────────────────────────────────┼────────┼─────────────────────────────┤
//! │ CoreError::NotFound            │ 404    │ "Student not found"         │
//! │ other CoreError / validation   │ 400    │ rule message                │
//! │ DbError::UniqueViolation       │ 400    │ "Email already exists"      │
//! │ DbError::ForeignKeyViolation   │ 400    │ constraint message          │
//! │ malformed JSON / query / path  │ 400    │ extractor rejection text    │
//! │ any other DbError              │ 500    │ "Internal server error"     │
//! └────────────────────────────────┴────────┴─────────────────────────────┘
//! ```

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use registrar_core::{CoreError, ValidationError};
use registrar_db::DbError;

/// An error response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{status}: {detail}")]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    detail: &'a str,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        ApiError {
            status,
            detail: detail.into(),
        }
    }

    pub fn not_found(entity: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, format!("{entity} not found"))
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, detail)
    }

    /// Generic 500. The cause is logged, never returned.
    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            detail: &self.detail,
        };
        (self.status, Json(body)).into_response()
    }
}

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

// =============================================================================
// Conversions
// =============================================================================

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound { .. } => Self::new(StatusCode::NOT_FOUND, err.to_string()),
            _ => Self::bad_request(err.to_string()),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::bad_request(err.to_string())
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Rule(rule) => rule.into(),
            DbError::UniqueViolation { .. } | DbError::ForeignKeyViolation { .. } => {
                Self::bad_request(err.to_string())
            }
            other => {
                error!(error = %other, "Database error");
                Self::internal()
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
