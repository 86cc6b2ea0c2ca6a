//! Errors from the persistence layer.
//!
//! ```text
//! sqlx::Error ──┐
//!               ├──► DbError ──► ApiError (status + {"detail"}) ──► flash
//! CoreError  ───┘
//! ```
//!
//! Rule rejections found by a pre-check and constraint failures that slip
//! past one (a lost race) render the same message.

use registrar_core::rules::ALREADY_ENROLLED;
use registrar_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    /// Missing entity, duplicate key found before insert, or a refusal from
    /// the enrollment rules.
    #[error(transparent)]
    Rule(#[from] CoreError),

    /// `field` is the column list from SQLite's message, e.g.
    /// `students.email`.
    #[error("{}", unique_message(field))]
    UniqueViolation { field: String },

    /// A referenced student or course disappeared mid-request.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: &'static str) -> Self {
        DbError::Rule(CoreError::not_found(entity))
    }

    /// Conflict with a message shown to the user verbatim.
    pub fn conflict(message: impl Into<String>) -> Self {
        DbError::Rule(CoreError::conflict(message))
    }

    /// Caused by the request rather than the server; safe to echo back.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            DbError::Rule(_) | DbError::UniqueViolation { .. } | DbError::ForeignKeyViolation { .. }
        )
    }
}

fn unique_message(field: &str) -> &'static str {
    match field {
        "students.student_id" => "Student ID already exists",
        "students.email" => "Email already exists",
        "courses.course_code" => "Course code already exists",
        "enrollments.student_id, enrollments.course_id" => ALREADY_ENROLLED,
        _ => "Record already exists",
    }
}

const UNIQUE_PREFIX: &str = "UNIQUE constraint failed: ";
const FOREIGN_KEY_FAILED: &str = "FOREIGN KEY constraint failed";

/// Sorts a driver-reported failure by the constraint text SQLite puts in
/// its message.
fn classify(message: &str) -> DbError {
    if let Some(field) = message.strip_prefix(UNIQUE_PREFIX) {
        DbError::UniqueViolation {
            field: field.to_string(),
        }
    } else if message.contains(FOREIGN_KEY_FAILED) {
        DbError::ForeignKeyViolation {
            message: message.to_string(),
        }
    } else {
        DbError::QueryFailed(message.to_string())
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record"),
            sqlx::Error::Database(db_err) => classify(db_err.message()),
            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool is closed".to_string()),
            other => DbError::Internal(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_violation_messages() {
        let err = DbError::UniqueViolation {
            field: "students.email".to_string(),
        };
        assert_eq!(err.to_string(), "Email already exists");

        let err = DbError::UniqueViolation {
            field: "enrollments.student_id, enrollments.course_id".to_string(),
        };
        assert_eq!(err.to_string(), ALREADY_ENROLLED);
    }

    #[test]
    fn test_rule_errors_are_transparent() {
        let err = DbError::from(CoreError::CourseFull);
        assert_eq!(err.to_string(), "Course is full");
        assert!(err.is_client_error());
        assert!(!DbError::PoolExhausted.is_client_error());
    }

    #[test]
    fn test_classify_constraint_messages() {
        assert!(matches!(
            classify("UNIQUE constraint failed: courses.course_code"),
            DbError::UniqueViolation { ref field } if field == "courses.course_code"
        ));
        assert!(matches!(
            classify("FOREIGN KEY constraint failed"),
            DbError::ForeignKeyViolation { .. }
        ));
        assert!(matches!(classify("disk I/O error"), DbError::QueryFailed(_)));
    }

    #[test]
    fn test_row_not_found_maps_to_rule() {
        let err = DbError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, DbError::Rule(CoreError::NotFound { .. })));
    }
}
