//! Rule and input errors.
//!
//! `ValidationError` describes one bad field. `CoreError` is what an
//! enrollment operation refuses with; it absorbs `ValidationError` so
//! repositories return a single error type. Downstream, registrar-db wraps
//! `CoreError` in `DbError::Rule` and the API turns it into a status:
//!
//! | Variant                     | HTTP |
//! |-----------------------------|------|
//! | `NotFound`                  | 404  |
//! | `Conflict`                  | 400  |
//! | `CourseFull`                | 400  |
//! | `CapacityBelowEnrollment`   | 400  |
//! | `ActiveEnrollments`         | 400  |
//! | `Validation`                | 400  |

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Enrollment rule violations.
///
/// Every variant carries a message that is shown to the user unchanged, so
/// the wording matters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// The referenced entity does not exist.
    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    /// A uniqueness rule was violated (duplicate id, email, code or pair).
    #[error("{0}")]
    Conflict(String),

    /// The course has no seat left for another active enrollment.
    ///
    /// ## User Workflow
    /// ```text
    /// Enroll (student 7, course CS101)
    ///      │
    ///      ▼
    /// Count active enrollments: 30 of 30
    ///      │
    ///      ▼
    /// CourseFull
    ///      │
    ///      ▼
    /// Frontend flashes: "Course is full"
    /// ```
    #[error("Course is full")]
    CourseFull,

    /// A capacity change would leave more active students than seats.
    #[error("Cannot set max_students to {requested} when {enrolled} students are enrolled")]
    CapacityBelowEnrollment { requested: i64, enrolled: i64 },

    /// A course cannot be deleted while students are actively enrolled.
    #[error("Cannot delete course with {count} active enrollments")]
    ActiveEnrollments { count: i64 },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl CoreError {
    pub fn not_found(entity: &'static str) -> Self {
        CoreError::NotFound { entity }
    }

    /// Creates a Conflict error with a user-facing message.
    pub fn conflict(message: impl Into<String>) -> Self {
        CoreError::Conflict(message.into())
    }
}

/// One field that failed a check. `field` is the wire name
/// (`email`, `max_students`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: String },

    /// Length in characters.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Inclusive bounds.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    #[error("{field} must be one of: {}", allowed.join(", "))]
    NotAllowed { field: String, allowed: Vec<String> },
}

pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
