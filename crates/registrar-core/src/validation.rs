//! # Validation Module
//!
//! Input validation for Registrar payloads.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Frontend (HTML forms)                                        │
//! │  └── required / maxlength attributes                                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: API handler (Rust)                                           │
//! │  ├── Type validation (JSON deserialization)                            │
//! │  └── THIS MODULE: field lengths, ranges, email shape                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  ├── UNIQUE constraints                                                │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Lengths are counted in characters, not bytes.
//!
//! ## Usage
//! ```rust
//! use registrar_core::validation::{validate_course_code, validate_credits};
//!
//! validate_course_code("CS101").unwrap();
//! assert!(validate_credits(13).is_err());
//! ```

use crate::error::ValidationError;
use crate::types::{CourseUpdate, NewCourse, NewStudent, StudentUpdate};
use crate::{CAPACITY_RANGE, CREDITS_RANGE};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

fn validate_text(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates an external student number such as "STU001".
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
pub fn validate_student_id(student_id: &str) -> ValidationResult<()> {
    validate_text("student_id", student_id, 50)
}

/// Validates a student or course display name (1 to 100 characters).
pub fn validate_name(name: &str) -> ValidationResult<()> {
    validate_text("name", name, 100)
}

/// Validates a course code (1 to 20 characters).
///
/// ## Example
/// ```rust
/// use registrar_core::validation::validate_course_code;
///
/// assert!(validate_course_code("MATH101").is_ok());
/// assert!(validate_course_code("").is_err());
/// assert!(validate_course_code(&"X".repeat(21)).is_err());
/// ```
pub fn validate_course_code(code: &str) -> ValidationResult<()> {
    validate_text("course_code", code, 20)
}

/// Validates an email address.
///
/// ## Rules
/// - Must not be empty, at most 100 characters
/// - Exactly one `@` with a non-empty local part
/// - Domain contains a dot that is neither first nor last
/// - No whitespace
///
/// This is a shape check, not RFC 5322.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    validate_text("email", email, 100)?;
    let email = email.trim();

    let invalid = |reason: &str| ValidationError::InvalidFormat {
        field: "email".to_string(),
        reason: reason.to_string(),
    };

    if email.chars().any(char::is_whitespace) {
        return Err(invalid("must not contain whitespace"));
    }

    let (local, domain) = match email.split_once('@') {
        Some(parts) => parts,
        None => return Err(invalid("must contain '@'")),
    };

    if local.is_empty() || domain.contains('@') {
        return Err(invalid("must have exactly one '@' after a non-empty name"));
    }

    let domain_ok = domain
        .split('.')
        .all(|label| !label.is_empty())
        && domain.contains('.');
    if !domain_ok {
        return Err(invalid("must have a domain like example.com"));
    }

    Ok(())
}

/// Validates a search query. Empty means "no filter".
///
/// ## Returns
/// The trimmed query, or `None` when nothing is left after trimming.
pub fn normalize_search(query: Option<&str>) -> ValidationResult<Option<String>> {
    let query = match query.map(str::trim) {
        Some(q) if !q.is_empty() => q,
        _ => return Ok(None),
    };

    if query.chars().count() > 100 {
        return Err(ValidationError::TooLong {
            field: "search".to_string(),
            max: 100,
        });
    }

    Ok(Some(query.to_string()))
}

// =============================================================================
// Numeric Validators
// =============================================================================

fn validate_range(field: &str, value: i64, (min, max): (i64, i64)) -> ValidationResult<()> {
    if value < min || value > max {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min,
            max,
        });
    }
    Ok(())
}

/// Validates course credits (1 to 12).
pub fn validate_credits(credits: i64) -> ValidationResult<()> {
    validate_range("credits", credits, CREDITS_RANGE)
}

/// Validates course capacity (1 to 500).
///
/// The enrolled-count guard is a separate rule, see
/// [`ensure_capacity_covers`](crate::rules::ensure_capacity_covers).
pub fn validate_max_students(max_students: i64) -> ValidationResult<()> {
    validate_range("max_students", max_students, CAPACITY_RANGE)
}

// =============================================================================
// Payload Validators
// =============================================================================

/// Validates every field of a new student.
pub fn validate_new_student(student: &NewStudent) -> ValidationResult<()> {
    validate_student_id(&student.student_id)?;
    validate_name(&student.name)?;
    validate_email(&student.email)
}

/// Validates the fields present in a student update.
pub fn validate_student_update(update: &StudentUpdate) -> ValidationResult<()> {
    if let Some(name) = &update.name {
        validate_name(name)?;
    }
    if let Some(email) = &update.email {
        validate_email(email)?;
    }
    Ok(())
}

/// Validates every field of a new course.
pub fn validate_new_course(course: &NewCourse) -> ValidationResult<()> {
    validate_course_code(&course.course_code)?;
    validate_name(&course.name)?;
    validate_credits(course.credits)?;
    validate_max_students(course.max_students)
}

/// Validates the fields present in a course update.
pub fn validate_course_update(update: &CourseUpdate) -> ValidationResult<()> {
    if let Some(name) = &update.name {
        validate_name(name)?;
    }
    if let Some(credits) = update.credits {
        validate_credits(credits)?;
    }
    if let Some(max_students) = update.max_students {
        validate_max_students(max_students)?;
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
