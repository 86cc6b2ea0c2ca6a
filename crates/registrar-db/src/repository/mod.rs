//! # Repository Module
//!
//! Database repository implementations for Registrar.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  REST handler                                                          │
//! │       │                                                                 │
//! │       │  db.enrollments().enroll(&new)                                  │
//! │       ▼                                                                 │
//! │  EnrollmentRepository                                                  │
//! │  ├── BEGIN                                                             │
//! │  ├── read student, course seats, existing row                          │
//! │  ├── registrar_core::rules::plan_enrollment(...)                       │
//! │  ├── INSERT or UPDATE                                                  │
//! │  └── COMMIT  (dropped transaction = ROLLBACK)                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`StudentRepository`](student::StudentRepository) - Student CRUD and search
//! - [`CourseRepository`](course::CourseRepository) - Course CRUD, search, seat counts
//! - [`EnrollmentRepository`](enrollment::EnrollmentRepository) - Enroll, status changes, listings
//! - [`StatsRepository`](stats::StatsRepository) - Dashboard counters

pub mod course;
pub mod enrollment;
pub mod stats;
pub mod student;

/// Builds a `LIKE` pattern matching `term` anywhere, escaping `%`, `_` and
/// `\` so they match literally. Queries pair it with `ESCAPE '\'`.
pub(crate) fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
