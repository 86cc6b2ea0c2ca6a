//! Route handlers, one module per resource.
//!
//! ```text
//! /health, /stats                 system
//! /students[/{id}]                students
//! /courses[/{id}[/students]]      courses
//! /enrollments[/...]              enrollments
//! ```

pub mod courses;
pub mod enrollments;
pub mod students;
pub mod system;

use registrar_core::{PageRequest, DEFAULT_PAGE_LIMIT};

pub(crate) fn default_limit() -> i64 {
    DEFAULT_PAGE_LIMIT
}

/// Builds the page request from raw `skip` / `limit` query values. Range
/// checks happen in the repository.
pub(crate) fn page_request(skip: i64, limit: i64) -> PageRequest {
    PageRequest { skip, limit }
}
