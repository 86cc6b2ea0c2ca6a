//! # Domain Types
//!
//! Core domain types used throughout Registrar. The same structs are the JSON
//! wire format of the REST API, so the frontend deserializes exactly what the
//! API serializes.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Student      │   │   Enrollment    │   │     Course      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (i64)       │◄──│  student_id(FK) │   │  id (i64)       │       │
//! │  │  student_id     │   │  course_id (FK) │──►│  course_code    │       │
//! │  │  email          │   │  status         │   │  max_students   │       │
//! │  │  name           │   │  enrollment_date│   │  enrolled_count │       │
//! │  └─────────────────┘   └─────────────────┘   │  available_seats│       │
//! │                                              └─────────────────┘       │
//! │                        ┌─────────────────┐                              │
//! │                        │EnrollmentStatus │                              │
//! │                        │  Active         │                              │
//! │                        │  Dropped        │                              │
//! │                        │  Completed      │                              │
//! │                        └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Students and courses have:
//! - `id`: integer primary key, used for relations and URLs
//! - Business ID: (`student_id`, `course_code`) - human-readable and unique

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::rules::SeatCount;

// =============================================================================
// Enrollment Status
// =============================================================================

/// The status of an enrollment.
///
/// Only `Active` enrollments occupy a seat. Any status may follow any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum EnrollmentStatus {
    /// Student currently takes the course.
    #[default]
    Active,
    /// Student left the course.
    Dropped,
    /// Student finished the course.
    Completed,
}

impl EnrollmentStatus {
    /// Every status, in display order.
    pub const ALL: [EnrollmentStatus; 3] = [
        EnrollmentStatus::Active,
        EnrollmentStatus::Dropped,
        EnrollmentStatus::Completed,
    ];

    /// Returns the lowercase name stored in the database and sent on the wire.
    pub const fn as_str(&self) -> &'static str {
        match self {
            EnrollmentStatus::Active => "active",
            EnrollmentStatus::Dropped => "dropped",
            EnrollmentStatus::Completed => "completed",
        }
    }

    /// Whether this enrollment counts against course capacity.
    #[inline]
    pub const fn is_active(&self) -> bool {
        matches!(self, EnrollmentStatus::Active)
    }
}

impl fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnrollmentStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EnrollmentStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: EnrollmentStatus::ALL
                    .iter()
                    .map(|status| status.as_str().to_string())
                    .collect(),
            })
    }
}

// =============================================================================
// Student
// =============================================================================

/// A registered student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Student {
    /// Internal identifier.
    pub id: i64,

    /// External student number (e.g. "STU001"), unique.
    pub student_id: String,

    /// Full display name.
    pub name: String,

    /// Email address, unique.
    pub email: String,

    /// When the student was registered.
    pub created_at: DateTime<Utc>,
}

/// Payload for registering a student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStudent {
    pub student_id: String,
    pub name: String,
    pub email: String,
}

/// Partial update of a student. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl StudentUpdate {
    /// True when the update would not touch any column.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none()
    }
}

// =============================================================================
// Course
// =============================================================================

/// A course with its live seat counts.
///
/// `enrolled_count + available_seats == max_students` holds for every value
/// built through [`Course::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: i64,

    /// Business code (e.g. "CS101"), unique.
    pub course_code: String,

    pub name: String,

    pub description: Option<String>,

    /// Credit count, 1 to 12.
    pub credits: i64,

    /// Capacity, 1 to 500.
    pub max_students: i64,

    /// Number of active enrollments.
    pub enrolled_count: i64,

    /// Seats left for new active enrollments.
    pub available_seats: i64,
}

impl Course {
    /// Builds a course from stored columns and its active enrollment count.
    pub fn new(
        id: i64,
        course_code: String,
        name: String,
        description: Option<String>,
        credits: i64,
        max_students: i64,
        enrolled_count: i64,
    ) -> Self {
        let seats = SeatCount::new(max_students, enrolled_count);
        Course {
            id,
            course_code,
            name,
            description,
            credits,
            max_students,
            enrolled_count: seats.enrolled(),
            available_seats: seats.available(),
        }
    }
}

fn default_max_students() -> i64 {
    crate::DEFAULT_MAX_STUDENTS
}

/// Payload for creating a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCourse {
    pub course_code: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub credits: i64,
    #[serde(default = "default_max_students")]
    pub max_students: i64,
}

/// Partial update of a course. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credits: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_students: Option<i64>,
}

impl CourseUpdate {
    /// True when the update would not touch any column.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.credits.is_none()
            && self.max_students.is_none()
    }
}

// =============================================================================
// Enrollment
// =============================================================================

/// One student's membership in one course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Enrollment {
    pub id: i64,
    /// Internal id of the student.
    pub student_id: i64,
    /// Internal id of the course.
    pub course_id: i64,
    /// When the row was first created. Reactivation keeps the original date.
    pub enrollment_date: DateTime<Utc>,
    pub status: EnrollmentStatus,
}

/// Payload for enrolling a student in a course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEnrollment {
    pub student_id: i64,
    pub course_id: i64,
}

/// Payload for changing an enrollment's status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentStatusUpdate {
    pub status: EnrollmentStatus,
}

/// An enrollment together with its course (student-centric views).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentWithCourse {
    #[serde(flatten)]
    pub enrollment: Enrollment,
    pub course: Course,
}

/// An enrollment together with its student (course-centric views).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrollmentWithStudent {
    #[serde(flatten)]
    pub enrollment: Enrollment,
    pub student: Student,
}

// =============================================================================
// Aggregates
// =============================================================================

/// A student and every enrollment they hold, whatever the status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentWithEnrollments {
    #[serde(flatten)]
    pub student: Student,
    #[serde(default)]
    pub enrollments: Vec<EnrollmentWithCourse>,
}

/// A course and its active enrollments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseWithStudents {
    #[serde(flatten)]
    pub course: Course,
    #[serde(default)]
    pub enrollments: Vec<EnrollmentWithStudent>,
}

/// System-wide counters shown on the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub total_students: i64,
    pub total_courses: i64,
    /// Counts active enrollments only, same as `active_enrollments`.
    pub total_enrollments: i64,
    pub active_enrollments: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================
