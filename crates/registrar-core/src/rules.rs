//! # Enrollment Rules
//!
//! The consistency rules of Registrar as pure decision functions. The
//! database layer reads the current state inside a transaction, asks these
//! functions what to do, then writes.
//!
//! ## Enroll Decision
//! ```text
//! enroll(student, course)
//!      │
//!      ├── student missing?  ─────────────► NotFound("Student")   (db layer)
//!      ├── course missing?   ─────────────► NotFound("Course")    (db layer)
//!      │
//!      ▼  plan_enrollment(seats, existing)  ← THIS MODULE
//!      │
//!      ├── available_seats <= 0 ──────────► CourseFull
//!      ├── existing row, active ──────────► Conflict
//!      ├── existing row, dropped/completed► Reactivate(id)
//!      └── no row ────────────────────────► Insert
//! ```
//!
//! The capacity check runs before the duplicate check.

use crate::error::{CoreError, CoreResult};
use crate::types::EnrollmentStatus;

/// Message returned when the pair already has an active enrollment.
pub const ALREADY_ENROLLED: &str = "Student is already enrolled in this course";

// =============================================================================
// Seat Count
// =============================================================================

/// Capacity and active enrollment count of one course.
///
/// `enrolled() + available() == capacity()` always.
///
/// ## Example
/// ```rust
/// use registrar_core::rules::SeatCount;
///
/// let full = SeatCount::new(2, 2);
/// assert_eq!(full.available(), 0);
/// assert!(full.ensure_seat_available().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeatCount {
    capacity: i64,
    enrolled: i64,
}

impl SeatCount {
    pub const fn new(capacity: i64, enrolled: i64) -> Self {
        SeatCount { capacity, enrolled }
    }

    #[inline]
    pub const fn capacity(&self) -> i64 {
        self.capacity
    }

    #[inline]
    pub const fn enrolled(&self) -> i64 {
        self.enrolled
    }

    /// `capacity - enrolled`.
    #[inline]
    pub const fn available(&self) -> i64 {
        self.capacity - self.enrolled
    }

    #[inline]
    pub const fn is_full(&self) -> bool {
        self.available() <= 0
    }

    /// Fails with [`CoreError::CourseFull`] when no seat is left.
    pub fn ensure_seat_available(&self) -> CoreResult<()> {
        if self.is_full() {
            return Err(CoreError::CourseFull);
        }
        Ok(())
    }
}

// =============================================================================
// Enroll Decision
// =============================================================================

/// What the database layer must do to satisfy an enroll request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollPlan {
    /// Insert a new active row.
    Insert,
    /// Set the existing row (by id) back to active.
    Reactivate(i64),
}

/// An enrollment row already stored for the requested pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExistingEnrollment {
    pub id: i64,
    pub status: EnrollmentStatus,
}

/// Decides how to enroll a student given the course seats and any row that
/// already exists for the (student, course) pair.
pub fn plan_enrollment(
    seats: SeatCount,
    existing: Option<ExistingEnrollment>,
) -> CoreResult<EnrollPlan> {
    seats.ensure_seat_available()?;

    match existing {
        None => Ok(EnrollPlan::Insert),
        Some(row) if row.status.is_active() => Err(CoreError::conflict(ALREADY_ENROLLED)),
        Some(row) => Ok(EnrollPlan::Reactivate(row.id)),
    }
}

// =============================================================================
// Course Rules
// =============================================================================

/// Rejects a capacity below the current active enrollment count.
///
/// Setting the capacity equal to the count is allowed and leaves the course
/// full.
pub fn ensure_capacity_covers(new_max: i64, enrolled: i64) -> CoreResult<()> {
    if new_max < enrolled {
        return Err(CoreError::CapacityBelowEnrollment {
            requested: new_max,
            enrolled,
        });
    }
    Ok(())
}

/// Rejects deleting a course that still has active enrollments.
pub fn ensure_deletable(active_enrollments: i64) -> CoreResult<()> {
    if active_enrollments > 0 {
        return Err(CoreError::ActiveEnrollments {
            count: active_enrollments,
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
