//! # registrar-core: Pure Enrollment Rules
//!
//! This crate is the **heart** of Registrar. It holds the domain types and
//! every enrollment rule as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Registrar Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    apps/web (HTML frontend)                     │   │
//! │  │    Student pages ──► Course pages ──► Enrollment pages         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ HTTP / JSON                            │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    apps/api (REST handlers)                     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ registrar-core (THIS CRATE) ★                   │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌────────────┐  ┌──────────┐  │   │
//! │  │   │   types   │  │   rules   │  │ pagination │  │validation│  │   │
//! │  │   │  Student  │  │ SeatCount │  │ PageRequest│  │  fields  │  │   │
//! │  │   │  Course   │  │EnrollPlan │  │   Page<T>  │  │  bounds  │  │   │
//! │  │   └───────────┘  └───────────┘  └────────────┘  └──────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 registrar-db (Database Layer)                   │   │
//! │  │         SQLite queries, transactions, migrations                │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain and wire types (Student, Course, Enrollment, ...)
//! - [`rules`] - Seat counting and the enrollment decision rules
//! - [`pagination`] - `skip`/`limit` arithmetic and the list envelope
//! - [`error`] - Domain error types
//! - [`validation`] - Field validation
//!
//! ## Example Usage
//!
//! ```rust
//! use registrar_core::rules::SeatCount;
//!
//! let seats = SeatCount::new(30, 29);
//! assert_eq!(seats.available(), 1);
//! assert!(seats.ensure_seat_available().is_ok());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod pagination;
pub mod rules;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use pagination::{Page, PageRequest};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default number of rows returned by list endpoints when `limit` is omitted.
pub const DEFAULT_PAGE_LIMIT: i64 = 100;

/// Largest `limit` a list request may ask for.
pub const MAX_PAGE_LIMIT: i64 = 1000;

/// Capacity given to a course when the request does not name one.
pub const DEFAULT_MAX_STUDENTS: i64 = 30;

/// Inclusive bounds on course credits.
pub const CREDITS_RANGE: (i64, i64) = (1, 12);

/// Inclusive bounds on course capacity.
pub const CAPACITY_RANGE: (i64, i64) = (1, 500);
