//! # registrar-db: Database Layer for Registrar
//!
//! This crate provides database access for Registrar. It uses SQLite with
//! sqlx for async operations and applies the rules of `registrar-core`
//! inside transactions.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Registrar Data Flow                              │
//! │                                                                         │
//! │  REST handler (POST /enrollments)                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   registrar-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐   ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │   │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                │   │  (embedded)  │  │   │
//! │  │   │               │    │ StudentRepo    │   │              │  │   │
//! │  │   │ SqlitePool    │◄───│ CourseRepo     │   │ 001_initial  │  │   │
//! │  │   │ Connection    │    │ EnrollmentRepo │   │ _schema.sql  │  │   │
//! │  │   │ Management    │    │ StatsRepo      │   │              │  │   │
//! │  │   └───────────────┘    └───────┬────────┘   └──────────────┘  │   │
//! │  │                                │ plan_enrollment, SeatCount    │   │
//! │  │                                ▼                               │   │
//! │  │                        registrar-core::rules                   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │                     ./registrar.db                              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (student, course, ...)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use registrar_db::{Database, DbConfig};
//! use registrar_core::{NewEnrollment, PageRequest};
//!
//! let db = Database::new(DbConfig::new("registrar.db")).await?;
//!
//! let students = db.students().list(Some("alice"), PageRequest::default()).await?;
//! let enrollment = db
//!     .enrollments()
//!     .enroll(&NewEnrollment { student_id: 1, course_id: 2 })
//!     .await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig, Storage};

// Repository re-exports for convenience
pub use repository::course::CourseRepository;
pub use repository::enrollment::EnrollmentRepository;
pub use repository::stats::StatsRepository;
pub use repository::student::StudentRepository;
