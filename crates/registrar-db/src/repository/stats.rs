//! # Stats Repository
//!
//! System-wide counters for the dashboard.

use sqlx::SqlitePool;
use tracing::debug;

use registrar_core::Stats;

use crate::error::DbResult;

/// Repository for aggregate counters.
#[derive(Debug, Clone)]
pub struct StatsRepository {
    pool: SqlitePool,
}

impl StatsRepository {
    /// Creates a new StatsRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StatsRepository { pool }
    }

    /// Reads all counters in one statement so they describe the same snapshot.
    ///
    /// `total_enrollments` counts active enrollments, same as
    /// `active_enrollments`.
    pub async fn get(&self) -> DbResult<Stats> {
        let (total_students, total_courses, active_enrollments): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM students),
                (SELECT COUNT(*) FROM courses),
                (SELECT COUNT(*) FROM enrollments WHERE status = 'active')
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        debug!(total_students, total_courses, active_enrollments, "Read stats");

        Ok(Stats {
            total_students,
            total_courses,
            total_enrollments: active_enrollments,
            active_enrollments,
        })
    }
}
