//! # Course Repository
//!
//! Database operations for courses.
//!
//! ## Seat Counts
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  courses                         enrollments (course_id = c.id)         │
//! │  ┌──────────────────────┐        ┌──────────────────────────────┐       │
//! │  │ CS101  max_students  │        │ active    ──┐                │       │
//! │  │        = 30          │        │ active    ──┼── COUNT = 2    │       │
//! │  └──────────────────────┘        │ dropped     │  (subquery)    │       │
//! │                                  │ completed   │                │       │
//! │                                  └─────────────┴────────────────┘       │
//! │                                                                         │
//! │  enrolled_count  = 2                                                   │
//! │  available_seats = 30 - 2 = 28   (SeatCount, registrar-core)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every read computes `enrolled_count` in the same statement that loads the
//! course, so the two numbers always agree.

use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::{debug, info};

use registrar_core::rules::{ensure_capacity_covers, ensure_deletable};
use registrar_core::validation::{normalize_search, validate_course_update, validate_new_course};
use registrar_core::{
    CoreError, Course, CourseUpdate, CourseWithStudents, NewCourse, Page, PageRequest,
};

use super::enrollment::EnrollmentRepository;
use super::like_pattern;
use crate::error::{DbError, DbResult};

/// Prefixes the SQL tail with the course columns plus the active enrollment
/// count.
macro_rules! course_select {
    ($($tail:tt)*) => {
        concat!(
            r#"
            SELECT
                c.id,
                c.course_code,
                c.name,
                c.description,
                c.credits,
                c.max_students,
                (SELECT COUNT(*) FROM enrollments e
                 WHERE e.course_id = c.id AND e.status = 'active') AS enrolled_count
            FROM courses c
            "#,
            $($tail)*
        )
    };
}

/// `?1` search pattern (or NULL), `?2` available-only flag.
macro_rules! course_filter {
    () => {
        r#"
        WHERE (?1 IS NULL
               OR c.name LIKE ?1 ESCAPE '\'
               OR c.course_code LIKE ?1 ESCAPE '\'
               OR c.description LIKE ?1 ESCAPE '\')
          AND (?2 = 0
               OR c.max_students > (SELECT COUNT(*) FROM enrollments e
                                    WHERE e.course_id = c.id AND e.status = 'active'))
        "#
    };
}

// =============================================================================
// Course Record
// =============================================================================

/// A course row joined with its active enrollment count.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct CourseRecord {
    pub id: i64,
    pub course_code: String,
    pub name: String,
    pub description: Option<String>,
    pub credits: i64,
    pub max_students: i64,
    pub enrolled_count: i64,
}

impl From<CourseRecord> for Course {
    fn from(record: CourseRecord) -> Self {
        Course::new(
            record.id,
            record.course_code,
            record.name,
            record.description,
            record.credits,
            record.max_students,
            record.enrolled_count,
        )
    }
}

/// Loads one course record on any executor (pool or open transaction).
pub(crate) async fn fetch_course<'e, E>(executor: E, id: i64) -> DbResult<Option<CourseRecord>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let record = sqlx::query_as::<_, CourseRecord>(course_select!("WHERE c.id = ?1"))
        .bind(id)
        .fetch_optional(executor)
        .await?;

    Ok(record)
}

/// Blank descriptions are stored as NULL.
fn clean_description(description: Option<&str>) -> Option<&str> {
    description.map(str::trim).filter(|d| !d.is_empty())
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for course database operations.
#[derive(Debug, Clone)]
pub struct CourseRepository {
    pool: SqlitePool,
}

impl CourseRepository {
    /// Creates a new CourseRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CourseRepository { pool }
    }

    /// Lists courses ordered by id.
    ///
    /// ## Arguments
    /// * `search` - Case-insensitive substring of name, code or description
    /// * `available_only` - Keep only courses with `available_seats > 0`
    /// * `request` - `skip` / `limit`
    ///
    /// Both filters apply before pagination, so `total` is the filtered count.
    pub async fn list(
        &self,
        search: Option<&str>,
        available_only: bool,
        request: PageRequest,
    ) -> DbResult<Page<Course>> {
        request.validate().map_err(CoreError::from)?;
        let pattern = normalize_search(search)
            .map_err(CoreError::from)?
            .map(|term| like_pattern(&term));

        debug!(
            search = ?pattern,
            available_only,
            skip = request.skip,
            limit = request.limit,
            "Listing courses"
        );

        let total: i64 = sqlx::query_scalar(concat!(
            "SELECT COUNT(*) FROM courses c ",
            course_filter!()
        ))
        .bind(&pattern)
        .bind(available_only)
        .fetch_one(&self.pool)
        .await?;

        let records = sqlx::query_as::<_, CourseRecord>(course_select!(
            course_filter!(),
            " ORDER BY c.id LIMIT ?3 OFFSET ?4"
        ))
        .bind(&pattern)
        .bind(available_only)
        .bind(request.limit)
        .bind(request.skip)
        .fetch_all(&self.pool)
        .await?;

        let items = records.into_iter().map(Course::from).collect();
        Ok(Page::new(items, total, request))
    }

    /// Gets a course with live seat counts.
    pub async fn get(&self, id: i64) -> DbResult<Option<Course>> {
        Ok(fetch_course(&self.pool, id).await?.map(Course::from))
    }

    /// Gets a course together with its active enrollments.
    pub async fn get_with_students(&self, id: i64) -> DbResult<CourseWithStudents> {
        let course = self.get(id).await?.ok_or_else(|| DbError::not_found("Course"))?;
        let enrollments = EnrollmentRepository::new(self.pool.clone())
            .active_for_course(id)
            .await?;

        Ok(CourseWithStudents {
            course,
            enrollments,
        })
    }

    /// Finds a course by its business code.
    pub async fn find_by_code(&self, course_code: &str) -> DbResult<Option<Course>> {
        let record = sqlx::query_as::<_, CourseRecord>(course_select!("WHERE c.course_code = ?1"))
            .bind(course_code.trim())
            .fetch_optional(&self.pool)
            .await?;

        Ok(record.map(Course::from))
    }

    /// Creates a course.
    ///
    /// ## Errors
    /// - `Course code already exists`
    /// - Validation errors (code length, credits 1-12, capacity 1-500)
    pub async fn create(&self, new: &NewCourse) -> DbResult<Course> {
        validate_new_course(new).map_err(CoreError::from)?;

        let course_code = new.course_code.trim();

        let mut tx = self.pool.begin().await?;

        let taken: Option<i64> = sqlx::query_scalar("SELECT id FROM courses WHERE course_code = ?1")
            .bind(course_code)
            .fetch_optional(&mut *tx)
            .await?;
        if taken.is_some() {
            return Err(DbError::conflict("Course code already exists"));
        }

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO courses (course_code, name, description, credits, max_students)
            VALUES (?1, ?2, ?3, ?4, ?5)
            RETURNING id
            "#,
        )
        .bind(course_code)
        .bind(new.name.trim())
        .bind(clean_description(new.description.as_deref()))
        .bind(new.credits)
        .bind(new.max_students)
        .fetch_one(&mut *tx)
        .await?;

        let record = fetch_course(&mut *tx, id)
            .await?
            .ok_or_else(|| DbError::Internal("inserted course vanished".to_string()))?;

        tx.commit().await?;

        info!(id, course_code, "Created course");
        Ok(record.into())
    }

    /// Applies a partial update. Absent fields keep their value; a blank
    /// `description` clears it.
    ///
    /// ## Errors
    /// - `Course not found`
    /// - `Cannot set max_students to X when Y students are enrolled`
    pub async fn update(&self, id: i64, update: &CourseUpdate) -> DbResult<Course> {
        validate_course_update(update).map_err(CoreError::from)?;

        let mut tx = self.pool.begin().await?;

        let current = fetch_course(&mut *tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("Course"))?;

        if let Some(max_students) = update.max_students {
            ensure_capacity_covers(max_students, current.enrolled_count)?;
        }

        // ?3 NULL keeps the description, '' clears it
        sqlx::query(
            r#"
            UPDATE courses
            SET
                name = COALESCE(?2, name),
                description = CASE
                    WHEN ?3 IS NULL THEN description
                    WHEN ?3 = '' THEN NULL
                    ELSE ?3
                END,
                credits = COALESCE(?4, credits),
                max_students = COALESCE(?5, max_students)
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(update.name.as_deref().map(str::trim))
        .bind(update.description.as_deref().map(str::trim))
        .bind(update.credits)
        .bind(update.max_students)
        .execute(&mut *tx)
        .await?;

        let record = fetch_course(&mut *tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("Course"))?;

        tx.commit().await?;

        info!(id, course_code = %record.course_code, "Updated course");
        Ok(record.into())
    }

    /// Deletes a course that has no active enrollments. Its dropped and
    /// completed enrollment rows go with it.
    ///
    /// ## Errors
    /// - `Course not found`
    /// - `Cannot delete course with N active enrollments`
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let current = fetch_course(&mut *tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("Course"))?;

        ensure_deletable(current.enrolled_count)?;

        sqlx::query("DELETE FROM courses WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(id, course_code = %current.course_code, "Deleted course");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
