//! # Enrollment Repository
//!
//! Database operations for enrollments: enrolling, status changes, deletes and
//! the student- and course-centric listings.
//!
//! ## Enroll Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │    take the write lock (no-op UPDATE on the course)                     │
//! │    SELECT student            ── missing ──► "Student not found"        │
//! │    SELECT course + seats     ── missing ──► "Course not found"         │
//! │    SELECT existing row for (student, course)                            │
//! │    plan_enrollment(seats, existing)     (registrar-core::rules)         │
//! │      ├── Insert        → INSERT ... status = 'active'                   │
//! │      └── Reactivate(id)→ UPDATE ... status = 'active'                   │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The lock is taken before the seat count is read, so two requests racing
//! for the last seat are serialized and the second one sees the course full.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};

use registrar_core::rules::{plan_enrollment, EnrollPlan, ExistingEnrollment, SeatCount};
use registrar_core::{
    CoreError, Course, Enrollment, EnrollmentStatus, EnrollmentWithCourse, EnrollmentWithStudent,
    NewEnrollment, Page, PageRequest, Student,
};

use super::course::fetch_course;
use crate::error::{DbError, DbResult};

const ENROLLMENT_COLUMNS: &str = "id, student_id, course_id, enrollment_date, status";

/// `?1` student id, `?2` status filter (or NULL), `?3` limit, `?4` offset.
const WITH_COURSE_FOR_STUDENT: &str = r#"
    SELECT
        e.id, e.student_id, e.course_id, e.enrollment_date, e.status,
        c.course_code,
        c.name AS course_name,
        c.description AS course_description,
        c.credits,
        c.max_students,
        (SELECT COUNT(*) FROM enrollments a
         WHERE a.course_id = c.id AND a.status = 'active') AS enrolled_count
    FROM enrollments e
    JOIN courses c ON c.id = e.course_id
    WHERE e.student_id = ?1 AND (?2 IS NULL OR e.status = ?2)
    ORDER BY e.id
    LIMIT ?3 OFFSET ?4
"#;

/// `?1` course id, `?2` status filter (or NULL), `?3` limit, `?4` offset.
const WITH_STUDENT_FOR_COURSE: &str = r#"
    SELECT
        e.id, e.student_id, e.course_id, e.enrollment_date, e.status,
        s.student_id AS student_code,
        s.name AS student_name,
        s.email AS student_email,
        s.created_at AS student_created_at
    FROM enrollments e
    JOIN students s ON s.id = e.student_id
    WHERE e.course_id = ?1 AND (?2 IS NULL OR e.status = ?2)
    ORDER BY e.id
    LIMIT ?3 OFFSET ?4
"#;

/// SQLite treats a negative LIMIT as "no limit".
const NO_LIMIT: i64 = -1;

// =============================================================================
// Joined Records
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct EnrollmentCourseRow {
    #[sqlx(flatten)]
    enrollment: Enrollment,
    course_code: String,
    course_name: String,
    course_description: Option<String>,
    credits: i64,
    max_students: i64,
    enrolled_count: i64,
}

impl From<EnrollmentCourseRow> for EnrollmentWithCourse {
    fn from(row: EnrollmentCourseRow) -> Self {
        let course = Course::new(
            row.enrollment.course_id,
            row.course_code,
            row.course_name,
            row.course_description,
            row.credits,
            row.max_students,
            row.enrolled_count,
        );
        EnrollmentWithCourse {
            enrollment: row.enrollment,
            course,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct EnrollmentStudentRow {
    #[sqlx(flatten)]
    enrollment: Enrollment,
    student_code: String,
    student_name: String,
    student_email: String,
    student_created_at: DateTime<Utc>,
}

impl From<EnrollmentStudentRow> for EnrollmentWithStudent {
    fn from(row: EnrollmentStudentRow) -> Self {
        let student = Student {
            id: row.enrollment.student_id,
            student_id: row.student_code,
            name: row.student_name,
            email: row.student_email,
            created_at: row.student_created_at,
        };
        EnrollmentWithStudent {
            enrollment: row.enrollment,
            student,
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for enrollment database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.enrollments();
///
/// let enrollment = repo.enroll(&NewEnrollment { student_id: 1, course_id: 2 }).await?;
/// repo.update_status(enrollment.id, EnrollmentStatus::Dropped).await?;
///
/// // Enrolling again reactivates the same row
/// let again = repo.enroll(&NewEnrollment { student_id: 1, course_id: 2 }).await?;
/// assert_eq!(again.id, enrollment.id);
/// ```
#[derive(Debug, Clone)]
pub struct EnrollmentRepository {
    pool: SqlitePool,
}

impl EnrollmentRepository {
    /// Creates a new EnrollmentRepository.
    pub fn new(pool: SqlitePool) -> Self {
        EnrollmentRepository { pool }
    }

    /// Enrolls a student in a course, or reactivates their earlier
    /// enrollment in it.
    ///
    /// ## Errors
    /// Checked in this order:
    /// 1. `Student not found`
    /// 2. `Course not found`
    /// 3. `Course is full`
    /// 4. `Student is already enrolled in this course`
    pub async fn enroll(&self, new: &NewEnrollment) -> DbResult<Enrollment> {
        let mut tx = self.pool.begin().await?;

        // Take the write lock before reading seat counts
        sqlx::query("UPDATE courses SET max_students = max_students WHERE id = ?1")
            .bind(new.course_id)
            .execute(&mut *tx)
            .await?;

        let student_code: Option<String> =
            sqlx::query_scalar("SELECT student_id FROM students WHERE id = ?1")
                .bind(new.student_id)
                .fetch_optional(&mut *tx)
                .await?;
        let student_code = student_code.ok_or_else(|| DbError::not_found("Student"))?;

        let course = fetch_course(&mut *tx, new.course_id)
            .await?
            .ok_or_else(|| DbError::not_found("Course"))?;

        let existing = sqlx::query_as::<_, (i64, EnrollmentStatus)>(
            "SELECT id, status FROM enrollments WHERE student_id = ?1 AND course_id = ?2",
        )
        .bind(new.student_id)
        .bind(new.course_id)
        .fetch_optional(&mut *tx)
        .await?
        .map(|(id, status)| ExistingEnrollment { id, status });

        let seats = SeatCount::new(course.max_students, course.enrolled_count);
        let plan = plan_enrollment(seats, existing)?;

        let enrollment = match plan {
            EnrollPlan::Insert => {
                sqlx::query_as::<_, Enrollment>(&format!(
                    r#"
                    INSERT INTO enrollments (student_id, course_id, enrollment_date, status)
                    VALUES (?1, ?2, ?3, ?4)
                    RETURNING {ENROLLMENT_COLUMNS}
                    "#
                ))
                .bind(new.student_id)
                .bind(new.course_id)
                .bind(Utc::now())
                .bind(EnrollmentStatus::Active)
                .fetch_one(&mut *tx)
                .await?
            }
            EnrollPlan::Reactivate(id) => {
                sqlx::query_as::<_, Enrollment>(&format!(
                    "UPDATE enrollments SET status = ?2 WHERE id = ?1 RETURNING {ENROLLMENT_COLUMNS}"
                ))
                .bind(id)
                .bind(EnrollmentStatus::Active)
                .fetch_one(&mut *tx)
                .await?
            }
        };

        tx.commit().await?;

        match plan {
            EnrollPlan::Insert => info!(
                id = enrollment.id,
                student = %student_code,
                course = %course.course_code,
                "Created enrollment"
            ),
            EnrollPlan::Reactivate(_) => info!(
                id = enrollment.id,
                student = %student_code,
                course = %course.course_code,
                "Reactivated enrollment"
            ),
        }

        Ok(enrollment)
    }

    /// Gets an enrollment by id.
    pub async fn get(&self, id: i64) -> DbResult<Option<Enrollment>> {
        let enrollment = sqlx::query_as::<_, Enrollment>(&format!(
            "SELECT {ENROLLMENT_COLUMNS} FROM enrollments WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(enrollment)
    }

    /// Sets an enrollment's status. Every transition is allowed.
    pub async fn update_status(&self, id: i64, status: EnrollmentStatus) -> DbResult<Enrollment> {
        let enrollment = sqlx::query_as::<_, Enrollment>(&format!(
            "UPDATE enrollments SET status = ?2 WHERE id = ?1 RETURNING {ENROLLMENT_COLUMNS}"
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Enrollment"))?;

        info!(id, %status, "Updated enrollment status");
        Ok(enrollment)
    }

    /// Deletes an enrollment row outright.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM enrollments WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Enrollment"));
        }

        info!(id, "Deleted enrollment");
        Ok(())
    }

    /// Lists all enrollments, optionally by status, ordered by id.
    pub async fn list(
        &self,
        status: Option<EnrollmentStatus>,
        request: PageRequest,
    ) -> DbResult<Page<Enrollment>> {
        request.validate().map_err(CoreError::from)?;
        debug!(?status, skip = request.skip, limit = request.limit, "Listing enrollments");

        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM enrollments WHERE (?1 IS NULL OR status = ?1)")
                .bind(status)
                .fetch_one(&self.pool)
                .await?;

        let items = sqlx::query_as::<_, Enrollment>(&format!(
            r#"
            SELECT {ENROLLMENT_COLUMNS} FROM enrollments
            WHERE (?1 IS NULL OR status = ?1)
            ORDER BY id
            LIMIT ?2 OFFSET ?3
            "#
        ))
        .bind(status)
        .bind(request.limit)
        .bind(request.skip)
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(items, total, request))
    }

    /// Lists one student's enrollments, each with its course.
    ///
    /// ## Errors
    /// - `Student not found`
    pub async fn list_for_student(
        &self,
        student_id: i64,
        status: Option<EnrollmentStatus>,
        request: PageRequest,
    ) -> DbResult<Page<EnrollmentWithCourse>> {
        request.validate().map_err(CoreError::from)?;
        self.ensure_exists("students", "Student", student_id).await?;

        let total = self.count_where("student_id", student_id, status).await?;
        let items = self
            .with_course(student_id, status, request.limit, request.skip)
            .await?;

        Ok(Page::new(items, total, request))
    }

    /// Lists one course's enrollments, each with its student.
    ///
    /// ## Errors
    /// - `Course not found`
    pub async fn list_for_course(
        &self,
        course_id: i64,
        status: Option<EnrollmentStatus>,
        request: PageRequest,
    ) -> DbResult<Page<EnrollmentWithStudent>> {
        request.validate().map_err(CoreError::from)?;
        self.ensure_exists("courses", "Course", course_id).await?;

        let total = self.count_where("course_id", course_id, status).await?;
        let items = self
            .with_student(course_id, status, request.limit, request.skip)
            .await?;

        Ok(Page::new(items, total, request))
    }

    /// Every enrollment of a student, whatever the status.
    pub async fn all_for_student(&self, student_id: i64) -> DbResult<Vec<EnrollmentWithCourse>> {
        self.with_course(student_id, None, NO_LIMIT, 0).await
    }

    /// The active enrollments of a course.
    pub async fn active_for_course(&self, course_id: i64) -> DbResult<Vec<EnrollmentWithStudent>> {
        self.with_student(course_id, Some(EnrollmentStatus::Active), NO_LIMIT, 0)
            .await
    }

    // -------------------------------------------------------------------------
    // Helpers
    // -------------------------------------------------------------------------

    async fn ensure_exists(&self, table: &str, entity: &'static str, id: i64) -> DbResult<()> {
        let found: Option<i64> = sqlx::query_scalar(&format!("SELECT id FROM {table} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        found.map(|_| ()).ok_or_else(|| DbError::not_found(entity))
    }

    async fn count_where(
        &self,
        column: &str,
        id: i64,
        status: Option<EnrollmentStatus>,
    ) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM enrollments WHERE {column} = ?1 AND (?2 IS NULL OR status = ?2)"
        ))
        .bind(id)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn with_course(
        &self,
        student_id: i64,
        status: Option<EnrollmentStatus>,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<EnrollmentWithCourse>> {
        let rows = sqlx::query_as::<_, EnrollmentCourseRow>(WITH_COURSE_FOR_STUDENT)
            .bind(student_id)
            .bind(status)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(EnrollmentWithCourse::from).collect())
    }

    async fn with_student(
        &self,
        course_id: i64,
        status: Option<EnrollmentStatus>,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<EnrollmentWithStudent>> {
        let rows = sqlx::query_as::<_, EnrollmentStudentRow>(WITH_STUDENT_FOR_COURSE)
            .bind(course_id)
            .bind(status)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(EnrollmentWithStudent::from).collect())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{add_course, add_student, test_db};

    fn pair(student_id: i64, course_id: i64) -> NewEnrollment {
        NewEnrollment {
            student_id,
            course_id,
        }
    }

    #[tokio::test]
    async fn test_enroll_creates_active_row() {
        let db = test_db().await;
        let s = add_student(&db, "STU001", "Alice").await;
        let c = add_course(&db, "CS101", 30).await;

        let e = db.enrollments().enroll(&pair(s.id, c.id)).await.unwrap();
        assert_eq!(e.status, EnrollmentStatus::Active);
        assert_eq!(e.student_id, s.id);
        assert_eq!(e.course_id, c.id);
        assert_eq!(db.enrollments().get(e.id).await.unwrap(), Some(e));
    }

    #[tokio::test]
    async fn test_enroll_checks_student_before_course() {
        let db = test_db().await;
        let s = add_student(&db, "STU001", "Alice").await;
        let c = add_course(&db, "CS101", 30).await;

        let err = db.enrollments().enroll(&pair(999, 999)).await.unwrap_err();
        assert_eq!(err.to_string(), "Student not found");

        let err = db.enrollments().enroll(&pair(s.id, 999)).await.unwrap_err();
        assert_eq!(err.to_string(), "Course not found");

        let err = db.enrollments().enroll(&pair(999, c.id)).await.unwrap_err();
        assert_eq!(err.to_string(), "Student not found");
    }

    #[tokio::test]
    async fn test_enroll_rejected_when_full() {
        let db = test_db().await;
        let a = add_student(&db, "STU001", "Alice").await;
        let b = add_student(&db, "STU002", "Bob").await;
        let c = add_course(&db, "CS101", 1).await;

        db.enrollments().enroll(&pair(a.id, c.id)).await.unwrap();
        let err = db.enrollments().enroll(&pair(b.id, c.id)).await.unwrap_err();
        assert!(matches!(err, DbError::Rule(CoreError::CourseFull)));
        assert_eq!(err.to_string(), "Course is full");
    }

    #[tokio::test]
    async fn test_duplicate_active_enrollment_rejected() {
        let db = test_db().await;
        let s = add_student(&db, "STU001", "Alice").await;
        let c = add_course(&db, "CS101", 30).await;

        db.enrollments().enroll(&pair(s.id, c.id)).await.unwrap();
        let err = db.enrollments().enroll(&pair(s.id, c.id)).await.unwrap_err();
        assert_eq!(err.to_string(), "Student is already enrolled in this course");
    }

    #[tokio::test]
    async fn test_reenroll_after_drop_reactivates_same_row() {
        let db = test_db().await;
        let s = add_student(&db, "STU001", "Alice").await;
        let c = add_course(&db, "CS101", 30).await;
        let repo = db.enrollments();

        let first = repo.enroll(&pair(s.id, c.id)).await.unwrap();
        repo.update_status(first.id, EnrollmentStatus::Dropped)
            .await
            .unwrap();

        let again = repo.enroll(&pair(s.id, c.id)).await.unwrap();
        assert_eq!(again.id, first.id);
        assert_eq!(again.status, EnrollmentStatus::Active);
        assert_eq!(again.enrollment_date, first.enrollment_date);

        let all = repo.list(None, PageRequest::default()).await.unwrap();
        assert_eq!(all.total, 1);
    }

    #[tokio::test]
    async fn test_reactivation_respects_capacity() {
        let db = test_db().await;
        let a = add_student(&db, "STU001", "Alice").await;
        let b = add_student(&db, "STU002", "Bob").await;
        let c = add_course(&db, "CS101", 1).await;
        let repo = db.enrollments();

        let first = repo.enroll(&pair(a.id, c.id)).await.unwrap();
        repo.update_status(first.id, EnrollmentStatus::Completed)
            .await
            .unwrap();
        repo.enroll(&pair(b.id, c.id)).await.unwrap();

        let err = repo.enroll(&pair(a.id, c.id)).await.unwrap_err();
        assert_eq!(err.to_string(), "Course is full");
    }

    #[tokio::test]
    async fn test_update_status_and_delete() {
        let db = test_db().await;
        let s = add_student(&db, "STU001", "Alice").await;
        let c = add_course(&db, "CS101", 30).await;
        let repo = db.enrollments();
        let e = repo.enroll(&pair(s.id, c.id)).await.unwrap();

        for status in [
            EnrollmentStatus::Completed,
            EnrollmentStatus::Dropped,
            EnrollmentStatus::Active,
        ] {
            assert_eq!(repo.update_status(e.id, status).await.unwrap().status, status);
        }

        let err = repo
            .update_status(999, EnrollmentStatus::Dropped)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Enrollment not found");

        repo.delete(e.id).await.unwrap();
        assert!(repo.get(e.id).await.unwrap().is_none());
        assert_eq!(
            repo.delete(e.id).await.unwrap_err().to_string(),
            "Enrollment not found"
        );
    }

    #[tokio::test]
    async fn test_list_filters_by_status() {
        let db = test_db().await;
        let s = add_student(&db, "STU001", "Alice").await;
        let cs = add_course(&db, "CS101", 30).await;
        let math = add_course(&db, "MATH101", 30).await;
        let repo = db.enrollments();

        repo.enroll(&pair(s.id, cs.id)).await.unwrap();
        let dropped = repo.enroll(&pair(s.id, math.id)).await.unwrap();
        repo.update_status(dropped.id, EnrollmentStatus::Dropped)
            .await
            .unwrap();

        let active = repo
            .list(Some(EnrollmentStatus::Active), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(active.total, 1);
        assert_eq!(active.items[0].course_id, cs.id);
        assert_eq!(db.stats().get().await.unwrap().active_enrollments, 1);
    }

    #[tokio::test]
    async fn test_student_and_course_listings() {
        let db = test_db().await;
        let a = add_student(&db, "STU001", "Alice").await;
        let b = add_student(&db, "STU002", "Bob").await;
        let cs = add_course(&db, "CS101", 30).await;
        let math = add_course(&db, "MATH101", 30).await;
        let repo = db.enrollments();

        repo.enroll(&pair(a.id, cs.id)).await.unwrap();
        repo.enroll(&pair(a.id, math.id)).await.unwrap();
        repo.enroll(&pair(b.id, cs.id)).await.unwrap();

        let mine = repo
            .list_for_student(a.id, None, PageRequest::new(0, 1).unwrap())
            .await
            .unwrap();
        assert_eq!(mine.total, 2);
        assert_eq!(mine.items.len(), 1);
        assert_eq!(mine.items[0].course.course_code, "CS101");
        assert_eq!(mine.items[0].course.enrolled_count, 2);

        let roster = repo
            .list_for_course(cs.id, Some(EnrollmentStatus::Active), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(roster.total, 2);
        let names: Vec<_> = roster.items.iter().map(|e| e.student.name.as_str()).collect();
        assert_eq!(names, ["Alice", "Bob"]);

        let err = repo
            .list_for_student(999, None, PageRequest::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Student not found");
        let err = repo
            .list_for_course(999, None, PageRequest::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Course not found");
    }
}
