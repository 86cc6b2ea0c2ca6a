//! # Student Repository
//!
//! Database operations for students.
//!
//! ## Key Operations
//! - Register with duplicate checks on `student_id` and `email`
//! - Partial update, delete (cascades to enrollments)
//! - Case-insensitive substring search over name, email and student_id

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use registrar_core::validation::{normalize_search, validate_new_student, validate_student_update};
use registrar_core::{
    CoreError, NewStudent, Page, PageRequest, Student, StudentUpdate, StudentWithEnrollments,
};

use super::enrollment::EnrollmentRepository;
use super::like_pattern;
use crate::error::{DbError, DbResult};

const STUDENT_COLUMNS: &str = "id, student_id, name, email, created_at";

const SEARCH_FILTER: &str = r#"
    (?1 IS NULL
     OR name LIKE ?1 ESCAPE '\'
     OR email LIKE ?1 ESCAPE '\'
     OR student_id LIKE ?1 ESCAPE '\')
"#;

/// Repository for student database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = StudentRepository::new(pool);
///
/// let alice = repo.create(&NewStudent { ... }).await?;
/// let page = repo.list(Some("alice"), PageRequest::default()).await?;
/// ```
#[derive(Debug, Clone)]
pub struct StudentRepository {
    pool: SqlitePool,
}

impl StudentRepository {
    /// Creates a new StudentRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StudentRepository { pool }
    }

    /// Lists students ordered by id, optionally filtered by `search`.
    ///
    /// `total` in the returned page counts every match, not just this page.
    pub async fn list(&self, search: Option<&str>, request: PageRequest) -> DbResult<Page<Student>> {
        request.validate().map_err(CoreError::from)?;
        let pattern = normalize_search(search)
            .map_err(CoreError::from)?
            .map(|term| like_pattern(&term));

        debug!(search = ?pattern, skip = request.skip, limit = request.limit, "Listing students");

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM students WHERE {SEARCH_FILTER}"
        ))
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await?;

        let items = sqlx::query_as::<_, Student>(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students WHERE {SEARCH_FILTER} ORDER BY id LIMIT ?2 OFFSET ?3"
        ))
        .bind(&pattern)
        .bind(request.limit)
        .bind(request.skip)
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(items, total, request))
    }

    /// Gets a student by internal id.
    ///
    /// ## Returns
    /// * `Ok(Some(Student))` - Student found
    /// * `Ok(None)` - Student not found
    pub async fn get(&self, id: i64) -> DbResult<Option<Student>> {
        let student = sqlx::query_as::<_, Student>(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(student)
    }

    /// Gets a student together with every enrollment they hold.
    pub async fn get_with_enrollments(&self, id: i64) -> DbResult<StudentWithEnrollments> {
        let student = self.get(id).await?.ok_or_else(|| DbError::not_found("Student"))?;
        let enrollments = EnrollmentRepository::new(self.pool.clone())
            .all_for_student(id)
            .await?;

        Ok(StudentWithEnrollments {
            student,
            enrollments,
        })
    }

    /// Registers a new student.
    ///
    /// ## Errors
    /// - `Student ID already exists` when `student_id` is taken
    /// - `Email already exists` when `email` is taken
    /// - Validation errors for malformed fields
    pub async fn create(&self, new: &NewStudent) -> DbResult<Student> {
        validate_new_student(new).map_err(CoreError::from)?;

        let student_id = new.student_id.trim();
        let name = new.name.trim();
        let email = new.email.trim();

        let mut tx = self.pool.begin().await?;

        let id_taken: Option<i64> =
            sqlx::query_scalar("SELECT id FROM students WHERE student_id = ?1")
                .bind(student_id)
                .fetch_optional(&mut *tx)
                .await?;
        if id_taken.is_some() {
            return Err(DbError::conflict("Student ID already exists"));
        }

        let email_taken: Option<i64> = sqlx::query_scalar("SELECT id FROM students WHERE email = ?1")
            .bind(email)
            .fetch_optional(&mut *tx)
            .await?;
        if email_taken.is_some() {
            return Err(DbError::conflict("Email already exists"));
        }

        let student = sqlx::query_as::<_, Student>(&format!(
            r#"
            INSERT INTO students (student_id, name, email, created_at)
            VALUES (?1, ?2, ?3, ?4)
            RETURNING {STUDENT_COLUMNS}
            "#
        ))
        .bind(student_id)
        .bind(name)
        .bind(email)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(id = student.id, student_id = %student.student_id, "Created student");
        Ok(student)
    }

    /// Applies a partial update. Absent fields keep their value.
    ///
    /// ## Errors
    /// - `Student not found`
    /// - `Email already exists` when the new email belongs to another student
    pub async fn update(&self, id: i64, update: &StudentUpdate) -> DbResult<Student> {
        validate_student_update(update).map_err(CoreError::from)?;

        let name = update.name.as_deref().map(str::trim);
        let email = update.email.as_deref().map(str::trim);

        let mut tx = self.pool.begin().await?;

        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM students WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(DbError::not_found("Student"));
        }

        if let Some(email) = email {
            let other: Option<i64> =
                sqlx::query_scalar("SELECT id FROM students WHERE email = ?1 AND id != ?2")
                    .bind(email)
                    .bind(id)
                    .fetch_optional(&mut *tx)
                    .await?;
            if other.is_some() {
                return Err(DbError::conflict("Email already exists"));
            }
        }

        let student = sqlx::query_as::<_, Student>(&format!(
            r#"
            UPDATE students
            SET
                name = COALESCE(?2, name),
                email = COALESCE(?3, email)
            WHERE id = ?1
            RETURNING {STUDENT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(name)
        .bind(email)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(id, student_id = %student.student_id, "Updated student");
        Ok(student)
    }

    /// Deletes a student and, through the foreign key cascade, all of their
    /// enrollments.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM students WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Student"));
        }

        info!(id, "Deleted student");
        Ok(())
    }

    /// Finds a student by external `student_id`.
    pub async fn find_by_student_id(&self, student_id: &str) -> DbResult<Option<Student>> {
        let student = sqlx::query_as::<_, Student>(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students WHERE student_id = ?1"
        ))
        .bind(student_id.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(student)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
