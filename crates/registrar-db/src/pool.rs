//! # Pool and Database Handle
//!
//! ```text
//!  DbConfig ──► Database::new ──► SqlitePool ──► migrations
//!                                     │
//!            students() courses() enrollments() stats()
//!                 each repository holds a pool clone
//! ```
//!
//! Every connection is opened with WAL journaling, `foreign_keys = ON`
//! (cascading deletes depend on it) and a busy timeout so a second writer
//! waits for the lock.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::course::CourseRepository;
use crate::repository::enrollment::EnrollmentRepository;
use crate::repository::stats::StatsRepository;
use crate::repository::student::StudentRepository;

/// Where the data lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Storage {
    File(PathBuf),
    /// Private to one connection; gone when the pool closes.
    Memory,
}

impl Storage {
    fn describe(&self) -> String {
        match self {
            Storage::File(path) => path.display().to_string(),
            Storage::Memory => ":memory:".to_string(),
        }
    }
}

/// Pool settings.
///
/// ## Example
/// ```rust
/// use registrar_db::DbConfig;
///
/// let config = DbConfig::new("./data/registrar.db")
///     .max_connections(8)
///     .min_connections(1);
/// assert_eq!(config.max_connections, 8);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub storage: Storage,
    pub max_connections: u32,
    pub min_connections: u32,
    /// How long a request waits for a free connection.
    pub acquire_timeout: Duration,
    /// How long a statement waits on a locked database.
    pub busy_timeout: Duration,
    pub migrate: bool,
}

impl DbConfig {
    /// File-backed database at `path`. The file and its parent directory
    /// are created on connect.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            storage: Storage::File(path.into()),
            max_connections: 5,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(30),
            busy_timeout: Duration::from_secs(5),
            migrate: true,
        }
    }

    /// Fresh isolated database for tests. Limited to one connection since
    /// a second one would open a different database.
    pub fn in_memory() -> Self {
        DbConfig {
            storage: Storage::Memory,
            max_connections: 1,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(5),
            ..DbConfig::new(PathBuf::new())
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    /// Skip migrations on connect, for callers that run them explicitly.
    pub fn run_migrations(mut self, run: bool) -> Self {
        self.migrate = run;
        self
    }

    pub fn is_in_memory(&self) -> bool {
        self.storage == Storage::Memory
    }

    fn connect_options(&self) -> DbResult<SqliteConnectOptions> {
        let base = match &self.storage {
            Storage::Memory => SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?,
            Storage::File(path) => {
                ensure_parent_dir(path)?;
                SqliteConnectOptions::new()
                    .filename(path)
                    .create_if_missing(true)
            }
        };

        Ok(base
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .busy_timeout(self.busy_timeout))
    }

    fn pool_options(&self) -> SqlitePoolOptions {
        let options = SqlitePoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .acquire_timeout(self.acquire_timeout);

        // An in-memory database dies with its connection, so it is never
        // recycled.
        match self.storage {
            Storage::Memory => options.idle_timeout(None::<Duration>).max_lifetime(None::<Duration>),
            Storage::File(_) => options
                .idle_timeout(Duration::from_secs(600))
                .max_lifetime(Duration::from_secs(1800)),
        }
    }
}

fn ensure_parent_dir(path: &Path) -> DbResult<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent)
            .map_err(|e| DbError::ConnectionFailed(format!("{}: {e}", parent.display()))),
        _ => Ok(()),
    }
}

/// Shared handle to the pool. Clones share the pool.
///
/// ```rust,ignore
/// async fn get_student(
///     State(state): State<SharedState>,
///     Path(id): Path<i64>,
/// ) -> ApiResult<Json<StudentWithEnrollments>> {
///     Ok(Json(state.db.students().get_with_enrollments(id).await?))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens the pool and, unless disabled, brings the schema up to date.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        let target = config.storage.describe();
        info!(path = %target, "Opening database");

        let pool = config
            .pool_options()
            .connect_with(config.connect_options()?)
            .await
            .map_err(|e| DbError::ConnectionFailed(format!("{target}: {e}")))?;
        debug!(
            max = config.max_connections,
            min = config.min_connections,
            "Pool ready"
        );

        let db = Database { pool };
        if config.migrate {
            db.run_migrations().await?;
        }
        Ok(db)
    }

    pub async fn run_migrations(&self) -> DbResult<()> {
        migrations::run_migrations(&self.pool).await?;
        info!("Schema up to date");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn students(&self) -> StudentRepository {
        StudentRepository::new(self.pool.clone())
    }

    pub fn courses(&self) -> CourseRepository {
        CourseRepository::new(self.pool.clone())
    }

    pub fn enrollments(&self) -> EnrollmentRepository {
        EnrollmentRepository::new(self.pool.clone())
    }

    pub fn stats(&self) -> StatsRepository {
        StatsRepository::new(self.pool.clone())
    }

    /// Waits for checked-out connections to return, then closes the pool.
    /// Later queries fail.
    pub async fn close(&self) {
        info!("Closing database pool");
        self.pool.close().await;
    }

    /// True when a trivial query round-trips.
    pub async fn health_check(&self) -> bool {
        match sqlx::query_scalar::<_, i64>("SELECT 1").fetch_one(&self.pool).await {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "Database health check failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_database() {
        let config = DbConfig::in_memory();
        assert!(config.is_in_memory());
        assert_eq!(config.max_connections, 1);

        let db = Database::new(config).await.unwrap();
        assert!(db.health_check().await);
    }

    #[tokio::test]
    async fn test_file_database_creates_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("registrar.db");

        let db = Database::new(DbConfig::new(&path)).await.unwrap();
        assert!(db.health_check().await);
        assert!(path.exists());

        db.close().await;
        assert!(!db.health_check().await);
    }

    #[tokio::test]
    async fn test_pragmas_applied() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let foreign_keys: i64 = sqlx::query_scalar("PRAGMA foreign_keys")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(foreign_keys, 1);
    }

    #[test]
    fn test_config_builder() {
        let config = DbConfig::new("/tmp/registrar-test.db")
            .max_connections(10)
            .min_connections(2)
            .run_migrations(false);

        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 2);
        assert!(!config.migrate);
        assert_eq!(config.storage, Storage::File("/tmp/registrar-test.db".into()));
    }
}
