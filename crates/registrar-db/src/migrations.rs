//! Schema migrations, embedded at compile time from `migrations/sqlite/`
//! at the workspace root.
//!
//! Files are named `NNN_description.sql` and applied in order. sqlx records
//! a checksum for each in `_sqlx_migrations`, so an applied file must never
//! be edited; schema changes go in a new file.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Applies whatever is pending. A no-op on an up-to-date database.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    debug!(embedded = MIGRATOR.migrations.len(), "Applying migrations");
    MIGRATOR.run(pool).await?;
    Ok(())
}

/// `(embedded, applied)` migration counts. A database that was never
/// migrated reports zero applied.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let embedded = MIGRATOR.migrations.len();
    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
        .fetch_one(pool)
        .await
        .unwrap_or(0);

    Ok((embedded, usize::try_from(applied).unwrap_or(0)))
}

#[cfg(test)]
mod tests {
    use crate::{Database, DbConfig};

    #[tokio::test]
    async fn test_all_migrations_applied() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let (embedded, applied) = super::migration_status(db.pool()).await.unwrap();
        assert!(embedded > 0);
        assert_eq!(embedded, applied);

        // Second run changes nothing
        db.run_migrations().await.unwrap();
        assert_eq!(super::migration_status(db.pool()).await.unwrap(), (embedded, applied));
    }

    #[tokio::test]
    async fn test_unmigrated_database_reports_zero() {
        let db = Database::new(DbConfig::in_memory().run_migrations(false))
            .await
            .unwrap();
        let (_, applied) = super::migration_status(db.pool()).await.unwrap();
        assert_eq!(applied, 0);
    }
}
