/// Database layer for the moderation service
///
/// Manages the SQLite connection pool, embedded migrations, and typed
/// access to the catalog rows (distros, projects, versions, packages).

pub mod catalog;
pub mod models;

use crate::error::{RelmonError, RelmonResult};
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{Sqlite, SqlitePool};
use sqlx::Transaction;
use std::path::Path;

/// Database connection options
#[derive(Debug, Clone)]
pub struct DatabaseOptions {
    pub max_connections: u32,
    pub enable_wal: bool,
}

impl Default for DatabaseOptions {
    fn default() -> Self {
        Self {
            max_connections: 10,
            enable_wal: true,
        }
    }
}

/// Create a SQLite connection pool
pub async fn create_pool(path: &Path, options: DatabaseOptions) -> RelmonResult<SqlitePool> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(options.max_connections)
        .connect_with(
            sqlx::sqlite::SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
                .journal_mode(if options.enable_wal {
                    sqlx::sqlite::SqliteJournalMode::Wal
                } else {
                    sqlx::sqlite::SqliteJournalMode::Delete
                })
                .foreign_keys(true)
                .busy_timeout(std::time::Duration::from_secs(5)),
        )
        .await?;

    Ok(pool)
}

/// Run migrations for a database
/// Migrations are embedded at compile time from ./migrations directory
pub async fn run_migrations(pool: &SqlitePool) -> RelmonResult<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| RelmonError::Internal(format!("Migration failed: {}", e)))?;

    Ok(())
}

/// Begin a transaction that takes the write lock up front.
///
/// A deferred transaction that reads and then writes can fail with
/// `SQLITE_BUSY_SNAPSHOT` under WAL without honoring the busy timeout;
/// `BEGIN IMMEDIATE` waits for the lock instead.
pub async fn begin_write(pool: &SqlitePool) -> RelmonResult<Transaction<'static, Sqlite>> {
    let tx = pool.begin_with("BEGIN IMMEDIATE").await?;
    Ok(tx)
}

/// Test database connection
pub async fn test_connection(pool: &SqlitePool) -> RelmonResult<()> {
    sqlx::query("SELECT 1").execute(pool).await?;

    Ok(())
}

/// Timestamp format stored in TEXT columns.
///
/// Fixed-width UTC so lexical order matches chronological order and the
/// first ten characters are the calendar date.
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp column
pub fn parse_timestamp(s: &str) -> RelmonResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RelmonError::Internal(format!("Invalid timestamp '{}': {}", s, e)))
}
