pub mod migrate;
pub mod repo;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    /// A uniqueness rule the schema alone cannot express cleanly, e.g. a show
    /// whose `(title, path)` already belongs to another catalog id.
    #[error("conflict: {0}")]
    Conflict(String),
}

/// Create a SQLite connection pool with WAL mode and foreign keys enabled.
pub async fn connect(db_path: &str) -> Result<SqlitePool, sqlx::Error> {
    // Ensure parent directory exists
    if let Some(parent) = Path::new(db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).ok();
        }
    }

    let opts = SqliteConnectOptions::from_str(db_path)?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .foreign_keys(true);

    // Every connection to `:memory:` is its own database, so tests get one
    // connection that is never recycled.
    let pool = if db_path == ":memory:" {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(opts)
            .await?
    } else {
        SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await?
    };

    Ok(pool)
}

/// Current wall-clock time as stored in `*_ts` columns.
pub(crate) fn now_ts() -> i64 {
    chrono::Utc::now().timestamp()
}
