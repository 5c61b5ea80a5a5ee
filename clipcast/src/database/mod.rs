//! Database module for clipcast.
//!
//! SQLite via sqlx holds the client-local session state. Publish records
//! are not stored here; they go to the internal persistence endpoint.

use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;
use std::time::Duration;

/// Database connection pool type alias.
pub type DbPool = Pool<Sqlite>;

/// Default connection pool size.
const DEFAULT_POOL_SIZE: u32 = 5;

/// Default busy timeout in milliseconds.
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 30_000;

const CREATE_SESSIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS sessions (
    provider        TEXT PRIMARY KEY,
    credential      TEXT,
    profile         TEXT,
    validated_at    INTEGER
)
"#;

/// Initialize the database connection pool with WAL mode.
pub async fn init_pool(database_url: &str) -> crate::Result<DbPool> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(DEFAULT_POOL_SIZE)
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// Create the schema if it does not exist yet.
pub async fn run_migrations(pool: &DbPool) -> crate::Result<()> {
    sqlx::query(CREATE_SESSIONS_TABLE).execute(pool).await?;
    Ok(())
}
