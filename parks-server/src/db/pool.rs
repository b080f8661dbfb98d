//! SQLite connection pool management

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};

/// Kept low: SQLite serialises writers anyway.
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Open (creating if missing) the database at `database_url`.
///
/// # Example
///
/// ```ignore
/// let pool = create_pool("sqlite://tunisia_parks.db").await?;
/// ```
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    create_pool_with_options(database_url, DEFAULT_MAX_CONNECTIONS).await
}

pub async fn create_pool_with_options(
    database_url: &str,
    max_connections: u32,
) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5))
        .synchronous(SqliteSynchronous::Normal)
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
}

/// Private in-memory database with the schema applied.
///
/// A single connection is used because every SQLite in-memory connection
/// is its own database.
pub async fn create_memory_pool() -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;
    super::migrations::run(&pool).await?;
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_pool_answers_queries() {
        let pool = create_memory_pool().await.expect("pool creation failed");
        let (one,): (i64,) = sqlx::query_as("SELECT 1")
            .fetch_one(&pool)
            .await
            .expect("query failed");
        assert_eq!(one, 1);
    }

    #[tokio::test]
    async fn file_pool_creates_database() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("parks.db").display());
        let pool = create_pool(&url).await.expect("pool creation failed");
        super::super::migrations::run(&pool).await.unwrap();
        assert!(dir.path().join("parks.db").exists());
    }
}
