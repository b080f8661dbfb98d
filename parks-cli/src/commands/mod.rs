//! Command implementations for parksctl

pub mod hash_password;
pub mod migrate;
pub mod seed;
pub mod serve;

pub use hash_password::run_hash_password;
pub use migrate::run_migrate;
pub use seed::run_seed;
pub use serve::run_serve;

use anyhow::{Context, Result};
use parks_server::config::DEFAULT_DATABASE_URL;
use parks_server::db::migrations;
use sqlx::SqlitePool;

/// Open the database and bring the schema up to date.
pub(crate) async fn open_database(database_url: Option<String>) -> Result<SqlitePool> {
    let url = database_url.unwrap_or_else(|| DEFAULT_DATABASE_URL.to_owned());
    let pool = parks_server::create_pool(&url)
        .await
        .with_context(|| format!("Failed to open database {url}"))?;
    migrations::run(&pool)
        .await
        .context("Failed to apply database schema")?;
    Ok(pool)
}
