//! Schema setup
//!
//! The schema is idempotent (`IF NOT EXISTS` everywhere), so it is simply
//! replayed on every start.

use sqlx::SqlitePool;

const SCHEMA: &str = include_str!("schema.sql");

pub async fn run(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    tracing::debug!("Applying database schema");
    sqlx::raw_sql(SCHEMA).execute(pool).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::pool::create_memory_pool;

    #[tokio::test]
    async fn schema_is_idempotent() {
        let pool = create_memory_pool().await.unwrap();
        run(&pool).await.expect("second run should be a no-op");

        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .unwrap();
        let names: Vec<_> = tables.into_iter().map(|(n,)| n).collect();
        assert_eq!(
            names,
            ["badges", "park_species", "parks", "reviews", "sightings", "species", "trails"]
        );
    }
}
