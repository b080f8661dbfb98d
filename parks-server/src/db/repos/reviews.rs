//! Review repository
//!
//! Writes keep `parks.average_rating` and `parks.total_reviews` in step with
//! the review rows, inside the same transaction.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::{FromRow, SqliteConnection, SqlitePool};

use super::{ensure_exists, DbError};
use crate::models::{Paginated, Pagination, Rating};

/// Review record from database
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Review {
    pub id: i64,
    pub park_id: i64,
    pub author_name: String,
    pub rating: i64,
    pub title: String,
    pub comment: String,
    pub visit_date: Option<NaiveDate>,
    pub helpful_count: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub author_name: String,
    pub rating: Rating,
    pub title: String,
    pub comment: String,
    pub visit_date: Option<NaiveDate>,
}

pub struct ReviewRepo<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ReviewRepo<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Newest first. NotFound if the park is missing.
    pub async fn list_for_park(
        &self,
        park_id: i64,
        page: Pagination,
    ) -> Result<Paginated<Review>, DbError> {
        let mut conn = self.pool.acquire().await?;
        ensure_exists(&mut conn, "parks", "park", park_id).await?;

        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM reviews WHERE park_id = ?")
            .bind(park_id)
            .fetch_one(&mut *conn)
            .await?;
        let items = sqlx::query_as::<_, Review>(
            r#"
            SELECT * FROM reviews
            WHERE park_id = ?
            ORDER BY created_at DESC, id DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(park_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&mut *conn)
        .await?;

        Ok(Paginated::new(items, total, page))
    }

    pub async fn create(&self, park_id: i64, new: NewReview) -> Result<Review, DbError> {
        let mut tx = self.pool.begin().await?;
        ensure_exists(&mut tx, "parks", "park", park_id).await?;

        let review = sqlx::query_as::<_, Review>(
            r#"
            INSERT INTO reviews (park_id, author_name, rating, title, comment, visit_date, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(park_id)
        .bind(new.author_name)
        .bind(new.rating.get())
        .bind(new.title)
        .bind(new.comment)
        .bind(new.visit_date)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        refresh_park_rating(&mut tx, park_id).await?;
        tx.commit().await?;

        tracing::info!(review_id = review.id, park_id, rating = review.rating, "Created review");
        Ok(review)
    }

    pub async fn delete(&self, id: i64) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;
        let row: Option<(i64,)> = sqlx::query_as("DELETE FROM reviews WHERE id = ? RETURNING park_id")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        let (park_id,) = row.ok_or_else(|| DbError::not_found("review", id))?;

        refresh_park_rating(&mut tx, park_id).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Increment the helpful counter. Returns the updated review.
    pub async fn mark_helpful(&self, id: i64) -> Result<Review, DbError> {
        sqlx::query_as::<_, Review>(
            "UPDATE reviews SET helpful_count = helpful_count + 1 WHERE id = ? RETURNING *",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("review", id))
    }
}

/// Recompute a park's rating aggregate from its reviews.
///
/// Average is rounded to one decimal, NULL when the park has no reviews.
async fn refresh_park_rating(conn: &mut SqliteConnection, park_id: i64) -> Result<(), DbError> {
    sqlx::query(
        r#"
        UPDATE parks SET
            average_rating = (SELECT ROUND(AVG(rating), 1) FROM reviews WHERE park_id = ?),
            total_reviews = (SELECT COUNT(*) FROM reviews WHERE park_id = ?)
        WHERE id = ?
        "#,
    )
    .bind(park_id)
    .bind(park_id)
    .bind(park_id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}
