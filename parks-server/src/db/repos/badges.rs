//! Badge repository

use serde::Serialize;
use sqlx::{FromRow, SqlitePool};

use super::DbError;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Badge {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub requirement: String,
    pub points: i64,
}

#[derive(Debug, Clone)]
pub struct NewBadge {
    pub name: String,
    pub description: String,
    pub icon: String,
    pub requirement: String,
    pub points: i64,
}

pub struct BadgeRepo<'a> {
    pool: &'a SqlitePool,
}

impl<'a> BadgeRepo<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// All badges, cheapest first.
    pub async fn list(&self) -> Result<Vec<Badge>, DbError> {
        let badges = sqlx::query_as::<_, Badge>("SELECT * FROM badges ORDER BY points, name")
            .fetch_all(self.pool)
            .await?;
        Ok(badges)
    }

    /// Conflict if a badge with the same name exists.
    pub async fn create(&self, new: NewBadge) -> Result<Badge, DbError> {
        sqlx::query_as::<_, Badge>(
            r#"
            INSERT INTO badges (name, description, icon, requirement, points)
            VALUES (?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&new.name)
        .bind(new.description)
        .bind(new.icon)
        .bind(new.requirement)
        .bind(new.points)
        .fetch_one(self.pool)
        .await
        .map_err(|e| DbError::unique_or("badge", &format!("name '{}' already exists", new.name), e))
    }

    pub async fn delete(&self, id: i64) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM badges WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::not_found("badge", id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::pool::create_memory_pool;

    fn explorateur() -> NewBadge {
        NewBadge {
            name: "Explorateur".into(),
            description: "Visiter trois parcs".into(),
            icon: "compass".into(),
            requirement: "visit_3_parks".into(),
            points: 50,
        }
    }

    #[tokio::test]
    async fn duplicate_name_is_conflict() {
        let pool = create_memory_pool().await.unwrap();
        let repo = BadgeRepo::new(&pool);
        repo.create(explorateur()).await.unwrap();

        let err = repo.create(explorateur()).await.unwrap_err();
        assert!(matches!(err, DbError::Conflict { resource: "badge", .. }));
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_missing_badge() {
        let pool = create_memory_pool().await.unwrap();
        assert!(matches!(
            BadgeRepo::new(&pool).delete(3).await.unwrap_err(),
            DbError::NotFound { .. }
        ));
    }
}
