//! Visitor sighting reports

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};

use super::{ensure_exists, DbError};
use crate::models::{Coordinates, Paginated, Pagination};

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Sighting {
    pub id: i64,
    pub park_id: i64,
    pub species_id: i64,
    pub reporter_name: String,
    pub sighting_date: NaiveDate,
    pub location_lat: f64,
    pub location_lng: f64,
    pub photo_url: Option<String>,
    pub notes: Option<String>,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewSighting {
    pub park_id: i64,
    pub species_id: i64,
    pub reporter_name: String,
    pub sighting_date: NaiveDate,
    pub location: Coordinates,
    pub photo_url: Option<String>,
    pub notes: Option<String>,
}

/// Listing filters, combined with AND
#[derive(Debug, Clone, Default)]
pub struct SightingFilter {
    pub park_id: Option<i64>,
    pub species_id: Option<i64>,
    pub verified: Option<bool>,
}

impl SightingFilter {
    fn push_where(&self, builder: &mut QueryBuilder<'_, Sqlite>) {
        if let Some(park_id) = self.park_id {
            builder.push(" AND park_id = ");
            builder.push_bind(park_id);
        }
        if let Some(species_id) = self.species_id {
            builder.push(" AND species_id = ");
            builder.push_bind(species_id);
        }
        if let Some(verified) = self.verified {
            builder.push(" AND verified = ");
            builder.push_bind(verified);
        }
    }
}

pub struct SightingRepo<'a> {
    pool: &'a SqlitePool,
}

impl<'a> SightingRepo<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Most recent sighting date first.
    pub async fn list(
        &self,
        filter: &SightingFilter,
        page: Pagination,
    ) -> Result<Paginated<Sighting>, DbError> {
        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM sightings WHERE 1=1");
        filter.push_where(&mut count);
        let (total,): (i64,) = count.build_query_as().fetch_one(self.pool).await?;

        let mut builder = QueryBuilder::<Sqlite>::new("SELECT * FROM sightings WHERE 1=1");
        filter.push_where(&mut builder);
        builder.push(" ORDER BY sighting_date DESC, id DESC LIMIT ");
        builder.push_bind(page.limit());
        builder.push(" OFFSET ");
        builder.push_bind(page.offset());
        let items = builder.build_query_as::<Sighting>().fetch_all(self.pool).await?;

        Ok(Paginated::new(items, total, page))
    }

    /// Record an unverified sighting. Park and species must both exist.
    pub async fn create(&self, new: NewSighting) -> Result<Sighting, DbError> {
        let mut tx = self.pool.begin().await?;
        ensure_exists(&mut tx, "parks", "park", new.park_id).await?;
        ensure_exists(&mut tx, "species", "species", new.species_id).await?;

        let sighting = sqlx::query_as::<_, Sighting>(
            r#"
            INSERT INTO sightings (
                park_id, species_id, reporter_name, sighting_date, location_lat,
                location_lng, photo_url, notes, verified, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, 0, ?)
            RETURNING *
            "#,
        )
        .bind(new.park_id)
        .bind(new.species_id)
        .bind(new.reporter_name)
        .bind(new.sighting_date)
        .bind(new.location.latitude)
        .bind(new.location.longitude)
        .bind(new.photo_url)
        .bind(new.notes)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        tracing::info!(
            sighting_id = sighting.id,
            park_id = sighting.park_id,
            species_id = sighting.species_id,
            "Recorded sighting"
        );
        Ok(sighting)
    }

    pub async fn verify(&self, id: i64) -> Result<Sighting, DbError> {
        sqlx::query_as::<_, Sighting>("UPDATE sightings SET verified = 1 WHERE id = ? RETURNING *")
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("sighting", id))
    }

    pub async fn delete(&self, id: i64) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM sightings WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::not_found("sighting", id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::pool::create_memory_pool;
    use crate::db::repos::parks::tests::insert_park;
    use crate::db::repos::species::tests::gazelle;
    use crate::db::repos::SpeciesRepo;

    fn report(park_id: i64, species_id: i64, day: u32) -> NewSighting {
        NewSighting {
            park_id,
            species_id,
            reporter_name: "Youssef".into(),
            sighting_date: NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
            location: Coordinates::new(35.2, 8.7).unwrap(),
            photo_url: None,
            notes: Some("Deux individus près du point d'eau".into()),
        }
    }

    #[tokio::test]
    async fn create_checks_both_owners() {
        let pool = create_memory_pool().await.unwrap();
        let park_id = insert_park(&pool, "Chaambi").await;
        let repo = SightingRepo::new(&pool);

        let err = repo.create(report(park_id, 77, 1)).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { resource: "species", .. }));
    }

    #[tokio::test]
    async fn verify_and_filter() {
        let pool = create_memory_pool().await.unwrap();
        let park_id = insert_park(&pool, "Chaambi").await;
        let species = SpeciesRepo::new(&pool).create(gazelle(), &[park_id]).await.unwrap();
        let repo = SightingRepo::new(&pool);

        let first = repo.create(report(park_id, species.species.id, 1)).await.unwrap();
        repo.create(report(park_id, species.species.id, 9)).await.unwrap();
        assert!(!first.verified);

        let verified = repo.verify(first.id).await.unwrap();
        assert!(verified.verified);

        let filter = SightingFilter {
            verified: Some(false),
            ..Default::default()
        };
        let page = repo.list(&filter, Pagination::default()).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].sighting_date.to_string(), "2024-05-09");

        let all = repo
            .list(&SightingFilter::default(), Pagination::default())
            .await
            .unwrap();
        assert_eq!(all.items.len(), 2);
    }
}
