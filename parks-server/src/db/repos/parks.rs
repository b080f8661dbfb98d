//! Park repository
//!
//! Parks own trails, reviews and sightings, and take part in species
//! links. Deleting a park removes all of those in one transaction.

use serde::Serialize;
use sqlx::types::Json;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};

use super::{links, DbError};
use crate::models::{Coordinates, Difficulty, Paginated, Pagination};

/// Park record from database
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Park {
    pub id: i64,
    pub name: String,
    pub governorate: String,
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
    pub area_km2: Option<f64>,
    /// Stored upload filenames
    pub images: Json<Vec<String>>,
    pub google_maps_url: Option<String>,
    pub hero_image_url: Option<String>,
    pub gallery_images: Json<Vec<String>>,
    pub difficulty_level: Option<Difficulty>,
    pub accessibility: Json<Vec<String>>,
    pub best_months: Json<Vec<String>>,
    pub activities: Json<Vec<String>>,
    pub facilities: Json<Vec<String>>,
    pub entrance_fee: Option<String>,
    pub opening_hours: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
    pub area_hectares: Option<i64>,
    pub elevation_min: Option<i64>,
    pub elevation_max: Option<i64>,
    pub visitor_count_yearly: Option<i64>,
    pub average_rating: Option<f64>,
    pub total_reviews: i64,
}

impl Park {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

/// Practical and descriptive attributes shared by create and update
#[derive(Debug, Clone, Default)]
pub struct ParkDetails {
    pub area_km2: Option<f64>,
    pub google_maps_url: Option<String>,
    pub hero_image_url: Option<String>,
    pub gallery_images: Option<Vec<String>>,
    pub difficulty_level: Option<Difficulty>,
    pub accessibility: Option<Vec<String>>,
    pub best_months: Option<Vec<String>>,
    pub activities: Option<Vec<String>>,
    pub facilities: Option<Vec<String>>,
    pub entrance_fee: Option<String>,
    pub opening_hours: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
    pub area_hectares: Option<i64>,
    pub elevation_min: Option<i64>,
    pub elevation_max: Option<i64>,
    pub visitor_count_yearly: Option<i64>,
}

/// Validated input for a new park
#[derive(Debug, Clone)]
pub struct NewPark {
    pub name: String,
    pub governorate: String,
    pub description: String,
    pub coordinates: Coordinates,
    pub details: ParkDetails,
}

/// Partial update. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct ParkPatch {
    pub name: Option<String>,
    pub governorate: Option<String>,
    pub description: Option<String>,
    pub coordinates: Option<Coordinates>,
    pub details: ParkDetails,
}

/// Listing filters, combined with AND
#[derive(Debug, Clone, Default)]
pub struct ParkFilter {
    /// Exact governorate, case-insensitive
    pub governorate: Option<String>,
    /// Substring of name or description, ASCII case-insensitive
    pub search: Option<String>,
}

/// Park repository
pub struct ParkRepo<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ParkRepo<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, new: NewPark) -> Result<Park, DbError> {
        let d = new.details;
        let park = sqlx::query_as::<_, Park>(
            r#"
            INSERT INTO parks (
                name, governorate, description, latitude, longitude, area_km2,
                google_maps_url, hero_image_url, gallery_images, difficulty_level,
                accessibility, best_months, activities, facilities, entrance_fee,
                opening_hours, contact_phone, contact_email, area_hectares,
                elevation_min, elevation_max, visitor_count_yearly
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&new.name)
        .bind(&new.governorate)
        .bind(&new.description)
        .bind(new.coordinates.latitude)
        .bind(new.coordinates.longitude)
        .bind(d.area_km2)
        .bind(d.google_maps_url)
        .bind(d.hero_image_url)
        .bind(Json(d.gallery_images.unwrap_or_default()))
        .bind(d.difficulty_level)
        .bind(Json(d.accessibility.unwrap_or_default()))
        .bind(Json(d.best_months.unwrap_or_default()))
        .bind(Json(d.activities.unwrap_or_default()))
        .bind(Json(d.facilities.unwrap_or_default()))
        .bind(d.entrance_fee)
        .bind(d.opening_hours)
        .bind(d.contact_phone)
        .bind(d.contact_email)
        .bind(d.area_hectares)
        .bind(d.elevation_min)
        .bind(d.elevation_max)
        .bind(d.visitor_count_yearly)
        .fetch_one(self.pool)
        .await?;

        tracing::info!(park_id = park.id, name = %park.name, "Created park");
        Ok(park)
    }

    pub async fn get(&self, id: i64) -> Result<Park, DbError> {
        sqlx::query_as::<_, Park>("SELECT * FROM parks WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("park", id))
    }

    /// Paginated listing ordered by name.
    pub async fn list(&self, filter: &ParkFilter, page: Pagination) -> Result<Paginated<Park>, DbError> {
        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM parks WHERE 1=1");
        push_filters(&mut count, filter);
        let (total,): (i64,) = count.build_query_as().fetch_one(self.pool).await?;

        let mut builder = QueryBuilder::<Sqlite>::new("SELECT * FROM parks WHERE 1=1");
        push_filters(&mut builder, filter);
        builder.push(" ORDER BY name, id LIMIT ");
        builder.push_bind(page.limit());
        builder.push(" OFFSET ");
        builder.push_bind(page.offset());
        let items = builder.build_query_as::<Park>().fetch_all(self.pool).await?;

        Ok(Paginated::new(items, total, page))
    }

    pub async fn update(&self, id: i64, patch: ParkPatch) -> Result<Park, DbError> {
        let d = patch.details;
        sqlx::query_as::<_, Park>(
            r#"
            UPDATE parks SET
                name = COALESCE(?, name),
                governorate = COALESCE(?, governorate),
                description = COALESCE(?, description),
                latitude = COALESCE(?, latitude),
                longitude = COALESCE(?, longitude),
                area_km2 = COALESCE(?, area_km2),
                google_maps_url = COALESCE(?, google_maps_url),
                hero_image_url = COALESCE(?, hero_image_url),
                gallery_images = COALESCE(?, gallery_images),
                difficulty_level = COALESCE(?, difficulty_level),
                accessibility = COALESCE(?, accessibility),
                best_months = COALESCE(?, best_months),
                activities = COALESCE(?, activities),
                facilities = COALESCE(?, facilities),
                entrance_fee = COALESCE(?, entrance_fee),
                opening_hours = COALESCE(?, opening_hours),
                contact_phone = COALESCE(?, contact_phone),
                contact_email = COALESCE(?, contact_email),
                area_hectares = COALESCE(?, area_hectares),
                elevation_min = COALESCE(?, elevation_min),
                elevation_max = COALESCE(?, elevation_max),
                visitor_count_yearly = COALESCE(?, visitor_count_yearly)
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(patch.name)
        .bind(patch.governorate)
        .bind(patch.description)
        .bind(patch.coordinates.map(|c| c.latitude))
        .bind(patch.coordinates.map(|c| c.longitude))
        .bind(d.area_km2)
        .bind(d.google_maps_url)
        .bind(d.hero_image_url)
        .bind(d.gallery_images.map(Json))
        .bind(d.difficulty_level)
        .bind(d.accessibility.map(Json))
        .bind(d.best_months.map(Json))
        .bind(d.activities.map(Json))
        .bind(d.facilities.map(Json))
        .bind(d.entrance_fee)
        .bind(d.opening_hours)
        .bind(d.contact_phone)
        .bind(d.contact_email)
        .bind(d.area_hectares)
        .bind(d.elevation_min)
        .bind(d.elevation_max)
        .bind(d.visitor_count_yearly)
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("park", id))
    }

    /// Append an uploaded image filename.
    pub async fn add_image(&self, id: i64, filename: &str) -> Result<Park, DbError> {
        let mut tx = self.pool.begin().await?;
        let mut images = fetch_images(&mut tx, id).await?;
        images.push(filename.to_owned());

        let park = store_images(&mut tx, id, images).await?;
        tx.commit().await?;
        Ok(park)
    }

    /// Drop an image filename from the park. NotFound if it is not listed.
    pub async fn remove_image(&self, id: i64, filename: &str) -> Result<Park, DbError> {
        let mut tx = self.pool.begin().await?;
        let mut images = fetch_images(&mut tx, id).await?;
        let before = images.len();
        images.retain(|f| f != filename);
        if images.len() == before {
            return Err(DbError::not_found("park image", filename));
        }

        let park = store_images(&mut tx, id, images).await?;
        tx.commit().await?;
        Ok(park)
    }

    /// Delete a park together with its links, trails, reviews and sightings.
    ///
    /// Returns the deleted record so callers can remove stored images.
    pub async fn delete(&self, id: i64) -> Result<Park, DbError> {
        let mut tx = self.pool.begin().await?;
        let park = sqlx::query_as::<_, Park>("SELECT * FROM parks WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::not_found("park", id))?;

        let links_removed = links::unlink_park(&mut tx, id).await?;
        for table in ["trails", "reviews", "sightings"] {
            sqlx::query(&format!("DELETE FROM {table} WHERE park_id = ?"))
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }
        sqlx::query("DELETE FROM parks WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::info!(park_id = id, links_removed, "Deleted park");
        Ok(park)
    }
}

fn push_filters(builder: &mut QueryBuilder<'_, Sqlite>, filter: &ParkFilter) {
    if let Some(governorate) = filter.governorate.as_deref() {
        builder.push(" AND LOWER(governorate) = ");
        builder.push_bind(governorate.trim().to_ascii_lowercase());
    }
    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = super::contains_pattern(search);
        builder.push(" AND (LOWER(name) LIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" ESCAPE '\\' OR LOWER(description) LIKE ");
        builder.push_bind(pattern);
        builder.push(" ESCAPE '\\')");
    }
}

async fn fetch_images(conn: &mut sqlx::SqliteConnection, id: i64) -> Result<Vec<String>, DbError> {
    let row: Option<(Json<Vec<String>>,)> = sqlx::query_as("SELECT images FROM parks WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    row.map(|(Json(images),)| images)
        .ok_or_else(|| DbError::not_found("park", id))
}

async fn store_images(
    conn: &mut sqlx::SqliteConnection,
    id: i64,
    images: Vec<String>,
) -> Result<Park, DbError> {
    let park = sqlx::query_as::<_, Park>("UPDATE parks SET images = ? WHERE id = ? RETURNING *")
        .bind(Json(images))
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;
    Ok(park)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::db::pool::create_memory_pool;

    pub(crate) fn new_park(name: &str) -> NewPark {
        NewPark {
            name: name.to_owned(),
            governorate: "Bizerte".into(),
            description: format!("Parc national de {name}"),
            coordinates: Coordinates::new(37.16, 9.67).unwrap(),
            details: ParkDetails::default(),
        }
    }

    pub(crate) async fn insert_park(pool: &SqlitePool, name: &str) -> i64 {
        ParkRepo::new(pool).create(new_park(name)).await.unwrap().id
    }

    #[tokio::test]
    async fn create_and_get() {
        let pool = create_memory_pool().await.unwrap();
        let repo = ParkRepo::new(&pool);
        let created = repo.create(new_park("Ichkeul")).await.unwrap();

        let fetched = repo.get(created.id).await.unwrap();
        assert_eq!(fetched.name, "Ichkeul");
        assert_eq!(fetched.total_reviews, 0);
        assert!(fetched.images.0.is_empty());
    }

    #[tokio::test]
    async fn list_filters_and_paginates() {
        let pool = create_memory_pool().await.unwrap();
        let repo = ParkRepo::new(&pool);
        for name in ["Zaghouan", "Ichkeul", "Boukornine"] {
            repo.create(new_park(name)).await.unwrap();
        }
        let mut chaambi = new_park("Chaambi");
        chaambi.governorate = "Kasserine".into();
        repo.create(chaambi).await.unwrap();

        let page = repo
            .list(&ParkFilter::default(), Pagination::new(1, 2))
            .await
            .unwrap();
        assert_eq!(page.total, 4);
        let names: Vec<_> = page.items.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Boukornine", "Chaambi"]);

        let filtered = repo
            .list(
                &ParkFilter {
                    governorate: Some("kasserine".into()),
                    ..Default::default()
                },
                Pagination::default(),
            )
            .await
            .unwrap();
        assert_eq!(filtered.total, 1);
        assert_eq!(filtered.items[0].name, "Chaambi");
    }

    #[tokio::test]
    async fn update_is_partial() {
        let pool = create_memory_pool().await.unwrap();
        let repo = ParkRepo::new(&pool);
        let id = insert_park(&pool, "Ichkeul").await;

        let patch = ParkPatch {
            details: ParkDetails {
                opening_hours: Some("7h00 - 18h00".into()),
                activities: Some(vec!["birdwatching".into()]),
                ..Default::default()
            },
            ..Default::default()
        };
        let updated = repo.update(id, patch).await.unwrap();
        assert_eq!(updated.name, "Ichkeul");
        assert_eq!(updated.opening_hours.as_deref(), Some("7h00 - 18h00"));
        assert_eq!(updated.activities.0, vec!["birdwatching".to_string()]);
    }

    #[tokio::test]
    async fn images_append_and_remove() {
        let pool = create_memory_pool().await.unwrap();
        let repo = ParkRepo::new(&pool);
        let id = insert_park(&pool, "El Feija").await;

        repo.add_image(id, "a.jpg").await.unwrap();
        let park = repo.add_image(id, "b.png").await.unwrap();
        assert_eq!(park.images.0, vec!["a.jpg".to_string(), "b.png".to_string()]);

        let park = repo.remove_image(id, "a.jpg").await.unwrap();
        assert_eq!(park.images.0, vec!["b.png".to_string()]);

        let err = repo.remove_image(id, "a.jpg").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn delete_missing_park_is_not_found() {
        let pool = create_memory_pool().await.unwrap();
        let err = ParkRepo::new(&pool).delete(7).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { resource: "park", .. }));
    }
}
