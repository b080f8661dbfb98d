//! Species repository
//!
//! Species rows and their park links are written in one transaction; the
//! link work itself is delegated to [`super::links`].

use serde::Serialize;
use sqlx::types::Json;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};

use super::{links, DbError};
use crate::models::SpeciesType;

/// Species record from database
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Species {
    pub id: i64,
    pub name: String,
    pub scientific_name: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub species_type: SpeciesType,
    pub description: String,
    pub threats: Option<String>,
    pub protection_measures: Option<String>,
    pub safety_guidelines: Option<String>,
    pub medicinal_use: Option<String>,
    pub toxicity_level: Option<String>,
    pub image_url: Option<String>,
    pub gallery_images: Json<Vec<String>>,
    pub audio_url: Option<String>,
    pub video_url: Option<String>,
    pub conservation_status: Option<String>,
    pub habitat_type: Option<String>,
    pub diet: Option<String>,
    pub lifespan: Option<String>,
    pub size: Option<String>,
    pub weight: Option<String>,
    pub best_viewing_months: Json<Vec<String>>,
    pub activity_time: Option<String>,
    pub rarity: Option<String>,
}

/// Species plus the ids of the parks it is linked to
#[derive(Debug, Clone, Serialize)]
pub struct SpeciesWithParks {
    #[serde(flatten)]
    pub species: Species,
    pub park_ids: Vec<i64>,
}

/// Descriptive attributes shared by create and update
#[derive(Debug, Clone, Default)]
pub struct SpeciesDetails {
    pub threats: Option<String>,
    pub protection_measures: Option<String>,
    pub safety_guidelines: Option<String>,
    pub medicinal_use: Option<String>,
    pub toxicity_level: Option<String>,
    pub gallery_images: Option<Vec<String>>,
    pub audio_url: Option<String>,
    pub video_url: Option<String>,
    pub conservation_status: Option<String>,
    pub habitat_type: Option<String>,
    pub diet: Option<String>,
    pub lifespan: Option<String>,
    pub size: Option<String>,
    pub weight: Option<String>,
    pub best_viewing_months: Option<Vec<String>>,
    pub activity_time: Option<String>,
    pub rarity: Option<String>,
}

/// Validated input for a new species
#[derive(Debug, Clone)]
pub struct NewSpecies {
    pub name: String,
    pub scientific_name: String,
    pub species_type: SpeciesType,
    pub description: String,
    pub image_url: Option<String>,
    pub details: SpeciesDetails,
}

/// Partial update. `None` keeps the stored value.
///
/// `park_ids: Some(ids)` is a full replace of the species' park list;
/// `Some(vec![])` unlinks it from every park.
#[derive(Debug, Clone, Default)]
pub struct SpeciesPatch {
    pub name: Option<String>,
    pub scientific_name: Option<String>,
    pub species_type: Option<SpeciesType>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub details: SpeciesDetails,
    pub park_ids: Option<Vec<i64>>,
}

/// Listing filters, combined with AND
#[derive(Debug, Clone, Default)]
pub struct SpeciesFilter {
    pub species_type: Option<SpeciesType>,
    pub park_id: Option<i64>,
    /// Substring of name or scientific name, ASCII case-insensitive
    pub search: Option<String>,
}

/// Species repository
pub struct SpeciesRepo<'a> {
    pool: &'a SqlitePool,
}

impl<'a> SpeciesRepo<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a species and link it to the existing parks among `park_ids`.
    pub async fn create(
        &self,
        new: NewSpecies,
        park_ids: &[i64],
    ) -> Result<SpeciesWithParks, DbError> {
        let mut tx = self.pool.begin().await?;
        let d = new.details;

        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO species (
                name, scientific_name, type, description, image_url,
                threats, protection_measures, safety_guidelines, medicinal_use, toxicity_level,
                gallery_images, audio_url, video_url, conservation_status, habitat_type,
                diet, lifespan, size, weight, best_viewing_months, activity_time, rarity
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&new.name)
        .bind(&new.scientific_name)
        .bind(new.species_type)
        .bind(&new.description)
        .bind(&new.image_url)
        .bind(d.threats)
        .bind(d.protection_measures)
        .bind(d.safety_guidelines)
        .bind(d.medicinal_use)
        .bind(d.toxicity_level)
        .bind(Json(d.gallery_images.unwrap_or_default()))
        .bind(d.audio_url)
        .bind(d.video_url)
        .bind(d.conservation_status)
        .bind(d.habitat_type)
        .bind(d.diet)
        .bind(d.lifespan)
        .bind(d.size)
        .bind(d.weight)
        .bind(Json(d.best_viewing_months.unwrap_or_default()))
        .bind(d.activity_time)
        .bind(d.rarity)
        .fetch_one(&mut *tx)
        .await?;

        let park_ids = links::link_new_species(&mut tx, id, park_ids).await?;
        let species = fetch(&mut tx, id).await?;
        tx.commit().await?;

        tracing::info!(species_id = id, ?park_ids, "Created species");
        Ok(SpeciesWithParks { species, park_ids })
    }

    /// Get a single species with its park ids.
    pub async fn get(&self, id: i64) -> Result<SpeciesWithParks, DbError> {
        let mut conn = self.pool.acquire().await?;
        let species = fetch(&mut conn, id).await?;
        let park_ids = links::park_ids_of(&mut conn, id).await?.into_iter().collect();
        Ok(SpeciesWithParks { species, park_ids })
    }

    /// Filtered listing, ordered by name.
    ///
    /// The park filter is an `EXISTS` on the link table, so a species
    /// appears at most once. Park ids for all results come from one
    /// batched query.
    pub async fn list(&self, filter: &SpeciesFilter) -> Result<Vec<SpeciesWithParks>, DbError> {
        let mut builder = QueryBuilder::<Sqlite>::new("SELECT s.* FROM species s WHERE 1=1");
        if let Some(species_type) = filter.species_type {
            builder.push(" AND s.type = ");
            builder.push_bind(species_type);
        }
        if let Some(park_id) = filter.park_id {
            builder.push(
                " AND EXISTS (SELECT 1 FROM park_species ps WHERE ps.species_id = s.id AND ps.park_id = ",
            );
            builder.push_bind(park_id);
            builder.push(")");
        }
        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let pattern = super::contains_pattern(search);
            builder.push(" AND (LOWER(s.name) LIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" ESCAPE '\\' OR LOWER(s.scientific_name) LIKE ");
            builder.push_bind(pattern);
            builder.push(" ESCAPE '\\')");
        }
        builder.push(" ORDER BY s.name, s.id");

        let mut conn = self.pool.acquire().await?;
        let species: Vec<Species> = builder.build_query_as().fetch_all(&mut *conn).await?;

        let ids: Vec<i64> = species.iter().map(|s| s.id).collect();
        let mut park_ids = links::park_ids_for(&mut conn, &ids).await?;

        Ok(species
            .into_iter()
            .map(|species| SpeciesWithParks {
                park_ids: park_ids.remove(&species.id).unwrap_or_default(),
                species,
            })
            .collect())
    }

    /// Apply a partial update; `patch.park_ids` replaces the park list.
    pub async fn update(&self, id: i64, patch: SpeciesPatch) -> Result<SpeciesWithParks, DbError> {
        let mut tx = self.pool.begin().await?;
        let d = patch.details;

        let updated = sqlx::query(
            r#"
            UPDATE species SET
                name = COALESCE(?, name),
                scientific_name = COALESCE(?, scientific_name),
                type = COALESCE(?, type),
                description = COALESCE(?, description),
                image_url = COALESCE(?, image_url),
                threats = COALESCE(?, threats),
                protection_measures = COALESCE(?, protection_measures),
                safety_guidelines = COALESCE(?, safety_guidelines),
                medicinal_use = COALESCE(?, medicinal_use),
                toxicity_level = COALESCE(?, toxicity_level),
                gallery_images = COALESCE(?, gallery_images),
                audio_url = COALESCE(?, audio_url),
                video_url = COALESCE(?, video_url),
                conservation_status = COALESCE(?, conservation_status),
                habitat_type = COALESCE(?, habitat_type),
                diet = COALESCE(?, diet),
                lifespan = COALESCE(?, lifespan),
                size = COALESCE(?, size),
                weight = COALESCE(?, weight),
                best_viewing_months = COALESCE(?, best_viewing_months),
                activity_time = COALESCE(?, activity_time),
                rarity = COALESCE(?, rarity)
            WHERE id = ?
            "#,
        )
        .bind(patch.name)
        .bind(patch.scientific_name)
        .bind(patch.species_type)
        .bind(patch.description)
        .bind(patch.image_url)
        .bind(d.threats)
        .bind(d.protection_measures)
        .bind(d.safety_guidelines)
        .bind(d.medicinal_use)
        .bind(d.toxicity_level)
        .bind(d.gallery_images.map(Json))
        .bind(d.audio_url)
        .bind(d.video_url)
        .bind(d.conservation_status)
        .bind(d.habitat_type)
        .bind(d.diet)
        .bind(d.lifespan)
        .bind(d.size)
        .bind(d.weight)
        .bind(d.best_viewing_months.map(Json))
        .bind(d.activity_time)
        .bind(d.rarity)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(DbError::not_found("species", id));
        }

        if let Some(requested) = patch.park_ids.as_deref() {
            links::replace_species_parks(&mut tx, id, requested).await?;
        }

        let species = fetch(&mut tx, id).await?;
        let park_ids = links::park_ids_of(&mut tx, id).await?.into_iter().collect();
        tx.commit().await?;

        Ok(SpeciesWithParks { species, park_ids })
    }

    /// Replace the image URL, returning the previous one.
    pub async fn set_image(&self, id: i64, image_url: &str) -> Result<Option<String>, DbError> {
        let mut tx = self.pool.begin().await?;
        let previous = fetch(&mut tx, id).await?.image_url;

        sqlx::query("UPDATE species SET image_url = ? WHERE id = ?")
            .bind(image_url)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(previous)
    }

    /// Delete a species, its links and its sightings.
    ///
    /// Links go first: the join table has no cascading delete. Returns the
    /// deleted record so callers can clean up stored media.
    pub async fn delete(&self, id: i64) -> Result<Species, DbError> {
        let mut tx = self.pool.begin().await?;
        let species = fetch(&mut tx, id).await?;

        let links_removed = links::unlink_species(&mut tx, id).await?;
        sqlx::query("DELETE FROM sightings WHERE species_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM species WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::info!(species_id = id, links_removed, "Deleted species");
        Ok(species)
    }
}

async fn fetch(conn: &mut sqlx::SqliteConnection, id: i64) -> Result<Species, DbError> {
    sqlx::query_as::<_, Species>("SELECT * FROM species WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("species", id))
}
