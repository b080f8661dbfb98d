//! Species endpoints
//!
//! `park_ids` on create links the species to the listed parks; on update it
//! replaces the whole park list. Ids of parks that do not exist are dropped.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::db::repos::{
    NewSpecies, SpeciesDetails, SpeciesFilter, SpeciesPatch, SpeciesRepo, SpeciesWithParks,
};
use crate::http::error::ApiError;
use crate::http::extractors::{AdminUser, ApiJson, IdPath};
use crate::http::server::AppState;
use crate::models::validation::{optional_text, required_text};
use crate::models::{SpeciesType, ValidationError, MAX_NAME_LEN};
use crate::services::Bucket;

const MAX_TEXT_LEN: usize = 10_000;

#[derive(Debug, Default, Deserialize)]
pub struct SpeciesDetailsBody {
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

impl SpeciesDetailsBody {
    fn validate(self) -> Result<SpeciesDetails, ValidationError> {
        let long = |field, value: Option<String>| optional_text(field, value.as_deref(), MAX_TEXT_LEN);
        let short = |field, value: Option<String>| optional_text(field, value.as_deref(), MAX_NAME_LEN);

        Ok(SpeciesDetails {
            threats: long("threats", self.threats)?,
            protection_measures: long("protection_measures", self.protection_measures)?,
            safety_guidelines: long("safety_guidelines", self.safety_guidelines)?,
            medicinal_use: long("medicinal_use", self.medicinal_use)?,
            toxicity_level: short("toxicity_level", self.toxicity_level)?,
            gallery_images: self.gallery_images,
            audio_url: long("audio_url", self.audio_url)?,
            video_url: long("video_url", self.video_url)?,
            conservation_status: short("conservation_status", self.conservation_status)?,
            habitat_type: short("habitat_type", self.habitat_type)?,
            diet: long("diet", self.diet)?,
            lifespan: short("lifespan", self.lifespan)?,
            size: short("size", self.size)?,
            weight: short("weight", self.weight)?,
            best_viewing_months: self.best_viewing_months,
            activity_time: short("activity_time", self.activity_time)?,
            rarity: short("rarity", self.rarity)?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateSpeciesRequest {
    pub name: String,
    pub scientific_name: String,
    #[serde(rename = "type")]
    pub species_type: String,
    pub description: String,
    pub image_url: Option<String>,
    #[serde(default)]
    pub park_ids: Vec<i64>,
    #[serde(flatten)]
    pub details: SpeciesDetailsBody,
}

impl CreateSpeciesRequest {
    fn validate(self) -> Result<(NewSpecies, Vec<i64>), ValidationError> {
        let species = NewSpecies {
            name: required_text("name", &self.name, MAX_NAME_LEN)?,
            scientific_name: required_text("scientific_name", &self.scientific_name, MAX_NAME_LEN)?,
            species_type: self.species_type.parse()?,
            description: required_text("description", &self.description, MAX_TEXT_LEN)?,
            image_url: optional_text("image_url", self.image_url.as_deref(), 2048)?,
            details: self.details.validate()?,
        };
        Ok((species, self.park_ids))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateSpeciesRequest {
    pub name: Option<String>,
    pub scientific_name: Option<String>,
    #[serde(rename = "type")]
    pub species_type: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    /// Complete desired park list; absent leaves links untouched
    pub park_ids: Option<Vec<i64>>,
    #[serde(flatten)]
    pub details: SpeciesDetailsBody,
}

impl UpdateSpeciesRequest {
    fn validate(self) -> Result<SpeciesPatch, ValidationError> {
        Ok(SpeciesPatch {
            name: optional_text("name", self.name.as_deref(), MAX_NAME_LEN)?,
            scientific_name: optional_text(
                "scientific_name",
                self.scientific_name.as_deref(),
                MAX_NAME_LEN,
            )?,
            species_type: self
                .species_type
                .as_deref()
                .map(str::parse::<SpeciesType>)
                .transpose()?,
            description: optional_text("description", self.description.as_deref(), MAX_TEXT_LEN)?,
            image_url: optional_text("image_url", self.image_url.as_deref(), 2048)?,
            details: self.details.validate()?,
            park_ids: self.park_ids,
        })
    }
}

/// `?type=animal&park_id=3&search=gaz`
#[derive(Debug, Default, Deserialize)]
pub struct SpeciesQuery {
    #[serde(rename = "type")]
    pub species_type: Option<String>,
    pub park_id: Option<i64>,
    pub search: Option<String>,
}

impl SpeciesQuery {
    fn into_filter(self) -> Result<SpeciesFilter, ValidationError> {
        Ok(SpeciesFilter {
            species_type: self
                .species_type
                .as_deref()
                .filter(|t| !t.trim().is_empty())
                .map(str::parse::<SpeciesType>)
                .transpose()?,
            park_id: self.park_id,
            search: self.search,
        })
    }
}

/// GET /species
async fn list_species(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SpeciesQuery>,
) -> Result<Json<Vec<SpeciesWithParks>>, ApiError> {
    let species = SpeciesRepo::new(&state.pool).list(&query.into_filter()?).await?;
    Ok(Json(species))
}

/// POST /species
async fn create_species(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    ApiJson(req): ApiJson<CreateSpeciesRequest>,
) -> Result<(StatusCode, Json<SpeciesWithParks>), ApiError> {
    let (species, park_ids) = req.validate()?;
    let created = SpeciesRepo::new(&state.pool).create(species, &park_ids).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /species/{id}
async fn get_species(
    State(state): State<Arc<AppState>>,
    IdPath(id): IdPath,
) -> Result<Json<SpeciesWithParks>, ApiError> {
    Ok(Json(SpeciesRepo::new(&state.pool).get(id).await?))
}

/// PUT /species/{id}
async fn update_species(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    IdPath(id): IdPath,
    ApiJson(req): ApiJson<UpdateSpeciesRequest>,
) -> Result<Json<SpeciesWithParks>, ApiError> {
    let updated = SpeciesRepo::new(&state.pool).update(id, req.validate()?).await?;
    Ok(Json(updated))
}

/// DELETE /species/{id} - stored image first, then the row; links and sightings go with it
async fn delete_species(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    IdPath(id): IdPath,
) -> Result<StatusCode, ApiError> {
    let repo = SpeciesRepo::new(&state.pool);
    let species = repo.get(id).await?.species;

    let stored = species
        .image_url
        .as_deref()
        .and_then(|url| state.storage.stored_filename(Bucket::Species, url));
    if let Some(filename) = stored {
        if let Err(e) = state.storage.delete(Bucket::Species, &filename).await {
            tracing::warn!(species_id = id, filename = %filename, error = %e, "Failed to delete species image");
        }
    }

    repo.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/species", get(list_species).post(create_species))
        .route(
            "/species/{id}",
            get(get_species).put(update_species).delete(delete_species),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_parses_type_and_park_ids() {
        let req: CreateSpeciesRequest = serde_json::from_value(serde_json::json!({
            "name": "Gazelle de Cuvier",
            "scientific_name": "Gazella cuvieri",
            "type": "Animal",
            "description": "Antilope",
            "park_ids": [1, 2],
            "rarity": "rare"
        }))
        .unwrap();
        let (species, park_ids) = req.validate().unwrap();
        assert_eq!(species.species_type, SpeciesType::Animal);
        assert_eq!(species.details.rarity.as_deref(), Some("rare"));
        assert_eq!(park_ids, vec![1, 2]);
    }

    #[test]
    fn unknown_type_is_rejected() {
        let query = SpeciesQuery {
            species_type: Some("fungus".into()),
            ..Default::default()
        };
        assert!(matches!(
            query.into_filter().unwrap_err(),
            ValidationError::InvalidVariant { field: "type", .. }
        ));
    }

    #[test]
    fn blank_type_means_no_filter() {
        let query = SpeciesQuery {
            species_type: Some("".into()),
            park_id: Some(4),
            ..Default::default()
        };
        let filter = query.into_filter().unwrap();
        assert_eq!(filter.species_type, None);
        assert_eq!(filter.park_id, Some(4));
    }

    #[test]
    fn update_distinguishes_absent_and_empty_park_ids() {
        let absent: UpdateSpeciesRequest = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(absent.validate().unwrap().park_ids, None);

        let empty: UpdateSpeciesRequest =
            serde_json::from_value(serde_json::json!({ "park_ids": [] })).unwrap();
        assert_eq!(empty.validate().unwrap().park_ids, Some(vec![]));
    }
}
