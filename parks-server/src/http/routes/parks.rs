//! Park endpoints, plus the park side of the species association

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::db::repos::{
    LinkAnnotations, LinkRepo, NewPark, Park, ParkDetails, ParkFilter, ParkPatch, ParkRepo,
    ParkSpecies,
};
use crate::http::error::ApiError;
use crate::http::extractors::{AdminUser, ApiJson, IdPair, IdPath};
use crate::http::server::AppState;
use crate::models::contact::{contact_email, contact_phone};
use crate::models::validation::{optional_text, positive, required_text};
use crate::models::{
    Coordinates, Difficulty, Paginated, Pagination, PaginationParams, SightingProbability,
    ValidationError, MAX_NAME_LEN,
};
use crate::services::{maps, Bucket};

const MAX_TEXT_LEN: usize = 10_000;

/// Optional park attributes accepted on create and update
#[derive(Debug, Default, Deserialize)]
pub struct ParkDetailsBody {
    pub area_km2: Option<f64>,
    pub google_maps_url: Option<String>,
    pub hero_image_url: Option<String>,
    pub gallery_images: Option<Vec<String>>,
    pub difficulty_level: Option<String>,
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

impl ParkDetailsBody {
    fn validate(self) -> Result<ParkDetails, ValidationError> {
        if let (Some(min), Some(max)) = (self.elevation_min, self.elevation_max) {
            if min > max {
                return Err(ValidationError::InvalidFormat {
                    field: "elevation_min",
                    reason: "must not exceed elevation_max",
                });
            }
        }
        for (field, value) in [
            ("area_hectares", self.area_hectares),
            ("visitor_count_yearly", self.visitor_count_yearly),
        ] {
            if value.is_some_and(|v| v < 0) {
                return Err(ValidationError::OutOfRange {
                    field,
                    min: 0.0,
                    max: i64::MAX as f64,
                });
            }
        }

        Ok(ParkDetails {
            area_km2: self.area_km2.map(|a| positive("area_km2", a)).transpose()?,
            google_maps_url: optional_text("google_maps_url", self.google_maps_url.as_deref(), 2048)?,
            hero_image_url: optional_text("hero_image_url", self.hero_image_url.as_deref(), 2048)?,
            gallery_images: self.gallery_images,
            difficulty_level: self
                .difficulty_level
                .as_deref()
                .map(str::parse::<Difficulty>)
                .transpose()?,
            accessibility: self.accessibility,
            best_months: self.best_months,
            activities: self.activities,
            facilities: self.facilities,
            entrance_fee: optional_text("entrance_fee", self.entrance_fee.as_deref(), MAX_NAME_LEN)?,
            opening_hours: optional_text("opening_hours", self.opening_hours.as_deref(), MAX_NAME_LEN)?,
            contact_phone: self.contact_phone.as_deref().map(contact_phone).transpose()?,
            contact_email: self.contact_email.as_deref().map(contact_email).transpose()?,
            area_hectares: self.area_hectares,
            elevation_min: self.elevation_min,
            elevation_max: self.elevation_max,
            visitor_count_yearly: self.visitor_count_yearly,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateParkRequest {
    pub name: String,
    pub governorate: String,
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(flatten)]
    pub details: ParkDetailsBody,
}

impl CreateParkRequest {
    fn validate(self) -> Result<NewPark, ValidationError> {
        Ok(NewPark {
            name: required_text("name", &self.name, MAX_NAME_LEN)?,
            governorate: required_text("governorate", &self.governorate, MAX_NAME_LEN)?,
            description: required_text("description", &self.description, MAX_TEXT_LEN)?,
            coordinates: Coordinates::new(self.latitude, self.longitude)?,
            details: self.details.validate()?,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateParkRequest {
    pub name: Option<String>,
    pub governorate: Option<String>,
    pub description: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(flatten)]
    pub details: ParkDetailsBody,
}

impl UpdateParkRequest {
    fn validate(self) -> Result<ParkPatch, ValidationError> {
        Ok(ParkPatch {
            name: optional_text("name", self.name.as_deref(), MAX_NAME_LEN)?,
            governorate: optional_text("governorate", self.governorate.as_deref(), MAX_NAME_LEN)?,
            description: optional_text("description", self.description.as_deref(), MAX_TEXT_LEN)?,
            coordinates: Coordinates::from_optional(self.latitude, self.longitude)?,
            details: self.details.validate()?,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ParkListQuery {
    pub governorate: Option<String>,
    pub search: Option<String>,
}

/// Park with resolved image URLs
#[derive(Debug, Serialize)]
pub struct ParkResponse {
    #[serde(flatten)]
    pub park: Park,
    pub image_urls: Vec<String>,
}

impl ParkResponse {
    pub(crate) fn new(mut park: Park, state: &AppState) -> Self {
        if park.google_maps_url.is_none() {
            park.google_maps_url = Some(maps::search_url(park.coordinates()));
        }
        let image_urls = park
            .images
            .iter()
            .map(|f| state.storage.url_for(Bucket::Parks, f))
            .collect();
        Self { park, image_urls }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LinkAnnotationsBody {
    pub population_estimate: Option<String>,
    pub sighting_probability: Option<String>,
    #[serde(default)]
    pub best_spots: Vec<String>,
}

impl LinkAnnotationsBody {
    fn validate(self) -> Result<LinkAnnotations, ValidationError> {
        Ok(LinkAnnotations {
            population_estimate: optional_text(
                "population_estimate",
                self.population_estimate.as_deref(),
                MAX_NAME_LEN,
            )?,
            sighting_probability: self
                .sighting_probability
                .as_deref()
                .map(str::parse::<SightingProbability>)
                .transpose()?,
            best_spots: self.best_spots,
        })
    }
}

/// GET /parks
async fn list_parks(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ParkListQuery>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<Paginated<ParkResponse>>, ApiError> {
    let filter = ParkFilter {
        governorate: query.governorate.filter(|g| !g.trim().is_empty()),
        search: query.search,
    };
    let page = ParkRepo::new(&state.pool)
        .list(&filter, Pagination::from(params))
        .await?;
    Ok(Json(page.map(|park| ParkResponse::new(park, &state))))
}

/// POST /parks
async fn create_park(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    ApiJson(req): ApiJson<CreateParkRequest>,
) -> Result<(StatusCode, Json<ParkResponse>), ApiError> {
    let park = ParkRepo::new(&state.pool).create(req.validate()?).await?;
    Ok((StatusCode::CREATED, Json(ParkResponse::new(park, &state))))
}

/// GET /parks/{id}
async fn get_park(
    State(state): State<Arc<AppState>>,
    IdPath(id): IdPath,
) -> Result<Json<ParkResponse>, ApiError> {
    let park = ParkRepo::new(&state.pool).get(id).await?;
    Ok(Json(ParkResponse::new(park, &state)))
}

/// PUT /parks/{id}
async fn update_park(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    IdPath(id): IdPath,
    ApiJson(req): ApiJson<UpdateParkRequest>,
) -> Result<Json<ParkResponse>, ApiError> {
    let park = ParkRepo::new(&state.pool).update(id, req.validate()?).await?;
    Ok(Json(ParkResponse::new(park, &state)))
}

/// DELETE /parks/{id} - removes stored images, then the park and its dependents
async fn delete_park(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    IdPath(id): IdPath,
) -> Result<StatusCode, ApiError> {
    let repo = ParkRepo::new(&state.pool);
    let park = repo.get(id).await?;

    for filename in park.images.iter() {
        if let Err(e) = state.storage.delete(Bucket::Parks, filename).await {
            tracing::warn!(park_id = id, filename = %filename, error = %e, "Failed to delete park image");
        }
    }

    repo.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /parks/{id}/species
async fn list_park_species(
    State(state): State<Arc<AppState>>,
    IdPath(id): IdPath,
) -> Result<Json<Vec<ParkSpecies>>, ApiError> {
    let species = LinkRepo::new(&state.pool).list_for_park(id).await?;
    Ok(Json(species))
}

/// PUT /parks/{id}/species/{species_id} - annotate an existing link
async fn annotate_link(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    IdPair(park_id, species_id): IdPair,
    ApiJson(body): ApiJson<LinkAnnotationsBody>,
) -> Result<Json<ParkSpecies>, ApiError> {
    let link = LinkRepo::new(&state.pool)
        .set_annotations(park_id, species_id, body.validate()?)
        .await?;
    Ok(Json(link))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/parks", get(list_parks).post(create_park))
        .route("/parks/{id}", get(get_park).put(update_park).delete(delete_park))
        .route("/parks/{id}/species", get(list_park_species))
        .route("/parks/{id}/species/{species_id}", put(annotate_link))
}
