//! Sighting endpoints

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::db::repos::{NewSighting, Sighting, SightingFilter, SightingRepo};
use crate::http::error::ApiError;
use crate::http::extractors::{AdminUser, ApiJson, IdPath};
use crate::http::server::AppState;
use crate::models::validation::{optional_text, required_text};
use crate::models::{
    Coordinates, Paginated, Pagination, PaginationParams, ValidationError, MAX_NAME_LEN,
};

#[derive(Debug, Deserialize)]
pub struct CreateSightingRequest {
    pub park_id: i64,
    pub species_id: i64,
    pub reporter_name: String,
    pub sighting_date: NaiveDate,
    pub location_lat: f64,
    pub location_lng: f64,
    pub photo_url: Option<String>,
    pub notes: Option<String>,
}

impl CreateSightingRequest {
    fn validate(self) -> Result<NewSighting, ValidationError> {
        Ok(NewSighting {
            park_id: self.park_id,
            species_id: self.species_id,
            reporter_name: required_text("reporter_name", &self.reporter_name, MAX_NAME_LEN)?,
            sighting_date: self.sighting_date,
            location: Coordinates::new(self.location_lat, self.location_lng)?,
            photo_url: optional_text("photo_url", self.photo_url.as_deref(), 2048)?,
            notes: optional_text("notes", self.notes.as_deref(), 5_000)?,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SightingQuery {
    pub park_id: Option<i64>,
    pub species_id: Option<i64>,
    pub verified: Option<bool>,
}

/// GET /sightings
async fn list_sightings(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SightingQuery>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<Paginated<Sighting>>, ApiError> {
    let filter = SightingFilter {
        park_id: query.park_id,
        species_id: query.species_id,
        verified: query.verified,
    };
    let page = SightingRepo::new(&state.pool)
        .list(&filter, Pagination::from(params))
        .await?;
    Ok(Json(page))
}

/// POST /sightings - open to visitors, stored unverified
async fn create_sighting(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CreateSightingRequest>,
) -> Result<(StatusCode, Json<Sighting>), ApiError> {
    let sighting = SightingRepo::new(&state.pool).create(req.validate()?).await?;
    Ok((StatusCode::CREATED, Json(sighting)))
}

/// POST /sightings/{id}/verify
async fn verify_sighting(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    IdPath(id): IdPath,
) -> Result<Json<Sighting>, ApiError> {
    Ok(Json(SightingRepo::new(&state.pool).verify(id).await?))
}

/// DELETE /sightings/{id}
async fn delete_sighting(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    IdPath(id): IdPath,
) -> Result<StatusCode, ApiError> {
    SightingRepo::new(&state.pool).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/sightings", get(list_sightings).post(create_sighting))
        .route("/sightings/{id}", delete(delete_sighting))
        .route("/sightings/{id}/verify", post(verify_sighting))
}
