//! Trail endpoints

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Deserialize;

use crate::db::repos::{NewTrail, Trail, TrailPatch, TrailRepo};
use crate::http::error::ApiError;
use crate::http::extractors::{AdminUser, ApiJson, IdPath};
use crate::http::server::AppState;
use crate::models::validation::{optional_text, positive, required_text};
use crate::models::{Difficulty, TrailType, ValidationError, MAX_NAME_LEN};

#[derive(Debug, Deserialize)]
pub struct CreateTrailRequest {
    pub name: String,
    pub description: String,
    pub difficulty: String,
    pub length_km: f64,
    pub duration_hours: f64,
    pub elevation_gain: Option<i64>,
    pub trail_type: String,
    pub surface: Option<String>,
    pub gpx_data: Option<String>,
    #[serde(default)]
    pub waypoints: Vec<String>,
    #[serde(default)]
    pub highlights: Vec<String>,
}

impl CreateTrailRequest {
    fn validate(self) -> Result<NewTrail, ValidationError> {
        Ok(NewTrail {
            name: required_text("name", &self.name, MAX_NAME_LEN)?,
            description: required_text("description", &self.description, 10_000)?,
            difficulty: self.difficulty.parse::<Difficulty>()?,
            length_km: positive("length_km", self.length_km)?,
            duration_hours: positive("duration_hours", self.duration_hours)?,
            elevation_gain: self.elevation_gain,
            trail_type: self.trail_type.parse::<TrailType>()?,
            surface: optional_text("surface", self.surface.as_deref(), MAX_NAME_LEN)?,
            gpx_data: self.gpx_data,
            waypoints: self.waypoints,
            highlights: self.highlights,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateTrailRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub difficulty: Option<String>,
    pub length_km: Option<f64>,
    pub duration_hours: Option<f64>,
    pub elevation_gain: Option<i64>,
    pub trail_type: Option<String>,
    pub surface: Option<String>,
    pub gpx_data: Option<String>,
    pub waypoints: Option<Vec<String>>,
    pub highlights: Option<Vec<String>>,
}

impl UpdateTrailRequest {
    fn validate(self) -> Result<TrailPatch, ValidationError> {
        Ok(TrailPatch {
            name: optional_text("name", self.name.as_deref(), MAX_NAME_LEN)?,
            description: optional_text("description", self.description.as_deref(), 10_000)?,
            difficulty: self
                .difficulty
                .as_deref()
                .map(str::parse::<Difficulty>)
                .transpose()?,
            length_km: self.length_km.map(|v| positive("length_km", v)).transpose()?,
            duration_hours: self
                .duration_hours
                .map(|v| positive("duration_hours", v))
                .transpose()?,
            elevation_gain: self.elevation_gain,
            trail_type: self
                .trail_type
                .as_deref()
                .map(str::parse::<TrailType>)
                .transpose()?,
            surface: optional_text("surface", self.surface.as_deref(), MAX_NAME_LEN)?,
            gpx_data: self.gpx_data,
            waypoints: self.waypoints,
            highlights: self.highlights,
        })
    }
}

/// GET /parks/{id}/trails
async fn list_trails(
    State(state): State<Arc<AppState>>,
    IdPath(park_id): IdPath,
) -> Result<Json<Vec<Trail>>, ApiError> {
    Ok(Json(TrailRepo::new(&state.pool).list_for_park(park_id).await?))
}

/// POST /parks/{id}/trails
async fn create_trail(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    IdPath(park_id): IdPath,
    ApiJson(req): ApiJson<CreateTrailRequest>,
) -> Result<(StatusCode, Json<Trail>), ApiError> {
    let trail = TrailRepo::new(&state.pool)
        .create(park_id, req.validate()?)
        .await?;
    Ok((StatusCode::CREATED, Json(trail)))
}

/// GET /trails/{id}
async fn get_trail(
    State(state): State<Arc<AppState>>,
    IdPath(id): IdPath,
) -> Result<Json<Trail>, ApiError> {
    Ok(Json(TrailRepo::new(&state.pool).get(id).await?))
}

/// PUT /trails/{id}
async fn update_trail(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    IdPath(id): IdPath,
    ApiJson(req): ApiJson<UpdateTrailRequest>,
) -> Result<Json<Trail>, ApiError> {
    Ok(Json(TrailRepo::new(&state.pool).update(id, req.validate()?).await?))
}

/// DELETE /trails/{id}
async fn delete_trail(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    IdPath(id): IdPath,
) -> Result<StatusCode, ApiError> {
    TrailRepo::new(&state.pool).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/parks/{id}/trails", get(list_trails).post(create_trail))
        .route(
            "/trails/{id}",
            get(get_trail).put(update_trail).delete(delete_trail),
        )
}
