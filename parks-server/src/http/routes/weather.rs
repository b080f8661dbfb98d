//! Weather and map helpers for a park

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::db::repos::ParkRepo;
use crate::http::error::ApiError;
use crate::http::extractors::IdPath;
use crate::http::server::AppState;
use crate::models::Coordinates;
use crate::services::weather::MAX_FORECAST_DAYS;
use crate::services::{CurrentWeather, Forecast, MapLinks};

#[derive(Debug, Default, Deserialize)]
pub struct ForecastQuery {
    pub days: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MapQuery {
    pub origin_lat: Option<f64>,
    pub origin_lng: Option<f64>,
}

/// GET /parks/{id}/weather
async fn current_weather(
    State(state): State<Arc<AppState>>,
    IdPath(id): IdPath,
) -> Result<Json<CurrentWeather>, ApiError> {
    let park = ParkRepo::new(&state.pool).get(id).await?;
    Ok(Json(state.weather.current(park.coordinates()).await?))
}

/// GET /parks/{id}/forecast?days=
async fn forecast(
    State(state): State<Arc<AppState>>,
    IdPath(id): IdPath,
    Query(query): Query<ForecastQuery>,
) -> Result<Json<Forecast>, ApiError> {
    let days = query
        .days
        .unwrap_or(MAX_FORECAST_DAYS)
        .clamp(1, MAX_FORECAST_DAYS);
    let park = ParkRepo::new(&state.pool).get(id).await?;
    Ok(Json(state.weather.forecast(park.coordinates(), days).await?))
}

/// GET /parks/{id}/map?origin_lat=&origin_lng=
async fn map_links(
    State(state): State<Arc<AppState>>,
    IdPath(id): IdPath,
    Query(query): Query<MapQuery>,
) -> Result<Json<MapLinks>, ApiError> {
    let origin = Coordinates::from_optional(query.origin_lat, query.origin_lng)?;
    let park = ParkRepo::new(&state.pool).get(id).await?;
    Ok(Json(MapLinks::new(park.coordinates(), origin)))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/parks/{id}/weather", get(current_weather))
        .route("/parks/{id}/forecast", get(forecast))
        .route("/parks/{id}/map", get(map_links))
}
