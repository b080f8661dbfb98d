//! Health check endpoint

use std::sync::Arc;

use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::db::DbError;
use crate::http::error::ApiError;
use crate::http::server::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
    pub version: &'static str,
}

/// GET /health - also round-trips the database
async fn health(State(state): State<Arc<AppState>>) -> Result<Json<HealthResponse>, ApiError> {
    sqlx::query("SELECT 1")
        .execute(&state.pool)
        .await
        .map_err(DbError::from)?;

    Ok(Json(HealthResponse {
        status: "ok",
        database: "ok",
        version: env!("CARGO_PKG_VERSION"),
    }))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health))
}
