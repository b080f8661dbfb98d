//! Admin login endpoints

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use crate::auth::{AdminProfile, IssuedToken};
use crate::http::error::ApiError;
use crate::http::extractors::{AdminUser, ApiJson};
use crate::http::server::AppState;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// POST /auth/login
async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<IssuedToken>, ApiError> {
    // argon2 verification is CPU bound
    let auth = state.auth.clone();
    let token = tokio::task::spawn_blocking(move || auth.login(req.username.trim(), &req.password))
        .await
        .map_err(|e| ApiError::internal(format!("login task failed: {e}")))??;
    Ok(Json(token))
}

/// GET /auth/me
async fn me(AdminUser(profile): AdminUser) -> Json<AdminProfile> {
    Json(profile)
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
}
