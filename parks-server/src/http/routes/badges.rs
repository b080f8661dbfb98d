//! Badge endpoints

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use serde::Deserialize;

use crate::db::repos::{Badge, BadgeRepo, NewBadge};
use crate::http::error::ApiError;
use crate::http::extractors::{AdminUser, ApiJson, IdPath};
use crate::http::server::AppState;
use crate::models::validation::required_text;
use crate::models::{ValidationError, MAX_NAME_LEN};

#[derive(Debug, Deserialize)]
pub struct CreateBadgeRequest {
    pub name: String,
    pub description: String,
    pub icon: String,
    pub requirement: String,
    #[serde(default)]
    pub points: i64,
}

impl CreateBadgeRequest {
    fn validate(self) -> Result<NewBadge, ValidationError> {
        if self.points < 0 {
            return Err(ValidationError::OutOfRange {
                field: "points",
                min: 0.0,
                max: i64::MAX as f64,
            });
        }
        Ok(NewBadge {
            name: required_text("name", &self.name, MAX_NAME_LEN)?,
            description: required_text("description", &self.description, 2_000)?,
            icon: required_text("icon", &self.icon, MAX_NAME_LEN)?,
            requirement: required_text("requirement", &self.requirement, MAX_NAME_LEN)?,
            points: self.points,
        })
    }
}

async fn list_badges(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Badge>>, ApiError> {
    Ok(Json(BadgeRepo::new(&state.pool).list().await?))
}

async fn create_badge(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    ApiJson(req): ApiJson<CreateBadgeRequest>,
) -> Result<(StatusCode, Json<Badge>), ApiError> {
    let badge = BadgeRepo::new(&state.pool).create(req.validate()?).await?;
    Ok((StatusCode::CREATED, Json(badge)))
}

async fn delete_badge(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    IdPath(id): IdPath,
) -> Result<StatusCode, ApiError> {
    BadgeRepo::new(&state.pool).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/badges", get(list_badges).post(create_badge))
        .route("/badges/{id}", delete(delete_badge))
}
