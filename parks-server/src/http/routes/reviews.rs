//! Review endpoints
//!
//! Posting a review and voting it helpful are open to visitors; deleting
//! one needs the admin.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::db::repos::{NewReview, Review, ReviewRepo};
use crate::http::error::ApiError;
use crate::http::extractors::{AdminUser, ApiJson, IdPath};
use crate::http::server::AppState;
use crate::models::validation::required_text;
use crate::models::{Paginated, Pagination, PaginationParams, Rating, ValidationError, MAX_NAME_LEN};

#[derive(Debug, Deserialize)]
pub struct CreateReviewRequest {
    pub author_name: String,
    pub rating: i64,
    pub title: String,
    pub comment: String,
    pub visit_date: Option<NaiveDate>,
}

impl CreateReviewRequest {
    fn validate(self) -> Result<NewReview, ValidationError> {
        Ok(NewReview {
            author_name: required_text("author_name", &self.author_name, MAX_NAME_LEN)?,
            rating: Rating::new(self.rating)?,
            title: required_text("title", &self.title, MAX_NAME_LEN)?,
            comment: required_text("comment", &self.comment, 5_000)?,
            visit_date: self.visit_date,
        })
    }
}

/// GET /parks/{id}/reviews - newest first
async fn list_reviews(
    State(state): State<Arc<AppState>>,
    IdPath(park_id): IdPath,
    Query(params): Query<PaginationParams>,
) -> Result<Json<Paginated<Review>>, ApiError> {
    let page = ReviewRepo::new(&state.pool)
        .list_for_park(park_id, Pagination::from(params))
        .await?;
    Ok(Json(page))
}

/// POST /parks/{id}/reviews
async fn create_review(
    State(state): State<Arc<AppState>>,
    IdPath(park_id): IdPath,
    ApiJson(req): ApiJson<CreateReviewRequest>,
) -> Result<(StatusCode, Json<Review>), ApiError> {
    let review = ReviewRepo::new(&state.pool)
        .create(park_id, req.validate()?)
        .await?;
    Ok((StatusCode::CREATED, Json(review)))
}

/// DELETE /reviews/{id}
async fn delete_review(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    IdPath(id): IdPath,
) -> Result<StatusCode, ApiError> {
    ReviewRepo::new(&state.pool).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /reviews/{id}/helpful
async fn mark_helpful(
    State(state): State<Arc<AppState>>,
    IdPath(id): IdPath,
) -> Result<Json<Review>, ApiError> {
    Ok(Json(ReviewRepo::new(&state.pool).mark_helpful(id).await?))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/parks/{id}/reviews", get(list_reviews).post(create_review))
        .route("/reviews/{id}", delete(delete_review))
        .route("/reviews/{id}/helpful", post(mark_helpful))
}
