//! Custom Axum extractors

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, FromRequestParts, Path, Request};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::Json;
use serde::de::DeserializeOwned;

use super::error::ApiError;
use super::server::AppState;
use crate::auth::{bearer_token, AdminProfile, AuthError};
use crate::models::ValidationError;

/// Authenticated admin, from `Authorization: Bearer <token>`
pub struct AdminUser(pub AdminProfile);

impl FromRequestParts<Arc<AppState>> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(bearer_token)
            .ok_or(AuthError::MissingToken)?;

        let profile = state.auth.authenticate(token)?;
        Ok(Self(profile))
    }
}

/// Positive integer id from a single-segment path (`/{id}`)
pub struct IdPath(pub i64);

impl<S> FromRequestParts<S> for IdPath
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw): Path<String> = Path::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::Validation(ValidationError::Empty { field: "id" }))?;

        parse_id("id", &raw).map(Self)
    }
}

/// Two integer ids from a nested path (`/{id}/species/{species_id}`)
pub struct IdPair(pub i64, pub i64);

impl<S> FromRequestParts<S> for IdPair
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path((first, second)): Path<(String, String)> = Path::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::Validation(ValidationError::Empty { field: "id" }))?;

        Ok(Self(parse_id("id", &first)?, parse_id("id", &second)?))
    }
}

pub(crate) fn parse_id(field: &'static str, raw: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or(ApiError::Validation(ValidationError::InvalidFormat {
            field,
            reason: "must be a positive integer",
        }))
}

/// JSON body whose decoding failures come back as validation errors
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(malformed(rejection)),
        }
    }
}

fn malformed(rejection: JsonRejection) -> ApiError {
    ApiError::Validation(ValidationError::Malformed {
        reason: rejection.body_text(),
    })
}
