//! API error type and its JSON rendering
//!
//! Every failure leaves the server as `{"error": <code>, "message": <text>}`.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::auth::AuthError;
use crate::db::repos::DbError;
use crate::models::ValidationError;
use crate::services::{StorageError, WeatherError};

#[derive(Debug)]
pub enum ApiError {
    /// 400
    Validation(ValidationError),

    /// 401, with `WWW-Authenticate: Bearer`
    Unauthorized { message: String },

    /// 404
    NotFound { resource: &'static str, id: String },

    /// 409
    Conflict { message: String },

    /// 413
    PayloadTooLarge { message: String },

    /// 503, weather provider missing or failing
    UpstreamUnavailable { message: String },

    /// 500, logged
    Database(DbError),

    /// 500, logged
    Internal { message: String },
}

impl ApiError {
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    fn status_and_body(&self) -> (StatusCode, serde_json::Value) {
        match self {
            Self::Validation(e) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "validation_error", "message": e.to_string() }),
            ),
            Self::Unauthorized { message } => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": "unauthorized", "message": message }),
            ),
            Self::NotFound { resource, id } => (
                StatusCode::NOT_FOUND,
                json!({
                    "error": "not_found",
                    "message": format!("{} '{}' not found", resource, id)
                }),
            ),
            Self::Conflict { message } => (
                StatusCode::CONFLICT,
                json!({ "error": "conflict", "message": message }),
            ),
            Self::PayloadTooLarge { message } => (
                StatusCode::PAYLOAD_TOO_LARGE,
                json!({ "error": "payload_too_large", "message": message }),
            ),
            Self::UpstreamUnavailable { message } => (
                StatusCode::SERVICE_UNAVAILABLE,
                json!({ "error": "upstream_unavailable", "message": message }),
            ),
            Self::Database(e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "internal_error", "message": "an internal error occurred" }),
                )
            }
            Self::Internal { message } => {
                tracing::error!("Internal error: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "internal_error", "message": "an internal error occurred" }),
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        let mut response = (status, Json(body)).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, header::HeaderValue::from_static("Bearer"));
        }
        response
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound { resource, id } => Self::NotFound { resource, id },
            DbError::Conflict { resource, reason } => Self::Conflict {
                message: format!("{resource} {reason}"),
            },
            _ => Self::Database(e),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        if e.is_unauthorized() {
            Self::Unauthorized {
                message: e.to_string(),
            }
        } else {
            Self::internal(e.to_string())
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::InvalidExtension => Self::Validation(ValidationError::InvalidFormat {
                field: "file",
                reason: "allowed types: jpg, jpeg, png, webp",
            }),
            StorageError::NotAnImage => Self::Validation(ValidationError::InvalidFormat {
                field: "file",
                reason: "file must be an image",
            }),
            StorageError::InvalidFilename(name) => Self::Validation(ValidationError::InvalidVariant {
                field: "filename",
                value: name,
            }),
            StorageError::TooLarge { .. } => Self::PayloadTooLarge {
                message: e.to_string(),
            },
            StorageError::Io(_) => Self::internal(e.to_string()),
        }
    }
}

impl From<WeatherError> for ApiError {
    fn from(e: WeatherError) -> Self {
        tracing::warn!(error = %e, "Weather lookup failed");
        Self::UpstreamUnavailable {
            message: e.to_string(),
        }
    }
}
