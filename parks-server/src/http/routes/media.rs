//! Image upload endpoints (multipart, field `file`)

use std::sync::Arc;

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, Path, State,
    },
    http::StatusCode,
    routing::{delete, post},
    Json, Router,
};

use super::parks::ParkResponse;
use crate::db::repos::{ParkRepo, SpeciesRepo, SpeciesWithParks};
use crate::http::error::ApiError;
use crate::http::extractors::{parse_id, AdminUser, IdPath};
use crate::http::server::AppState;
use crate::models::ValidationError;
use crate::services::{Bucket, Upload};

const FILE_FIELD: &str = "file";

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge {
            message: e.body_text(),
        }
    } else {
        ApiError::Validation(ValidationError::Malformed {
            reason: e.body_text(),
        })
    }
}

/// Pull the `file` field out of a multipart body.
async fn read_upload(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Upload, ApiError> {
    let mut multipart = multipart.map_err(|rejection| {
        ApiError::Validation(ValidationError::Malformed {
            reason: rejection.body_text(),
        })
    })?;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let original_name = field.file_name().unwrap_or_default().to_owned();
        let content_type = field.content_type().unwrap_or_default().to_owned();
        let bytes = field.bytes().await.map_err(multipart_error)?;
        return Ok(Upload {
            original_name,
            content_type,
            bytes: bytes.to_vec(),
        });
    }

    Err(ApiError::Validation(ValidationError::Empty { field: FILE_FIELD }))
}

/// POST /parks/{id}/images - append an image to the park
async fn upload_park_image(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    IdPath(id): IdPath,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<ParkResponse>), ApiError> {
    let repo = ParkRepo::new(&state.pool);
    repo.get(id).await?;

    let upload = read_upload(multipart).await?;
    let filename = state.storage.save(Bucket::Parks, upload).await?;

    match repo.add_image(id, &filename).await {
        Ok(park) => Ok((StatusCode::CREATED, Json(ParkResponse::new(park, &state)))),
        Err(e) => {
            // Park vanished between the check and the write
            let _ = state.storage.delete(Bucket::Parks, &filename).await;
            Err(e.into())
        }
    }
}

/// DELETE /parks/{id}/images/{filename}
async fn delete_park_image(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path((id, filename)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id("id", &id)?;
    ParkRepo::new(&state.pool).remove_image(id, &filename).await?;
    state.storage.delete(Bucket::Parks, &filename).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /species/{id}/image - replace the species image
async fn upload_species_image(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    IdPath(id): IdPath,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<SpeciesWithParks>, ApiError> {
    let repo = SpeciesRepo::new(&state.pool);
    repo.get(id).await?;

    let upload = read_upload(multipart).await?;
    let filename = state.storage.save(Bucket::Species, upload).await?;
    let url = state.storage.url_for(Bucket::Species, &filename);

    let previous = match repo.set_image(id, &url).await {
        Ok(previous) => previous,
        Err(e) => {
            let _ = state.storage.delete(Bucket::Species, &filename).await;
            return Err(e.into());
        }
    };
    if let Some(old) = previous.and_then(|p| state.storage.stored_filename(Bucket::Species, &p)) {
        if let Err(e) = state.storage.delete(Bucket::Species, &old).await {
            tracing::warn!(species_id = id, filename = %old, error = %e, "Failed to delete replaced image");
        }
    }

    Ok(Json(repo.get(id).await?))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/parks/{id}/images", post(upload_park_image))
        .route("/parks/{id}/images/{filename}", delete(delete_park_image))
        .route("/species/{id}/image", post(upload_species_image))
}
