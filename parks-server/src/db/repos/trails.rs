//! Trail repository

use serde::Serialize;
use sqlx::types::Json;
use sqlx::{FromRow, SqlitePool};

use super::{ensure_exists, DbError};
use crate::models::{Difficulty, TrailType};

/// Trail record from database
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Trail {
    pub id: i64,
    pub park_id: i64,
    pub name: String,
    pub description: String,
    pub difficulty: Difficulty,
    pub length_km: f64,
    pub duration_hours: f64,
    pub elevation_gain: Option<i64>,
    pub trail_type: TrailType,
    pub surface: Option<String>,
    pub gpx_data: Option<String>,
    pub waypoints: Json<Vec<String>>,
    pub highlights: Json<Vec<String>>,
}

/// Validated input for a new trail
#[derive(Debug, Clone)]
pub struct NewTrail {
    pub name: String,
    pub description: String,
    pub difficulty: Difficulty,
    pub length_km: f64,
    pub duration_hours: f64,
    pub elevation_gain: Option<i64>,
    pub trail_type: TrailType,
    pub surface: Option<String>,
    pub gpx_data: Option<String>,
    pub waypoints: Vec<String>,
    pub highlights: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct TrailPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub length_km: Option<f64>,
    pub duration_hours: Option<f64>,
    pub elevation_gain: Option<i64>,
    pub trail_type: Option<TrailType>,
    pub surface: Option<String>,
    pub gpx_data: Option<String>,
    pub waypoints: Option<Vec<String>>,
    pub highlights: Option<Vec<String>>,
}

pub struct TrailRepo<'a> {
    pool: &'a SqlitePool,
}

impl<'a> TrailRepo<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Trails of one park, shortest first. NotFound if the park is missing.
    pub async fn list_for_park(&self, park_id: i64) -> Result<Vec<Trail>, DbError> {
        let mut conn = self.pool.acquire().await?;
        ensure_exists(&mut conn, "parks", "park", park_id).await?;

        let trails = sqlx::query_as::<_, Trail>(
            "SELECT * FROM trails WHERE park_id = ? ORDER BY length_km, id",
        )
        .bind(park_id)
        .fetch_all(&mut *conn)
        .await?;
        Ok(trails)
    }

    pub async fn get(&self, id: i64) -> Result<Trail, DbError> {
        sqlx::query_as::<_, Trail>("SELECT * FROM trails WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("trail", id))
    }

    pub async fn create(&self, park_id: i64, new: NewTrail) -> Result<Trail, DbError> {
        let mut tx = self.pool.begin().await?;
        ensure_exists(&mut tx, "parks", "park", park_id).await?;

        let trail = sqlx::query_as::<_, Trail>(
            r#"
            INSERT INTO trails (
                park_id, name, description, difficulty, length_km, duration_hours,
                elevation_gain, trail_type, surface, gpx_data, waypoints, highlights
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(park_id)
        .bind(new.name)
        .bind(new.description)
        .bind(new.difficulty)
        .bind(new.length_km)
        .bind(new.duration_hours)
        .bind(new.elevation_gain)
        .bind(new.trail_type)
        .bind(new.surface)
        .bind(new.gpx_data)
        .bind(Json(new.waypoints))
        .bind(Json(new.highlights))
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        tracing::info!(trail_id = trail.id, park_id, "Created trail");
        Ok(trail)
    }

    pub async fn update(&self, id: i64, patch: TrailPatch) -> Result<Trail, DbError> {
        sqlx::query_as::<_, Trail>(
            r#"
            UPDATE trails SET
                name = COALESCE(?, name),
                description = COALESCE(?, description),
                difficulty = COALESCE(?, difficulty),
                length_km = COALESCE(?, length_km),
                duration_hours = COALESCE(?, duration_hours),
                elevation_gain = COALESCE(?, elevation_gain),
                trail_type = COALESCE(?, trail_type),
                surface = COALESCE(?, surface),
                gpx_data = COALESCE(?, gpx_data),
                waypoints = COALESCE(?, waypoints),
                highlights = COALESCE(?, highlights)
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(patch.name)
        .bind(patch.description)
        .bind(patch.difficulty)
        .bind(patch.length_km)
        .bind(patch.duration_hours)
        .bind(patch.elevation_gain)
        .bind(patch.trail_type)
        .bind(patch.surface)
        .bind(patch.gpx_data)
        .bind(patch.waypoints.map(Json))
        .bind(patch.highlights.map(Json))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("trail", id))
    }

    pub async fn delete(&self, id: i64) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM trails WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::not_found("trail", id));
        }
        Ok(())
    }
}
