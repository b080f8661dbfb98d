//! Park/species association manager
//!
//! `park_species` is the only carrier of the many-to-many relationship.
//! Species create/update/delete call the connection-level helpers below
//! from inside their own transaction, so link changes commit or roll back
//! together with the species row.
//!
//! Park ids that do not resolve to an existing park are dropped silently
//! on create and update; only the addressed species or park can produce
//! NotFound.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection, SqlitePool};

use super::species::Species;
use super::{ensure_exists, DbError};
use crate::models::SightingProbability;

/// Changes needed to turn one link set into another.
///
/// Both vectors are sorted ascending and never share an id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkDiff {
    pub to_add: Vec<i64>,
    pub to_remove: Vec<i64>,
}

impl LinkDiff {
    pub fn compute(current: &BTreeSet<i64>, desired: &BTreeSet<i64>) -> Self {
        Self {
            to_add: desired.difference(current).copied().collect(),
            to_remove: current.difference(desired).copied().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

/// Optional per-link annotations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinkAnnotations {
    pub population_estimate: Option<String>,
    pub sighting_probability: Option<SightingProbability>,
    #[serde(default)]
    pub best_spots: Vec<String>,
}

/// A species as seen from one park, with that link's annotations
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ParkSpecies {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub species: Species,
    pub population_estimate: Option<String>,
    pub sighting_probability: Option<SightingProbability>,
    pub best_spots: Json<Vec<String>>,
}

/// Most ids bound into one statement. SQLite caps bound parameters per
/// statement (32766 on current builds, 999 on old ones).
pub(crate) const MAX_IDS_PER_QUERY: usize = 500;

/// Subset of `requested` that names existing parks.
///
/// One `IN` query per [`MAX_IDS_PER_QUERY`] distinct ids.
pub(crate) async fn resolve_park_ids(
    conn: &mut SqliteConnection,
    requested: &[i64],
) -> Result<BTreeSet<i64>, DbError> {
    let unique: Vec<i64> = requested
        .iter()
        .copied()
        .collect::<BTreeSet<i64>>()
        .into_iter()
        .collect();

    let mut resolved = BTreeSet::new();
    for chunk in unique.chunks(MAX_IDS_PER_QUERY) {
        let mut builder = QueryBuilder::<Sqlite>::new("SELECT id FROM parks WHERE id IN (");
        let mut ids = builder.separated(", ");
        for id in chunk {
            ids.push_bind(*id);
        }
        ids.push_unseparated(")");

        let rows: Vec<(i64,)> = builder.build_query_as().fetch_all(&mut *conn).await?;
        resolved.extend(rows.into_iter().map(|(id,)| id));
    }

    if resolved.len() != unique.len() {
        let dropped = unique.len() - resolved.len();
        tracing::debug!(dropped, "Ignoring park ids that do not exist");
    }
    Ok(resolved)
}

/// Current park ids linked to one species.
pub(crate) async fn park_ids_of(
    conn: &mut SqliteConnection,
    species_id: i64,
) -> Result<BTreeSet<i64>, DbError> {
    let rows: Vec<(i64,)> = sqlx::query_as("SELECT park_id FROM park_species WHERE species_id = ?")
        .bind(species_id)
        .fetch_all(&mut *conn)
        .await?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

async fn insert_links(
    conn: &mut SqliteConnection,
    species_id: i64,
    park_ids: &[i64],
) -> Result<(), DbError> {
    // Two parameters per row
    for chunk in park_ids.chunks(MAX_IDS_PER_QUERY / 2) {
        let mut builder =
            QueryBuilder::<Sqlite>::new("INSERT OR IGNORE INTO park_species (park_id, species_id) ");
        builder.push_values(chunk, |mut row, park_id| {
            row.push_bind(*park_id).push_bind(species_id);
        });
        builder.build().execute(&mut *conn).await?;
    }
    Ok(())
}

async fn delete_links(
    conn: &mut SqliteConnection,
    species_id: i64,
    park_ids: &[i64],
) -> Result<(), DbError> {
    for chunk in park_ids.chunks(MAX_IDS_PER_QUERY) {
        let mut builder =
            QueryBuilder::<Sqlite>::new("DELETE FROM park_species WHERE species_id = ");
        builder.push_bind(species_id);
        builder.push(" AND park_id IN (");
        let mut ids = builder.separated(", ");
        for id in chunk {
            ids.push_bind(*id);
        }
        ids.push_unseparated(")");
        builder.build().execute(&mut *conn).await?;
    }
    Ok(())
}

/// Link a freshly inserted species to the valid subset of `requested`.
///
/// Returns the linked park ids, ascending.
pub(crate) async fn link_new_species(
    conn: &mut SqliteConnection,
    species_id: i64,
    requested: &[i64],
) -> Result<Vec<i64>, DbError> {
    let resolved: Vec<i64> = resolve_park_ids(conn, requested).await?.into_iter().collect();
    insert_links(conn, species_id, &resolved).await?;
    Ok(resolved)
}

/// Full-replace: afterwards the species is linked to exactly the valid
/// subset of `requested`. Existing annotations survive on links that stay.
pub(crate) async fn replace_species_parks(
    conn: &mut SqliteConnection,
    species_id: i64,
    requested: &[i64],
) -> Result<LinkDiff, DbError> {
    let desired = resolve_park_ids(conn, requested).await?;
    let current = park_ids_of(conn, species_id).await?;
    let diff = LinkDiff::compute(&current, &desired);

    delete_links(conn, species_id, &diff.to_remove).await?;
    insert_links(conn, species_id, &diff.to_add).await?;

    tracing::debug!(
        species_id,
        added = ?diff.to_add,
        removed = ?diff.to_remove,
        "Reconciled species park links"
    );
    Ok(diff)
}

/// Remove every link of a species. Returns the number of rows removed.
pub(crate) async fn unlink_species(
    conn: &mut SqliteConnection,
    species_id: i64,
) -> Result<u64, DbError> {
    let result = sqlx::query("DELETE FROM park_species WHERE species_id = ?")
        .bind(species_id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}

/// Remove every link of a park. Returns the number of rows removed.
pub(crate) async fn unlink_park(conn: &mut SqliteConnection, park_id: i64) -> Result<u64, DbError> {
    let result = sqlx::query("DELETE FROM park_species WHERE park_id = ?")
        .bind(park_id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}

/// Batched fan-out: species id → ascending park ids.
///
/// Every requested species appears in the map, unlinked ones with an empty
/// vector.
pub(crate) async fn park_ids_for(
    conn: &mut SqliteConnection,
    species_ids: &[i64],
) -> Result<BTreeMap<i64, Vec<i64>>, DbError> {
    let mut map: BTreeMap<i64, Vec<i64>> =
        species_ids.iter().map(|id| (*id, Vec::new())).collect();
    let keys: Vec<i64> = map.keys().copied().collect();

    // A species lands in exactly one chunk, so per-species order holds
    for chunk in keys.chunks(MAX_IDS_PER_QUERY) {
        let mut builder = QueryBuilder::<Sqlite>::new(
            "SELECT species_id, park_id FROM park_species WHERE species_id IN (",
        );
        let mut ids = builder.separated(", ");
        for id in chunk {
            ids.push_bind(*id);
        }
        ids.push_unseparated(") ORDER BY species_id, park_id");

        let rows: Vec<(i64, i64)> = builder.build_query_as().fetch_all(&mut *conn).await?;
        for (species_id, park_id) in rows {
            map.entry(species_id).or_default().push(park_id);
        }
    }
    Ok(map)
}

/// Pool-level access to the association table
pub struct LinkRepo<'a> {
    pool: &'a SqlitePool,
}

impl<'a> LinkRepo<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Park ids for many species in one query.
    pub async fn park_ids_for(&self, species_ids: &[i64]) -> Result<BTreeMap<i64, Vec<i64>>, DbError> {
        let mut conn = self.pool.acquire().await?;
        park_ids_for(&mut conn, species_ids).await
    }

    /// Species linked to a park, with link annotations.
    ///
    /// NotFound if the park does not exist; an existing park with no links
    /// yields an empty list.
    pub async fn list_for_park(&self, park_id: i64) -> Result<Vec<ParkSpecies>, DbError> {
        let mut conn = self.pool.acquire().await?;
        ensure_exists(&mut conn, "parks", "park", park_id).await?;

        let species = sqlx::query_as::<_, ParkSpecies>(
            r#"
            SELECT s.*, ps.population_estimate, ps.sighting_probability, ps.best_spots
            FROM park_species ps
            JOIN species s ON s.id = ps.species_id
            WHERE ps.park_id = ?
            ORDER BY s.name, s.id
            "#,
        )
        .bind(park_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(species)
    }

    /// Replace the annotations of an existing link.
    pub async fn set_annotations(
        &self,
        park_id: i64,
        species_id: i64,
        annotations: LinkAnnotations,
    ) -> Result<ParkSpecies, DbError> {
        let updated = sqlx::query(
            r#"
            UPDATE park_species
            SET population_estimate = ?, sighting_probability = ?, best_spots = ?
            WHERE park_id = ? AND species_id = ?
            "#,
        )
        .bind(annotations.population_estimate)
        .bind(annotations.sighting_probability)
        .bind(Json(annotations.best_spots))
        .bind(park_id)
        .bind(species_id)
        .execute(self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(DbError::not_found(
                "park species link",
                format!("{park_id}/{species_id}"),
            ));
        }

        let link = sqlx::query_as::<_, ParkSpecies>(
            r#"
            SELECT s.*, ps.population_estimate, ps.sighting_probability, ps.best_spots
            FROM park_species ps
            JOIN species s ON s.id = ps.species_id
            WHERE ps.park_id = ? AND ps.species_id = ?
            "#,
        )
        .bind(park_id)
        .bind(species_id)
        .fetch_one(self.pool)
        .await?;

        Ok(link)
    }
}
