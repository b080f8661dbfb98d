//! Repository implementations for database access
//!
//! Each repository follows these patterns:
//! - Multi-step writes run in one transaction
//! - Set-valued lookups use batched `IN (...)` queries (no N+1)
//! - Link rows are only touched through [`links`]

pub mod badges;
pub mod links;
pub mod parks;
pub mod reviews;
pub mod sightings;
pub mod species;
pub mod trails;

pub use badges::{Badge, BadgeRepo, NewBadge};
pub use links::{LinkAnnotations, LinkDiff, LinkRepo, ParkSpecies};
pub use parks::{NewPark, Park, ParkDetails, ParkFilter, ParkPatch, ParkRepo};
pub use reviews::{NewReview, Review, ReviewRepo};
pub use sightings::{NewSighting, Sighting, SightingFilter, SightingRepo};
pub use species::{
    NewSpecies, Species, SpeciesDetails, SpeciesFilter, SpeciesPatch, SpeciesRepo, SpeciesWithParks,
};
pub use trails::{NewTrail, Trail, TrailPatch, TrailRepo};

/// `LIKE` pattern matching `search` anywhere in a `LOWER(column)`.
///
/// Pair with `ESCAPE '\'`: `%`, `_` and `\` in the search text match
/// literally. SQLite's `LOWER` folds ASCII only, so the search text is
/// folded the same way and accented capitals match only themselves.
pub(crate) fn contains_pattern(search: &str) -> String {
    let mut pattern = String::with_capacity(search.len() + 2);
    pattern.push('%');
    for c in search.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c.to_ascii_lowercase());
    }
    pattern.push('%');
    pattern
}

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("not found: {resource} '{id}'")]
    NotFound { resource: &'static str, id: String },

    #[error("conflict: {resource} {reason}")]
    Conflict {
        resource: &'static str,
        reason: String,
    },
}

impl DbError {
    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    /// Translate a unique-constraint violation into `Conflict`.
    pub(crate) fn unique_or(resource: &'static str, reason: &str, err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => Self::Conflict {
                resource,
                reason: reason.to_owned(),
            },
            _ => Self::Sqlx(err),
        }
    }
}

/// Fail with NotFound unless a row with `id` exists in `table`.
pub(crate) async fn ensure_exists(
    conn: &mut sqlx::SqliteConnection,
    table: &'static str,
    resource: &'static str,
    id: i64,
) -> Result<(), DbError> {
    // `table` is always a literal from this crate
    let sql = format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = ?)");
    let (exists,): (bool,) = sqlx::query_as(&sql).bind(id).fetch_one(&mut *conn).await?;
    if exists {
        Ok(())
    } else {
        Err(DbError::not_found(resource, id))
    }
}
