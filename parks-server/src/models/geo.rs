//! Geographic coordinates

use serde::{Deserialize, Serialize};

use super::validation::in_range;
use super::ValidationError;

/// WGS84 latitude/longitude pair, validated on construction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, ValidationError> {
        Ok(Self {
            latitude: in_range("latitude", latitude, -90.0, 90.0)?,
            longitude: in_range("longitude", longitude, -180.0, 180.0)?,
        })
    }

    /// Build from an optional pair; both halves must be present or absent.
    pub fn from_optional(
        latitude: Option<f64>,
        longitude: Option<f64>,
    ) -> Result<Option<Self>, ValidationError> {
        match (latitude, longitude) {
            (Some(lat), Some(lng)) => Self::new(lat, lng).map(Some),
            (None, None) => Ok(None),
            _ => Err(ValidationError::InvalidFormat {
                field: "coordinates",
                reason: "latitude and longitude must be given together",
            }),
        }
    }
}
