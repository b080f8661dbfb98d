//! Species taxonomy kind

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ValidationError;

/// Flora or fauna. Stored as lowercase text in `species.type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum SpeciesType {
    Animal,
    Plant,
}

impl SpeciesType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Animal => "animal",
            Self::Plant => "plant",
        }
    }
}

impl FromStr for SpeciesType {
    type Err = ValidationError;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "animal" => Ok(Self::Animal),
            "plant" => Ok(Self::Plant),
            _ => Err(ValidationError::InvalidVariant {
                field: "type",
                value: s.to_owned(),
            }),
        }
    }
}

impl fmt::Display for SpeciesType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
