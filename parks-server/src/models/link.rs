//! Park/species link annotations

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ValidationError;

/// How likely a visitor is to spot a species in a given park
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum SightingProbability {
    High,
    Medium,
    Low,
}

impl FromStr for SightingProbability {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            _ => Err(ValidationError::InvalidVariant {
                field: "sighting_probability",
                value: s.to_owned(),
            }),
        }
    }
}
