//! Trail and park difficulty vocabularies

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ValidationError;

/// Effort level shared by parks and trails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
pub enum Difficulty {
    #[serde(rename = "facile")]
    #[sqlx(rename = "facile")]
    Easy,
    #[serde(rename = "modéré", alias = "modere")]
    #[sqlx(rename = "modéré")]
    Moderate,
    #[serde(rename = "difficile")]
    #[sqlx(rename = "difficile")]
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "facile",
            Self::Moderate => "modéré",
            Self::Hard => "difficile",
        }
    }
}

impl FromStr for Difficulty {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "facile" => Ok(Self::Easy),
            "modéré" | "modere" => Ok(Self::Moderate),
            "difficile" => Ok(Self::Hard),
            _ => Err(ValidationError::InvalidVariant {
                field: "difficulty",
                value: s.to_owned(),
            }),
        }
    }
}

/// Route shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum TrailType {
    Loop,
    OutAndBack,
    PointToPoint,
}

impl FromStr for TrailType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "loop" => Ok(Self::Loop),
            "out_and_back" => Ok(Self::OutAndBack),
            "point_to_point" => Ok(Self::PointToPoint),
            _ => Err(ValidationError::InvalidVariant {
                field: "trail_type",
                value: s.to_owned(),
            }),
        }
    }
}
