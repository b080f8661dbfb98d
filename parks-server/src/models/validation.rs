//! Validation error types and text helpers

use std::fmt;

/// Validation error for domain values and request bodies
#[derive(Debug, Clone)]
pub enum ValidationError {
    /// Field is empty when it shouldn't be
    Empty { field: &'static str },

    /// Field exceeds maximum length
    TooLong { field: &'static str, max: usize },

    /// String doesn't match required format
    InvalidFormat { field: &'static str, reason: &'static str },

    /// Invalid enum variant
    InvalidVariant { field: &'static str, value: String },

    /// Numeric value outside its allowed range
    OutOfRange { field: &'static str, min: f64, max: f64 },

    /// Request body could not be decoded
    Malformed { reason: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty { field } => write!(f, "{} cannot be empty", field),
            Self::TooLong { field, max } => {
                write!(f, "{} exceeds maximum length of {} characters", field, max)
            }
            Self::InvalidFormat { field, reason } => {
                write!(f, "{}: {}", field, reason)
            }
            Self::InvalidVariant { field, value } => {
                write!(f, "invalid {} value: '{}'", field, value)
            }
            Self::OutOfRange { field, min, max } => {
                write!(f, "{} must be between {} and {}", field, min, max)
            }
            Self::Malformed { reason } => write!(f, "malformed request: {}", reason),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Default maximum length for names and titles
pub const MAX_NAME_LEN: usize = 200;

/// Trim a required text field, rejecting empty or oversized values.
pub fn required_text(
    field: &'static str,
    value: &str,
    max: usize,
) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty { field });
    }
    if trimmed.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(trimmed.to_owned())
}

/// Like [`required_text`] for fields that may be absent.
pub fn optional_text(
    field: &'static str,
    value: Option<&str>,
    max: usize,
) -> Result<Option<String>, ValidationError> {
    value.map(|v| required_text(field, v, max)).transpose()
}

/// Reject values outside `min..=max` (NaN included).
pub fn in_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<f64, ValidationError> {
    if value.is_finite() && value >= min && value <= max {
        Ok(value)
    } else {
        Err(ValidationError::OutOfRange { field, min, max })
    }
}

/// Reject zero, negative, and non-finite values.
pub fn positive(field: &'static str, value: f64) -> Result<f64, ValidationError> {
    in_range(field, value, f64::MIN_POSITIVE, f64::MAX)
}
