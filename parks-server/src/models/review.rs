//! Review star rating

use serde::Serialize;

use super::ValidationError;

/// Star rating, 1 to 5 inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Rating(u8);

impl Rating {
    pub const MIN: i64 = 1;
    pub const MAX: i64 = 5;

    pub fn new(value: i64) -> Result<Self, ValidationError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(ValidationError::OutOfRange {
                field: "rating",
                min: Self::MIN as f64,
                max: Self::MAX as f64,
            })
        }
    }

    pub fn get(&self) -> i64 {
        i64::from(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds() {
        assert!(Rating::new(0).is_err());
        assert_eq!(Rating::new(1).unwrap().get(), 1);
        assert_eq!(Rating::new(5).unwrap().get(), 5);
        assert!(Rating::new(6).is_err());
    }
}
