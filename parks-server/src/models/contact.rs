//! Park contact details

use once_cell::sync::Lazy;
use regex::Regex;

use super::ValidationError;

/// Loose address shape: something@domain.tld, no whitespace
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("invalid email regex"));

/// Digits with optional leading +, spaces, dots and dashes (e.g. "+216 72 123 456")
static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9][0-9 .-]{5,19}$").expect("invalid phone regex"));

pub fn contact_email(value: &str) -> Result<String, ValidationError> {
    let value = value.trim();
    if EMAIL_RE.is_match(value) {
        Ok(value.to_owned())
    } else {
        Err(ValidationError::InvalidFormat {
            field: "contact_email",
            reason: "must be an email address",
        })
    }
}

pub fn contact_phone(value: &str) -> Result<String, ValidationError> {
    let value = value.trim();
    if PHONE_RE.is_match(value) {
        Ok(value.to_owned())
    } else {
        Err(ValidationError::InvalidFormat {
            field: "contact_phone",
            reason: "must contain digits, spaces, dots or dashes",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails() {
        assert!(contact_email("parc.ichkeul@environnement.gov.tn").is_ok());
        assert!(contact_email("not an email").is_err());
        assert!(contact_email("missing@tld").is_err());
    }

    #[test]
    fn phones() {
        assert_eq!(contact_phone(" +216 72 123 456 ").unwrap(), "+216 72 123 456");
        assert!(contact_phone("call us").is_err());
    }
}
