//! Common validation utilities.

use validator::ValidationError;

lazy_static::lazy_static! {
    /// Matches a non-empty string made only of ASCII digits.
    pub static ref DIGITS_REGEX: regex::Regex = regex::Regex::new(r"^[0-9]+$").unwrap();
}

/// Validates that a value is a non-empty run of decimal digits.
pub fn validate_digits(value: &str) -> Result<(), ValidationError> {
    if DIGITS_REGEX.is_match(value) {
        Ok(())
    } else {
        let mut err = ValidationError::new("digits_only");
        err.message = Some("Value must contain only decimal digits".into());
        Err(err)
    }
}

/// Validates that a value is empty or made only of decimal digits.
pub fn validate_optional_digits(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        Ok(())
    } else {
        validate_digits(value)
    }
}

/// Validates that a text field holds something other than whitespace.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Value cannot be blank".into());
        Err(err)
    } else {
        Ok(())
    }
}
