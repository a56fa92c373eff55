//! # Request Validation Helpers
//!
//! Utilities for validating incoming request data using the `validator` crate.
//!
//! ## Overview
//!
//! | Component | Purpose |
//! |-----------|---------|
//! | [`validate_request`] | Validate a struct implementing `Validate` |
//! | [`parse_and_validate`] | Parse JSON and validate in one step |
//! | [`validators`] | Custom validation functions for the platform's own DTOs |
//!
//! ## Custom Validators
//!
//! | Validator | Purpose |
//! |-----------|---------|
//! | `not_blank` | String is not empty after trimming |
//! | `valid_username` | 3-20 chars, alphanumeric + underscore |
//! | `valid_new_password` | length ≥ 8, at least one letter and one digit |
//! | `valid_recognized_topic` | topic is one of the fixed set or "Mixed" (Glossary) |

use crate::errors::ApiError;
use serde::de::DeserializeOwned;
use validator::Validate;

/// Validates a request DTO that implements `Validate`.
///
/// Returns `ApiError::ValidationError` with field-level details if validation
/// fails.
pub fn validate_request<T: Validate>(data: &T) -> Result<(), ApiError> {
    data.validate().map_err(ApiError::ValidationError)
}

/// Parses JSON string and validates in a single step.
pub fn parse_and_validate<T: DeserializeOwned + Validate>(json: &str) -> Result<T, ApiError> {
    let data: T = serde_json::from_str(json)
        .map_err(|e| ApiError::InvalidInput { message: e.to_string() })?;

    validate_request(&data)?;

    Ok(data)
}

/// Custom validation functions for use with `#[validate(custom(...))]`.
pub mod validators {
    use validator::ValidationError;

    /// Validates that a string is not blank (empty or whitespace-only).
    pub fn not_blank(value: &str) -> Result<(), ValidationError> {
        if value.trim().is_empty() {
            return Err(ValidationError::new("blank"));
        }
        Ok(())
    }

    /// Validates the username pattern: 3-20 chars, alphanumeric plus
    /// underscore, case-sensitive (the validator only checks shape; the
    /// uniqueness constraint is enforced by the store).
    pub fn valid_username(value: &str) -> Result<(), ValidationError> {
        let len = value.chars().count();
        if !(3..=20).contains(&len) {
            return Err(ValidationError::new("invalid_username"));
        }
        if !value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(ValidationError::new("invalid_username"));
        }
        Ok(())
    }

    /// Validates the password-strength rule: length ≥ 8, at least
    /// one letter and one digit. No uppercase/symbol requirement, unlike a
    /// stricter policy - this platform only authenticates learners, not staff.
    pub fn valid_new_password(value: &str) -> Result<(), ValidationError> {
        if value.chars().count() < 8 {
            return Err(ValidationError::new("weak_password"));
        }
        let has_letter = value.chars().any(|c| c.is_alphabetic());
        let has_digit = value.chars().any(|c| c.is_ascii_digit());
        if !has_letter || !has_digit {
            return Err(ValidationError::new("weak_password"));
        }
        Ok(())
    }

    /// Validates a topic name against the fixed set of the Glossary, plus
    /// "Mixed".
    pub fn valid_recognized_topic(value: &str) -> Result<(), ValidationError> {
        const RECOGNIZED: [&str; 6] = [
            "Grammar",
            "Vocabulary",
            "Reading",
            "Tenses",
            "Pronunciation",
            "Mixed",
        ];
        if RECOGNIZED.contains(&value) {
            Ok(())
        } else {
            Err(ValidationError::new("invalid_topic"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::validators::*;

    #[test]
    fn test_not_blank() {
        assert!(not_blank("hello").is_ok());
        assert!(not_blank("").is_err());
        assert!(not_blank("   ").is_err());
    }

    #[test]
    fn test_valid_username_accepts_spec_shape() {
        assert!(valid_username("test_435").is_ok());
        assert!(valid_username("abc").is_ok());
        assert!(valid_username("a".repeat(20).as_str()).is_ok());
    }

    #[test]
    fn test_valid_username_rejects_bad_shape() {
        assert!(valid_username("ab").is_err()); // too short
        assert!(valid_username(&"a".repeat(21)).is_err()); // too long
        assert!(valid_username("bad name").is_err()); // space
        assert!(valid_username("bad-name").is_err()); // hyphen
    }

    #[test]
    fn test_valid_new_password_accepts_letter_and_digit() {
        assert!(valid_new_password("abcd1234").is_ok());
        assert!(valid_new_password("password1").is_ok());
    }

    #[test]
    fn test_valid_new_password_rejects_weak() {
        assert!(valid_new_password("short1").is_err()); // < 8 chars
        assert!(valid_new_password("alllettersnodigits").is_err());
        assert!(valid_new_password("12345678").is_err()); // no letters
    }

    #[test]
    fn test_valid_recognized_topic() {
        assert!(valid_recognized_topic("Grammar").is_ok());
        assert!(valid_recognized_topic("Mixed").is_ok());
        assert!(valid_recognized_topic("Math").is_err());
    }
}
