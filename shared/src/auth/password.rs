//! # Password Hashing with Argon2id
//!
//! Secure password storage using the Argon2id algorithm.
//!
//! ## Security Parameters (OWASP Recommended)
//!
//! | Parameter | Value | Purpose |
//! |-----------|-------|---------|
//! | Memory | 64 MiB | Makes attacks expensive (GPU memory) |
//! | Iterations | 3 | Time cost (slows brute force) |
//! | Parallelism | 4 | CPU lanes (matches typical cores) |
//! | Output | 32 bytes | Hash length |
//!
//! The PHC string format is self-describing:
//!
//! ```text
//! $argon2id$v=19$m=65536,t=3,p=4$<salt>$<hash>
//! ```
//!
//! permits plain SHA-256 + per-user salt as the minimum acceptable
//! implementation; Argon2id is used here instead as a stronger KDF over the
//! same `hash(salt ‖ password)` shape, consistent with the PBKDF-family
//! recommendation.

use crate::errors::ApiError;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

/// Secure password hashing service using Argon2id.
///
/// `Clone`, `Send + Sync`; safe for concurrent use. Each hash operation
/// generates a new random salt.
#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordHasher {
    /// Creates a new hasher with OWASP-recommended parameters.
    pub fn new() -> Self {
        let params = Params::new(64 * 1024, 3, 4, None).expect("Invalid Argon2 params");
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        Self { argon2 }
    }

    /// Hashes a password for secure storage, returning a PHC string.
    pub fn hash(&self, password: &str) -> Result<String, ApiError> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| ApiError::Internal {
                message: format!("password hashing failed: {}", e),
            })
    }

    /// Verifies a password against a stored PHC hash in constant time.
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, ApiError> {
        let parsed_hash = PasswordHash::new(hash).map_err(|e| ApiError::Internal {
            message: format!("invalid password hash format: {}", e),
        })?;

        match self.argon2.verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(ApiError::Internal {
                message: format!("password verification failed: {}", e),
            }),
        }
    }
}

impl std::fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHasher").finish_non_exhaustive()
    }
}

/// Validates password strength before hashing: length >= 8 and contains at
/// least one letter and one digit. No case/symbol requirement — this is
/// the full strength bar required for learner accounts.
pub struct PasswordValidator;

impl PasswordValidator {
    pub fn validate(password: &str) -> Result<(), Vec<&'static str>> {
        let mut errors = Vec::new();

        if password.chars().count() < 8 {
            errors.push("Password must be at least 8 characters long");
        }
        if !password.chars().any(|c| c.is_alphabetic()) {
            errors.push("Password must contain at least one letter");
        }
        if !password.chars().any(|c| c.is_ascii_digit()) {
            errors.push("Password must contain at least one digit");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_correct_password() {
        let hasher = PasswordHasher::new();
        let password = "abcd1234";

        let hash = hasher.hash(password).unwrap();

        assert_ne!(hash, password);
        assert!(hasher.verify(password, &hash).unwrap());
    }

    #[test]
    fn test_verify_wrong_password() {
        let hasher = PasswordHasher::new();
        let hash = hasher.hash("abcd1234").unwrap();

        assert!(!hasher.verify("wrongpass1", &hash).unwrap());
    }

    #[test]
    fn test_different_hashes_for_same_password() {
        let hasher = PasswordHasher::new();
        let password = "abcd1234";

        let hash1 = hasher.hash(password).unwrap();
        let hash2 = hasher.hash(password).unwrap();

        assert_ne!(hash1, hash2);
        assert!(hasher.verify(password, &hash1).unwrap());
        assert!(hasher.verify(password, &hash2).unwrap());
    }

    #[test]
    fn test_hash_is_phc_format() {
        let hasher = PasswordHasher::new();
        let hash = hasher.hash("abcd1234").unwrap();

        assert!(hash.starts_with("$argon2id$"));
    }

    #[test]
    fn test_password_validator_accepts_spec_minimum() {
        assert!(PasswordValidator::validate("abcd1234").is_ok());
        assert!(PasswordValidator::validate("password1").is_ok());
    }

    #[test]
    fn test_password_validator_too_short() {
        let result = PasswordValidator::validate("abc123");
        assert!(result.is_err());
        assert!(result.unwrap_err().contains(&"Password must be at least 8 characters long"));
    }

    #[test]
    fn test_password_validator_missing_digit() {
        let result = PasswordValidator::validate("onlylettershere");
        assert!(result.is_err());
        assert!(result.unwrap_err().contains(&"Password must contain at least one digit"));
    }

    #[test]
    fn test_password_validator_missing_letter() {
        let result = PasswordValidator::validate("12345678");
        assert!(result.is_err());
        assert!(result.unwrap_err().contains(&"Password must contain at least one letter"));
    }
}
