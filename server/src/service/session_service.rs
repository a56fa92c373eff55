//! # Session Authenticator
//!
//! Registration, sign-in, token validation, sign-out, password change, and
//! account deletion. Tokens are 256-bit random values, returned to the
//! caller exactly once and persisted only as their SHA-256 hash — the
//! same refresh-token-hashing pattern `auth-service::AuthService` applies
//! to its own opaque tokens.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};
use shared::{
    auth::{password::PasswordValidator, AuthenticatedUser, PasswordHasher, SessionValidator},
    config::SessionConfig,
    errors::ApiError,
    validation::validators::valid_username,
};
use uuid::Uuid;

use crate::domain::{NewUser, User};
use crate::repository::{SessionRepository, UserRepository};

/// Result of a successful `register`/`sign_in`/`change_password` call: the
/// user record plus the plaintext bearer token, issued once.
#[derive(Debug, Clone)]
pub struct AuthenticatedSession {
    pub user: User,
    pub token: String,
}

#[derive(Clone)]
pub struct SessionService {
    users: UserRepository,
    sessions: SessionRepository,
    hasher: PasswordHasher,
    config: SessionConfig,
}

impl SessionService {
    pub fn new(
        users: UserRepository,
        sessions: SessionRepository,
        hasher: PasswordHasher,
        config: SessionConfig,
    ) -> Self {
        Self {
            users,
            sessions,
            hasher,
            config,
        }
    }

    /// `register`: validates shape, hashes the password, creates the
    /// user with defaults, and issues the first session.
    pub async fn register(&self, username: &str, password: &str) -> Result<AuthenticatedSession, ApiError> {
        valid_username(username).map_err(|_| ApiError::InvalidInput {
            message: "username must be 3-20 alphanumeric/underscore characters".to_string(),
        })?;

        PasswordValidator::validate(password).map_err(|errors| ApiError::InvalidInput {
            message: errors.join("; "),
        })?;

        let salt = Self::generate_salt();
        let password_hash = self.hasher.hash(&format!("{salt}{password}"))?;

        let user = self
            .users
            .create(NewUser {
                username: username.to_string(),
                password_hash,
                password_salt: salt,
            })
            .await?;

        let token = self.issue_session(&user).await?;
        Ok(AuthenticatedSession { user, token })
    }

    /// `sign_in`: fails `invalid_credentials` uniformly on unknown
    /// username or wrong password. A dummy hash is verified against when
    /// the username doesn't exist, so the two cases take comparable time.
    pub async fn sign_in(&self, username: &str, password: &str) -> Result<AuthenticatedSession, ApiError> {
        let user = self.users.find_by_username(username).await?;

        let user = match user {
            Some(user) => {
                let salted = format!("{}{password}", user.password_salt);
                if !self.hasher.verify(&salted, &user.password_hash)? {
                    return Err(ApiError::InvalidCredentials);
                }
                user
            }
            None => {
                let _ = self.hasher.verify(password, &Self::dummy_hash());
                return Err(ApiError::InvalidCredentials);
            }
        };

        self.users.touch_last_login(user.id).await?;

        let token = self.issue_session(&user).await?;
        Ok(AuthenticatedSession { user, token })
    }

    /// `sign_out`: idempotent; revoking an unknown or already-revoked
    /// token is not an error.
    pub async fn sign_out(&self, token: &str) -> Result<(), ApiError> {
        self.sessions.revoke(&Self::hash_token(token)).await
    }

    /// `change_password`: verifies the current password, revokes
    /// every existing session, and issues exactly one new one.
    pub async fn change_password(
        &self,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> Result<AuthenticatedSession, ApiError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| ApiError::NotFound {
                resource: format!("user:{user_id}"),
            })?;

        let salted_current = format!("{}{current_password}", user.password_salt);
        if !self.hasher.verify(&salted_current, &user.password_hash)? {
            return Err(ApiError::InvalidCredentials);
        }

        PasswordValidator::validate(new_password).map_err(|errors| ApiError::InvalidInput {
            message: errors.join("; "),
        })?;

        let salt = Self::generate_salt();
        let password_hash = self.hasher.hash(&format!("{salt}{new_password}"))?;
        self.users.update_password(user.id, &password_hash, &salt).await?;
        self.sessions.revoke_all_for_user(user.id).await?;

        let token = self.issue_session(&user).await?;
        Ok(AuthenticatedSession { user, token })
    }

    /// `delete_account`: verifies the password, then deletes the user;
    /// `ON DELETE CASCADE` removes owned quizzes, sessions, and Q&A entries.
    pub async fn delete_account(&self, user_id: Uuid, password: &str) -> Result<(), ApiError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| ApiError::NotFound {
                resource: format!("user:{user_id}"),
            })?;

        let salted = format!("{}{password}", user.password_salt);
        if !self.hasher.verify(&salted, &user.password_hash)? {
            return Err(ApiError::InvalidCredentials);
        }

        self.users.delete(user.id).await
    }

    async fn issue_session(&self, user: &User) -> Result<String, ApiError> {
        let token = Self::generate_token();
        let expires_at = Utc::now() + Duration::days(self.config.ttl_days);

        self.sessions
            .create(&Self::hash_token(&token), user.id, &user.username, expires_at)
            .await?;

        Ok(token)
    }

    fn generate_salt() -> String {
        let mut bytes = [0u8; 16];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        hex::encode(bytes)
    }

    /// 256-bit opaque bearer token.
    fn generate_token() -> String {
        let mut bytes = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        hex::encode(bytes)
    }

    fn hash_token(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// A fixed, never-matching PHC hash verified against when `sign_in` is
    /// called with an unknown username, to keep the failure path's timing
    /// comparable to the known-username branch.
    fn dummy_hash() -> String {
        "$argon2id$v=19$m=65536,t=3,p=4$AAAAAAAAAAAAAAAAAAAAAA$\
         AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA"
            .to_string()
    }
}

#[async_trait]
impl SessionValidator for SessionService {
    /// `validate`: resolves a bearer token to its principal, failing
    /// `unauthenticated` on a missing, expired, or revoked session.
    async fn validate_session(&self, token: &str) -> Result<AuthenticatedUser, ApiError> {
        let session = self
            .sessions
            .find_by_token_hash(&Self::hash_token(token))
            .await?
            .ok_or(ApiError::Unauthenticated)?;

        if !session.is_valid(Utc::now()) {
            return Err(ApiError::Unauthenticated);
        }

        let user = self
            .users
            .find_by_id(session.user_id)
            .await?
            .ok_or(ApiError::Unauthenticated)?;

        Ok(AuthenticatedUser {
            user_id: user.id,
            username: user.username,
            english_level: user.english_level.to_string(),
            has_completed_first_quiz: user.has_completed_first_quiz,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_token_is_256_bit_hex() {
        let token = SessionService::generate_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_generate_token_unique() {
        assert_ne!(SessionService::generate_token(), SessionService::generate_token());
    }

    #[test]
    fn test_hash_token_deterministic() {
        let token = "abc123";
        assert_eq!(SessionService::hash_token(token), SessionService::hash_token(token));
    }

    #[test]
    fn test_generate_salt_unique() {
        assert_ne!(SessionService::generate_salt(), SessionService::generate_salt());
    }
}
