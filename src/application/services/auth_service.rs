//! Authentication service: bearer token validation and credential login.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;

use crate::domain::entities::Caller;
use crate::domain::repositories::{TokenRepository, UserRepository};
use crate::error::AppError;
use crate::utils::password::verify_password;
use crate::utils::token_generator::generate_token;
use serde_json::json;

type HmacSha256 = Hmac<Sha256>;

/// A freshly issued bearer token. The raw value is never stored.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token_id: i64,
    pub user_id: i64,
    pub token: String,
}

/// Service for authenticating API requests via Bearer tokens.
///
/// Tokens are hashed with HMAC-SHA256 (keyed by `signing_secret`) before storage
/// and comparison. An attacker with read-only access to the database cannot verify
/// or forge tokens without the server-side secret. Passwords are checked with
/// a separate `password_pepper`, so rotating the signing secret only
/// invalidates tokens.
pub struct AuthService {
    token_repository: Arc<dyn TokenRepository>,
    user_repository: Arc<dyn UserRepository>,
    signing_secret: String,
    password_pepper: String,
}

impl AuthService {
    /// Creates a new authentication service.
    ///
    /// # Arguments
    ///
    /// - `token_repository` - token storage
    /// - `user_repository` - account lookup for login
    /// - `signing_secret` - HMAC key; must match the value used when tokens were created
    /// - `password_pepper` - must match the value used when passwords were hashed
    pub fn new(
        token_repository: Arc<dyn TokenRepository>,
        user_repository: Arc<dyn UserRepository>,
        signing_secret: String,
        password_pepper: String,
    ) -> Self {
        Self {
            token_repository,
            user_repository,
            signing_secret,
            password_pepper,
        }
    }

    /// Hashes a raw token with HMAC-SHA256 using the server signing secret.
    ///
    /// Returns a 64-character lowercase hex-encoded MAC.
    pub fn hash_token(&self, token: &str) -> Result<String, AppError> {
        let mut mac = HmacSha256::new_from_slice(self.signing_secret.as_bytes())
            .map_err(|_| AppError::internal("Invalid signing secret", json!({})))?;
        mac.update(token.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Resolves a raw bearer token to the caller it belongs to.
    ///
    /// On success, updates the `last_used_at` timestamp. A failure to record
    /// usage does not fail the request.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] if the token is unknown or revoked.
    /// Returns [`AppError::Internal`] on database errors.
    pub async fn authenticate(&self, token: &str) -> Result<Caller, AppError> {
        let token_hash = self.hash_token(token)?;

        let caller = self
            .token_repository
            .find_caller(&token_hash)
            .await?
            .ok_or_else(|| {
                AppError::unauthorized(
                    "Unauthorized",
                    json!({"reason": "Invalid or revoked token"}),
                )
            })?;

        if let Err(e) = self.token_repository.update_last_used(&token_hash).await {
            tracing::warn!(error = %e, "Failed to record token usage");
        }

        Ok(caller)
    }

    /// Exchanges username and password for a new bearer token.
    ///
    /// Unknown usernames and wrong passwords produce the same error.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] on bad credentials.
    /// Returns [`AppError::Internal`] on database or RNG errors.
    pub async fn login(&self, username: &str, password: &str) -> Result<IssuedToken, AppError> {
        let user = self
            .user_repository
            .find_by_username(username)
            .await?
            .filter(|user| verify_password(&self.password_pepper, password, &user.password_hash))
            .ok_or_else(|| {
                AppError::unauthorized("Invalid credentials", json!({"reason": "login_failed"}))
            })?;

        let issued = self.issue_token(user.id, "login").await?;
        tracing::info!(user_id = user.id, token_id = issued.token_id, "User logged in");
        Ok(issued)
    }

    /// Generates, hashes and stores a new token for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the user does not exist.
    /// Returns [`AppError::Internal`] on database or RNG errors.
    pub async fn issue_token(&self, user_id: i64, name: &str) -> Result<IssuedToken, AppError> {
        let token = generate_token()?;
        let token_hash = self.hash_token(&token)?;

        let stored = self
            .token_repository
            .create_token(user_id, name, &token_hash)
            .await?;

        Ok(IssuedToken {
            token_id: stored.id,
            user_id,
            token,
        })
    }
}
