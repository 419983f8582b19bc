//! Password reset flow: request a token, validate it, spend it

use base64::{engine::general_purpose::URL_SAFE, Engine as _};
use chrono::Duration as ChronoDuration;
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::{
        clock::Clock,
        password::hash_password,
        store::{bounded, AccessStore, AccountStore},
    },
    config::AuthConfig,
    error::{AppError, AppResult},
    models::password_reset::{PasswordResetIssued, RequestPasswordReset, ResetPassword},
};

const TOKEN_BYTES: usize = 32;
const INVALID_TOKEN: &str = "Invalid or expired token";

/// Random URL-safe token
fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE.encode(bytes)
}

/// Hex SHA-256 digest, the only form a token is stored in
fn digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

#[derive(Clone)]
pub struct PasswordResetService {
    accounts: Arc<dyn AccountStore>,
    access: Arc<dyn AccessStore>,
    clock: Arc<dyn Clock>,
    ttl: ChronoDuration,
    query_timeout: Duration,
}

impl PasswordResetService {
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        access: Arc<dyn AccessStore>,
        clock: Arc<dyn Clock>,
        config: &AuthConfig,
        query_timeout: Duration,
    ) -> Self {
        Self {
            accounts,
            access,
            clock,
            ttl: ChronoDuration::minutes(config.reset_token_ttl_minutes as i64),
            query_timeout,
        }
    }

    pub async fn request(&self, request: &RequestPasswordReset) -> AppResult<PasswordResetIssued> {
        request.validate()?;

        let user = bounded(
            self.query_timeout,
            "credentials lookup",
            self.access.user_credentials(&request.username),
        )
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let token = generate_token();
        let expires_at = self.clock.now() + self.ttl;

        bounded(
            self.query_timeout,
            "store reset token",
            self.accounts.create_reset_token(user.id, &digest(&token), expires_at),
        )
        .await?;

        tracing::info!(user_id = %user.id, "Password reset requested");
        Ok(PasswordResetIssued {
            token,
            expires_at: expires_at.timestamp(),
        })
    }

    async fn owner(&self, token: &str) -> AppResult<Uuid> {
        bounded(
            self.query_timeout,
            "reset token lookup",
            self.accounts.reset_token_owner(&digest(token), self.clock.now()),
        )
        .await?
        .ok_or_else(|| AppError::BadRequest(INVALID_TOKEN.to_string()))
    }

    /// Succeeds while the token exists and has not expired
    pub async fn validate(&self, token: &str) -> AppResult<()> {
        self.owner(token).await.map(|_| ())
    }

    /// Set a new password and consume the token
    pub async fn reset(&self, request: &ResetPassword) -> AppResult<()> {
        request.validate()?;

        // Reject unusable tokens before paying for a hash
        self.owner(&request.token).await?;
        let hash = hash_password(&request.new_password)?;

        let user_id = bounded(
            self.query_timeout,
            "consume reset token",
            self.accounts
                .consume_reset_token(&digest(&request.token), &hash, self.clock.now()),
        )
        .await?
        .ok_or_else(|| AppError::BadRequest(INVALID_TOKEN.to_string()))?;

        tracing::info!(user_id = %user_id, "Password reset");
        Ok(())
    }
}
