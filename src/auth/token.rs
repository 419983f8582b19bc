//! Access token issuance and verification (HS256 JWT)

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    auth::clock::Clock,
    config::AuthConfig,
    error::{AppError, AppResult},
};

/// Registered claims carried by every access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// User ID
    pub sub: String,
    pub iss: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
    /// Random token ID, keeps two tokens issued in the same second distinct
    pub jti: String,
}

impl AccessClaims {
    /// Parse the subject back into a user ID
    pub fn user_id(&self) -> AppResult<Uuid> {
        Uuid::parse_str(&self.sub)
            .map_err(|_| AppError::Authentication("Invalid user ID".to_string()))
    }
}

/// A freshly signed token
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl TokenService {
    pub fn new(config: &AuthConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            issuer: config.jwt_issuer.clone(),
            ttl: Duration::hours(config.jwt_expiration_hours as i64),
            clock,
        }
    }

    /// Sign a token for `user_id`, valid from now until now + TTL
    pub fn issue_token(&self, user_id: Uuid) -> AppResult<IssuedToken> {
        if user_id.is_nil() {
            return Err(AppError::Validation("User ID is required".to_string()));
        }

        let now = self.clock.now();
        let expires_at = now + self.ttl;

        let claims = AccessClaims {
            sub: user_id.to_string(),
            iss: self.issuer.clone(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Check signature, algorithm, issuer and validity window
    pub fn verify_token(&self, token: &str) -> AppResult<AccessClaims> {
        // Time checks are done against our own clock below
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "nbf", "iss", "sub"]);

        let claims = decode::<AccessClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| {
                tracing::debug!("Token rejected: {}", e);
                AppError::Authentication("Invalid or expired token".to_string())
            })?
            .claims;

        let now = self.clock.now().timestamp();
        if now < claims.nbf {
            return Err(AppError::Authentication("Token is not valid yet".to_string()));
        }
        if now >= claims.exp {
            return Err(AppError::Authentication("Invalid or expired token".to_string()));
        }

        Ok(claims)
    }
}
