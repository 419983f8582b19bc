//! Storage contracts the access-control core depends on

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::time::Duration;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{NewSession, User, UserCredentials},
};

/// Reads and writes needed on the request path: sessions, roles and grants
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccessStore: Send + Sync {
    /// First role assigned to the user, `None` when the user has no role
    async fn role_id_for_user(&self, user_id: Uuid) -> AppResult<Option<Uuid>>;

    /// Whether an active grant exists for this exact (role, endpoint, method)
    async fn is_grant_active(&self, role_id: Uuid, endpoint: &str, method: &str) -> AppResult<bool>;

    /// Whether a session row exists for `token` and expires after `now`
    async fn session_exists(&self, token: &str, now: DateTime<Utc>) -> AppResult<bool>;

    async fn create_session(&self, session: &NewSession) -> AppResult<()>;

    /// Delete the session for `token`, succeeding when there is none
    async fn delete_session(&self, token: &str) -> AppResult<()>;

    async fn user_credentials(&self, username: &str) -> AppResult<Option<UserCredentials>>;
}

/// Account lifecycle writes used by registration and password flows
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Create the user and assign the guest role in one transaction
    async fn register_user(&self, username: &str, password_hash: &str) -> AppResult<User>;

    async fn user_credentials_by_id(&self, user_id: Uuid) -> AppResult<Option<UserCredentials>>;

    async fn update_password(&self, user_id: Uuid, password_hash: &str) -> AppResult<()>;

    async fn create_reset_token(
        &self,
        user_id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> AppResult<()>;

    /// Owner of an unexpired reset token
    async fn reset_token_owner(&self, token_hash: &str, now: DateTime<Utc>) -> AppResult<Option<Uuid>>;

    /// Delete an unexpired reset token and store the new password hash for
    /// its owner atomically. `None` when the token is missing or expired.
    async fn consume_reset_token(
        &self,
        token_hash: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Uuid>>;
}

/// Run a store call with an upper bound on its duration.
///
/// The inner future is dropped on timeout, cancelling the query.
pub async fn bounded<T, F>(limit: Duration, operation: &'static str, call: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(AppError::Dependency(format!(
            "{} timed out after {}ms",
            operation,
            limit.as_millis()
        ))),
    }
}
