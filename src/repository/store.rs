//! Postgres-backed implementations of the access and account contracts

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    auth::store::{AccessStore, AccountStore},
    error::AppResult,
    models::{NewSession, User, UserCredentials},
    repository::Repository,
};

#[async_trait]
impl AccessStore for Repository {
    async fn role_id_for_user(&self, user_id: Uuid) -> AppResult<Option<Uuid>> {
        self.user_roles.role_for_user(user_id).await
    }

    async fn is_grant_active(&self, role_id: Uuid, endpoint: &str, method: &str) -> AppResult<bool> {
        self.role_resources.is_active(role_id, endpoint, method).await
    }

    async fn session_exists(&self, token: &str, now: DateTime<Utc>) -> AppResult<bool> {
        self.sessions.exists(token, now).await
    }

    async fn create_session(&self, session: &NewSession) -> AppResult<()> {
        self.sessions.create(session).await
    }

    async fn delete_session(&self, token: &str) -> AppResult<()> {
        self.sessions.delete(token).await
    }

    async fn user_credentials(&self, username: &str) -> AppResult<Option<UserCredentials>> {
        self.users.credentials_by_username(username).await
    }
}

#[async_trait]
impl AccountStore for Repository {
    async fn register_user(&self, username: &str, password_hash: &str) -> AppResult<User> {
        self.users.register(username, password_hash).await
    }

    async fn user_credentials_by_id(&self, user_id: Uuid) -> AppResult<Option<UserCredentials>> {
        self.users.credentials_by_id(user_id).await
    }

    async fn update_password(&self, user_id: Uuid, password_hash: &str) -> AppResult<()> {
        self.users.update_password(user_id, password_hash).await
    }

    async fn create_reset_token(
        &self,
        user_id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> AppResult<()> {
        self.password_resets.create(user_id, token_hash, expires_at).await
    }

    async fn reset_token_owner(&self, token_hash: &str, now: DateTime<Utc>) -> AppResult<Option<Uuid>> {
        self.password_resets.owner(token_hash, now).await
    }

    async fn consume_reset_token(
        &self,
        token_hash: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Uuid>> {
        self.password_resets.consume(token_hash, password_hash, now).await
    }
}
