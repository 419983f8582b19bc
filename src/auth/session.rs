//! Server-side sessions that make logout take effect before token expiry

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::{
    auth::{
        clock::Clock,
        store::{bounded, AccessStore},
    },
    error::AppResult,
    models::NewSession,
};

#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn AccessStore>,
    clock: Arc<dyn Clock>,
    query_timeout: Duration,
}

impl SessionManager {
    pub fn new(store: Arc<dyn AccessStore>, clock: Arc<dyn Clock>, query_timeout: Duration) -> Self {
        Self {
            store,
            clock,
            query_timeout,
        }
    }

    pub async fn create_session(
        &self,
        user_id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> AppResult<()> {
        let session = NewSession {
            user_id,
            token: token.to_string(),
            expiration: expires_at,
        };
        bounded(
            self.query_timeout,
            "create session",
            self.store.create_session(&session),
        )
        .await
    }

    /// True iff the session row exists and has not expired
    pub async fn session_active(&self, token: &str) -> AppResult<bool> {
        let now = self.clock.now();
        bounded(
            self.query_timeout,
            "session lookup",
            self.store.session_exists(token, now),
        )
        .await
    }

    /// Idempotent: revoking an unknown token is not an error
    pub async fn revoke_session(&self, token: &str) -> AppResult<()> {
        bounded(
            self.query_timeout,
            "revoke session",
            self.store.delete_session(token),
        )
        .await
    }
}
