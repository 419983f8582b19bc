//! Server-side session records backing token revocation

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Session to persist after a successful login.
/// The stored row adds `id`, `created_at` and `created_by`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSession {
    pub user_id: Uuid,
    pub token: String,
    pub expiration: DateTime<Utc>,
}
