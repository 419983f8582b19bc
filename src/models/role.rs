//! Role model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Identifier of the role every new user receives
pub const GUEST_ROLE: &str = "guest";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Role {
    pub id: Uuid,
    /// Human key, e.g. "admin" or "guest"
    pub identifier: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub created_by: Uuid,
    pub updated_at: Option<DateTime<Utc>>,
    pub updated_by: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateRole {
    #[validate(length(min = 1, max = 50, message = "Identifier must be 1 to 50 characters"))]
    pub identifier: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateRole {
    #[validate(length(min = 1, max = 50, message = "Identifier must be 1 to 50 characters"))]
    pub identifier: Option<String>,
    pub description: Option<String>,
}
