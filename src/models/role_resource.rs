//! Role to resource grants

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// A grant is only effective while `is_active` is true
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct RoleResource {
    pub id: Uuid,
    pub role_id: Uuid,
    pub resource_id: Uuid,
    pub method: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub created_by: Uuid,
    pub updated_at: Option<DateTime<Utc>>,
    pub updated_by: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateRoleResource {
    pub role_id: Uuid,
    pub resource_id: Uuid,
    #[validate(length(min = 1, message = "Method is required"))]
    pub method: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateRoleResource {
    pub role_id: Option<Uuid>,
    pub resource_id: Option<Uuid>,
    pub method: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RoleResourceFilter {
    pub role_id: Option<Uuid>,
    pub is_active: Option<bool>,
}
