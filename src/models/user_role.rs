//! User to role assignments

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct UserRole {
    pub id: Uuid,
    pub user_id: Uuid,
    pub role_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub created_by: Uuid,
    pub updated_at: Option<DateTime<Utc>>,
    pub updated_by: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUserRole {
    pub user_id: Uuid,
    pub role_id: Uuid,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRole {
    pub user_id: Option<Uuid>,
    pub role_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserRoleFilter {
    pub user_id: Option<Uuid>,
    pub role_id: Option<Uuid>,
}
