//! Requests from users to be granted another role

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct UserRequest {
    pub id: Uuid,
    pub user_id: Uuid,
    pub requested_role_id: Uuid,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub created_by: Uuid,
    pub updated_at: Option<DateTime<Utc>>,
    pub updated_by: Option<Uuid>,
}

/// Filed on behalf of the authenticated user
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUserRequest {
    pub requested_role_id: Uuid,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRequest {
    pub status: RequestStatus,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserRequestFilter {
    pub user_id: Option<Uuid>,
    pub status: Option<RequestStatus>,
}
