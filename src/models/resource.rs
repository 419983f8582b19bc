//! Gated resource model: one normalized (endpoint pattern, method) pair

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Resource {
    pub id: Uuid,
    pub name: String,
    /// Canonical endpoint, e.g. `/books/{id}`
    pub endpoint: String,
    pub method: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub created_by: Uuid,
    pub updated_at: Option<DateTime<Utc>>,
    pub updated_by: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateResource {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "Endpoint is required"))]
    pub endpoint: String,
    #[validate(length(min = 1, message = "Method is required"))]
    pub method: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateResource {
    pub name: Option<String>,
    pub endpoint: Option<String>,
    pub method: Option<String>,
    pub description: Option<String>,
}
