//! Book rating model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Rating {
    pub id: Uuid,
    pub book_id: Uuid,
    pub user_id: Uuid,
    pub rating: i32,
    pub review: String,
    pub created_at: DateTime<Utc>,
    pub created_by: Uuid,
    pub updated_at: Option<DateTime<Utc>>,
    pub updated_by: Option<Uuid>,
}

/// The rating author is always the authenticated user
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateRating {
    pub book_id: Uuid,
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i32,
    #[serde(default)]
    pub review: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateRating {
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: Option<i32>,
    pub review: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RatingFilter {
    pub book_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
}
