//! Book model and related types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Circulation status of a book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BookStatus {
    Available,
    Borrowed,
}

impl BookStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookStatus::Available => "available",
            BookStatus::Borrowed => "borrowed",
        }
    }
}

impl std::fmt::Display for BookStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Who may see a book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    Public,
    MemberOnly,
    AdminOnly,
}

impl AccessLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessLevel::Public => "public",
            AccessLevel::MemberOnly => "member_only",
            AccessLevel::AdminOnly => "admin_only",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub author_id: Uuid,
    pub publisher_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub published_year: i32,
    pub isbn: String,
    pub status: String,
    pub access_level: String,
    pub created_at: DateTime<Utc>,
    pub created_by: Uuid,
    pub updated_at: Option<DateTime<Utc>>,
    pub updated_by: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, max = 255, message = "Title must be 1 to 255 characters"))]
    pub title: String,
    pub author_id: Uuid,
    pub publisher_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    #[validate(range(min = 0, max = 9999, message = "Invalid published year"))]
    pub published_year: i32,
    #[validate(length(min = 10, max = 17, message = "ISBN must be 10 to 17 characters"))]
    pub isbn: String,
    #[serde(default = "default_access_level")]
    pub access_level: AccessLevel,
}

fn default_access_level() -> AccessLevel {
    AccessLevel::Public
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(length(min = 1, max = 255, message = "Title must be 1 to 255 characters"))]
    pub title: Option<String>,
    pub author_id: Option<Uuid>,
    pub publisher_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    #[validate(range(min = 0, max = 9999, message = "Invalid published year"))]
    pub published_year: Option<i32>,
    pub isbn: Option<String>,
    pub status: Option<BookStatus>,
    pub access_level: Option<AccessLevel>,
}

/// Book-specific list filters, dates bound `created_at`
#[derive(Debug, Default, Deserialize)]
pub struct BookFilter {
    pub author_id: Option<Uuid>,
    pub publisher_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub published_year: Option<i32>,
    pub status: Option<BookStatus>,
    pub access_level: Option<AccessLevel>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}
