//! Data models for the bookstore

pub mod author;
pub mod book;
pub mod category;
pub mod loan;
pub mod password_reset;
pub mod publisher;
pub mod rating;
pub mod resource;
pub mod role;
pub mod role_resource;
pub mod session;
pub mod user;
pub mod user_request;
pub mod user_role;

use serde::Deserialize;

pub use author::Author;
pub use book::Book;
pub use category::Category;
pub use loan::Loan;
pub use publisher::Publisher;
pub use rating::Rating;
pub use resource::Resource;
pub use role::Role;
pub use role_resource::RoleResource;
pub use session::NewSession;
pub use user::{User, UserCredentials};
pub use user_request::UserRequest;
pub use user_role::UserRole;

/// Default and maximum page sizes for list endpoints
pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

/// Sort direction for list endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

impl From<Option<&str>> for SortDirection {
    fn from(s: Option<&str>) -> Self {
        match s.map(|s| s.to_uppercase()) {
            Some(dir) if dir == "DESC" => SortDirection::Desc,
            _ => SortDirection::Asc,
        }
    }
}

/// Pagination and search parameters shared by every list endpoint
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    /// `ASC` (default) or `DESC`, ordered by creation date
    pub dir: Option<String>,
    pub search: Option<String>,
}

impl ListQuery {
    pub fn limit(&self) -> i64 {
        self.limit
            .filter(|l| *l > 0)
            .map(|l| l.min(MAX_LIMIT))
            .unwrap_or(DEFAULT_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        self.offset.filter(|o| *o > 0).unwrap_or(0)
    }

    pub fn direction(&self) -> SortDirection {
        SortDirection::from(self.dir.as_deref())
    }

    /// Search term wrapped for `ILIKE`, `None` when blank
    pub fn search_pattern(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s))
    }
}

/// Filter type for entities that only support the shared list parameters
#[derive(Debug, Default, Deserialize)]
pub struct NoFilter {}
