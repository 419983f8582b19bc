//! Repository layer for database operations

pub mod authors;
pub mod books;
pub mod categories;
pub mod loans;
pub mod password_resets;
pub mod publishers;
pub mod ratings;
pub mod resources;
pub mod role_resources;
pub mod roles;
pub mod sessions;
pub mod store;
pub mod user_requests;
pub mod user_roles;
pub mod users;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{de::DeserializeOwned, Serialize};
use sqlx::{postgres::PgRow, Encode, FromRow, Pool, Postgres, QueryBuilder, Type};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::ListQuery,
};

/// Author of rows written by the system itself (migrations, registration, seeding)
pub const SYSTEM_USER_ID: Uuid = Uuid::from_u128(0xc9c5f350_c0b2_4f09_bb9e_c1d134a371b1);

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub users: users::UsersRepository,
    pub sessions: sessions::SessionsRepository,
    pub password_resets: password_resets::PasswordResetsRepository,
    pub roles: roles::RolesRepository,
    pub resources: resources::ResourcesRepository,
    pub role_resources: role_resources::RoleResourcesRepository,
    pub user_roles: user_roles::UserRolesRepository,
    pub user_requests: user_requests::UserRequestsRepository,
    pub authors: authors::AuthorsRepository,
    pub publishers: publishers::PublishersRepository,
    pub categories: categories::CategoriesRepository,
    pub books: books::BooksRepository,
    pub loans: loans::LoansRepository,
    pub ratings: ratings::RatingsRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            users: users::UsersRepository::new(pool.clone()),
            sessions: sessions::SessionsRepository::new(pool.clone()),
            password_resets: password_resets::PasswordResetsRepository::new(pool.clone()),
            roles: roles::RolesRepository::new(pool.clone()),
            resources: resources::ResourcesRepository::new(pool.clone()),
            role_resources: role_resources::RoleResourcesRepository::new(pool.clone()),
            user_roles: user_roles::UserRolesRepository::new(pool.clone()),
            user_requests: user_requests::UserRequestsRepository::new(pool.clone()),
            authors: authors::AuthorsRepository::new(pool.clone()),
            publishers: publishers::PublishersRepository::new(pool.clone()),
            categories: categories::CategoriesRepository::new(pool.clone()),
            books: books::BooksRepository::new(pool.clone()),
            loans: loans::LoansRepository::new(pool.clone()),
            ratings: ratings::RatingsRepository::new(pool.clone()),
            pool,
        }
    }

    /// Round-trip to the database, used by the readiness check
    pub async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// List, detail, create and update for one table.
///
/// Implemented once per entity; the generic HTTP handlers are written
/// against this trait only.
#[async_trait]
pub trait CrudRepository: Send + Sync + 'static {
    type Entity: Serialize + Send + Unpin + for<'r> FromRow<'r, PgRow>;
    type Create: DeserializeOwned + Validate + Send + Sync;
    type Update: DeserializeOwned + Validate + Send + Sync;
    type Filter: DeserializeOwned + Default + Send + Sync;

    /// Singular human name used in error messages
    const NAME: &'static str;

    /// Pick this repository out of the aggregate
    fn select(repository: &Repository) -> &Self;

    async fn list(&self, query: &ListQuery, filter: &Self::Filter) -> AppResult<(Vec<Self::Entity>, i64)>;

    async fn detail(&self, id: Uuid) -> AppResult<Self::Entity>;

    async fn create(&self, input: &Self::Create, actor: Uuid) -> AppResult<Self::Entity>;

    async fn update(&self, id: Uuid, input: &Self::Update, actor: Uuid) -> AppResult<Self::Entity>;
}

/// `WHERE` clause accumulator; every value is bound, never interpolated
pub struct Conditions<'q> {
    builder: &'q mut QueryBuilder<'static, Postgres>,
    empty: bool,
}

impl<'q> Conditions<'q> {
    fn new(builder: &'q mut QueryBuilder<'static, Postgres>) -> Self {
        Self {
            builder,
            empty: true,
        }
    }

    fn next(&mut self) {
        self.builder.push(if self.empty { " WHERE " } else { " AND " });
        self.empty = false;
    }

    /// `column = value` when a value is given
    pub fn eq<T>(&mut self, column: &str, value: Option<T>) -> &mut Self
    where
        T: 'static + Encode<'static, Postgres> + Type<Postgres> + Send,
    {
        if let Some(value) = value {
            self.next();
            self.builder.push(column).push(" = ").push_bind(value);
        }
        self
    }

    /// Case-insensitive match of `pattern` on any of `columns`
    pub fn search(&mut self, columns: &[&str], pattern: Option<String>) -> &mut Self {
        let Some(pattern) = pattern else {
            return self;
        };
        if columns.is_empty() {
            return self;
        }

        self.next();
        self.builder.push("(");
        for (i, column) in columns.iter().enumerate() {
            if i > 0 {
                self.builder.push(" OR ");
            }
            self.builder
                .push(*column)
                .push(" ILIKE ")
                .push_bind(pattern.clone());
        }
        self.builder.push(")");
        self
    }

    /// `column` falls on a day in `from..=to` (UTC); either bound may be open
    pub fn within_days(
        &mut self,
        column: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> &mut Self {
        if let Some(from) = from {
            self.next();
            self.builder.push(column).push(" >= ").push_bind(start_of(from));
        }
        if let Some(after) = to.and_then(|to| to.succ_opt()) {
            self.next();
            self.builder.push(column).push(" < ").push_bind(start_of(after));
        }
        self
    }
}

fn start_of(day: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&day.and_time(NaiveTime::MIN))
}

/// Reject a `start_date` that falls after `end_date`
pub(crate) fn check_days(from: Option<NaiveDate>, to: Option<NaiveDate>) -> AppResult<()> {
    match (from, to) {
        (Some(from), Some(to)) if from > to => Err(AppError::BadRequest(
            "start_date must not be after end_date".to_string(),
        )),
        _ => Ok(()),
    }
}

/// Run a filtered, ordered and paginated listing plus its total count
pub(crate) async fn fetch_page<E, F>(
    pool: &Pool<Postgres>,
    table: &str,
    query: &ListQuery,
    filters: F,
) -> AppResult<(Vec<E>, i64)>
where
    E: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    F: Fn(&mut Conditions<'_>),
{
    let mut count = QueryBuilder::new(format!("SELECT COUNT(*) FROM {}", table));
    filters(&mut Conditions::new(&mut count));
    let total: i64 = count.build_query_scalar().fetch_one(pool).await?;

    let mut select = QueryBuilder::new(format!("SELECT * FROM {}", table));
    filters(&mut Conditions::new(&mut select));
    select.push(format!(
        " ORDER BY created_at {}, id {}",
        query.direction().as_sql(),
        query.direction().as_sql()
    ));
    select.push(" LIMIT ").push_bind(query.limit());
    select.push(" OFFSET ").push_bind(query.offset());

    let items = select.build_query_as::<E>().fetch_all(pool).await?;

    Ok((items, total))
}

/// Fetch one row by primary key
pub(crate) async fn fetch_by_id<E>(
    pool: &Pool<Postgres>,
    table: &str,
    name: &str,
    id: Uuid,
) -> AppResult<E>
where
    E: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    sqlx::query_as::<_, E>(&format!("SELECT * FROM {} WHERE id = $1", table))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{} with id {} not found", name, id)))
}

/// Map constraint violations to client errors, anything else stays a database error
pub(crate) fn constraint_error(error: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db) = &error {
        if db.is_unique_violation() {
            return AppError::Conflict(
                db.constraint()
                    .map(|c| format!("Duplicate value violates {}", c))
                    .unwrap_or_else(|| "Duplicate value".to_string()),
            );
        }
        if db.is_foreign_key_violation() {
            return AppError::BadRequest("Referenced record does not exist".to_string());
        }
        if db.is_check_violation() {
            return AppError::BadRequest("Value out of range".to_string());
        }
    }
    AppError::Database(error)
}
