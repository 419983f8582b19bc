//! Authors repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        author::{AuthorFilter, CreateAuthor, UpdateAuthor},
        Author, ListQuery,
    },
    repository::{check_days, constraint_error, fetch_by_id, fetch_page, CrudRepository, Repository},
};

#[derive(Clone)]
pub struct AuthorsRepository {
    pool: Pool<Postgres>,
}

impl AuthorsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CrudRepository for AuthorsRepository {
    type Entity = Author;
    type Create = CreateAuthor;
    type Update = UpdateAuthor;
    type Filter = AuthorFilter;

    const NAME: &'static str = "Author";

    fn select(repository: &Repository) -> &Self {
        &repository.authors
    }

    async fn list(&self, query: &ListQuery, filter: &AuthorFilter) -> AppResult<(Vec<Author>, i64)> {
        check_days(filter.start_date, filter.end_date)?;
        fetch_page(&self.pool, "authors", query, |c| {
            c.within_days("created_at", filter.start_date, filter.end_date)
                .search(&["name"], query.search_pattern());
        })
        .await
    }

    async fn detail(&self, id: Uuid) -> AppResult<Author> {
        fetch_by_id(&self.pool, "authors", Self::NAME, id).await
    }

    async fn create(&self, input: &CreateAuthor, actor: Uuid) -> AppResult<Author> {
        sqlx::query_as::<_, Author>(
            r#"
            INSERT INTO authors (name, bio, created_by)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(&input.name)
        .bind(&input.bio)
        .bind(actor)
        .fetch_one(&self.pool)
        .await
        .map_err(constraint_error)
    }

    async fn update(&self, id: Uuid, input: &UpdateAuthor, actor: Uuid) -> AppResult<Author> {
        sqlx::query_as::<_, Author>(
            r#"
            UPDATE authors
            SET name = COALESCE($2, name),
                bio = COALESCE($3, bio),
                updated_at = NOW(),
                updated_by = $4
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.bio)
        .bind(actor)
        .fetch_optional(&self.pool)
        .await
        .map_err(constraint_error)?
        .ok_or_else(|| AppError::NotFound(format!("Author with id {} not found", id)))
    }
}
