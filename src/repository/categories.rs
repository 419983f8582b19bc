//! Categories repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        category::{CreateCategory, UpdateCategory},
        Category, ListQuery, NoFilter,
    },
    repository::{constraint_error, fetch_by_id, fetch_page, CrudRepository, Repository},
};

#[derive(Clone)]
pub struct CategoriesRepository {
    pool: Pool<Postgres>,
}

impl CategoriesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CrudRepository for CategoriesRepository {
    type Entity = Category;
    type Create = CreateCategory;
    type Update = UpdateCategory;
    type Filter = NoFilter;

    const NAME: &'static str = "Category";

    fn select(repository: &Repository) -> &Self {
        &repository.categories
    }

    async fn list(&self, query: &ListQuery, _filter: &NoFilter) -> AppResult<(Vec<Category>, i64)> {
        fetch_page(&self.pool, "categories", query, |c| {
            c.search(&["name"], query.search_pattern());
        })
        .await
    }

    async fn detail(&self, id: Uuid) -> AppResult<Category> {
        fetch_by_id(&self.pool, "categories", Self::NAME, id).await
    }

    async fn create(&self, input: &CreateCategory, actor: Uuid) -> AppResult<Category> {
        sqlx::query_as::<_, Category>(
            "INSERT INTO categories (name, created_by) VALUES ($1, $2) RETURNING *",
        )
        .bind(&input.name)
        .bind(actor)
        .fetch_one(&self.pool)
        .await
        .map_err(constraint_error)
    }

    async fn update(&self, id: Uuid, input: &UpdateCategory, actor: Uuid) -> AppResult<Category> {
        sqlx::query_as::<_, Category>(
            r#"
            UPDATE categories
            SET name = COALESCE($2, name), updated_at = NOW(), updated_by = $3
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(actor)
        .fetch_optional(&self.pool)
        .await
        .map_err(constraint_error)?
        .ok_or_else(|| AppError::NotFound(format!("Category with id {} not found", id)))
    }
}
