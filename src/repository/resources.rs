//! Gated resources repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    auth::endpoint,
    error::{AppError, AppResult},
    models::{
        resource::{CreateResource, UpdateResource},
        ListQuery, NoFilter, Resource,
    },
    repository::{constraint_error, fetch_by_id, fetch_page, CrudRepository, Repository},
};

#[derive(Clone)]
pub struct ResourcesRepository {
    pool: Pool<Postgres>,
}

impl ResourcesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CrudRepository for ResourcesRepository {
    type Entity = Resource;
    type Create = CreateResource;
    type Update = UpdateResource;
    type Filter = NoFilter;

    const NAME: &'static str = "Resource";

    fn select(repository: &Repository) -> &Self {
        &repository.resources
    }

    async fn list(&self, query: &ListQuery, _filter: &NoFilter) -> AppResult<(Vec<Resource>, i64)> {
        fetch_page(&self.pool, "resources", query, |c| {
            c.search(&["name", "endpoint"], query.search_pattern());
        })
        .await
    }

    async fn detail(&self, id: Uuid) -> AppResult<Resource> {
        fetch_by_id(&self.pool, "resources", Self::NAME, id).await
    }

    /// Endpoints are stored in canonical form so they compare equal to
    /// normalized request paths
    async fn create(&self, input: &CreateResource, actor: Uuid) -> AppResult<Resource> {
        sqlx::query_as::<_, Resource>(
            r#"
            INSERT INTO resources (name, endpoint, method, description, created_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&input.name)
        .bind(endpoint::normalize(&input.endpoint))
        .bind(&input.method)
        .bind(&input.description)
        .bind(actor)
        .fetch_one(&self.pool)
        .await
        .map_err(constraint_error)
    }

    async fn update(&self, id: Uuid, input: &UpdateResource, actor: Uuid) -> AppResult<Resource> {
        sqlx::query_as::<_, Resource>(
            r#"
            UPDATE resources
            SET name = COALESCE($2, name),
                endpoint = COALESCE($3, endpoint),
                method = COALESCE($4, method),
                description = COALESCE($5, description),
                updated_at = NOW(),
                updated_by = $6
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(input.endpoint.as_deref().map(endpoint::normalize))
        .bind(&input.method)
        .bind(&input.description)
        .bind(actor)
        .fetch_optional(&self.pool)
        .await
        .map_err(constraint_error)?
        .ok_or_else(|| AppError::NotFound(format!("Resource with id {} not found", id)))
    }
}
