//! Role grants repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        role_resource::{CreateRoleResource, RoleResourceFilter, UpdateRoleResource},
        ListQuery, RoleResource,
    },
    repository::{constraint_error, fetch_by_id, fetch_page, CrudRepository, Repository},
};

#[derive(Clone)]
pub struct RoleResourcesRepository {
    pool: Pool<Postgres>,
}

impl RoleResourcesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Whether `role_id` holds an active grant on the resource with this
    /// exact endpoint and method
    pub async fn is_active(&self, role_id: Uuid, endpoint: &str, method: &str) -> AppResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM role_resources rr
                JOIN resources r ON r.id = rr.resource_id
                WHERE rr.role_id = $1
                  AND r.endpoint = $2
                  AND rr.method = $3
                  AND rr.is_active = TRUE
            )
            "#,
        )
        .bind(role_id)
        .bind(endpoint)
        .bind(method)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}

#[async_trait]
impl CrudRepository for RoleResourcesRepository {
    type Entity = RoleResource;
    type Create = CreateRoleResource;
    type Update = UpdateRoleResource;
    type Filter = RoleResourceFilter;

    const NAME: &'static str = "Role resource";

    fn select(repository: &Repository) -> &Self {
        &repository.role_resources
    }

    async fn list(
        &self,
        query: &ListQuery,
        filter: &RoleResourceFilter,
    ) -> AppResult<(Vec<RoleResource>, i64)> {
        fetch_page(&self.pool, "role_resources", query, |c| {
            c.eq("role_id", filter.role_id)
                .eq("is_active", filter.is_active)
                .search(&["method"], query.search_pattern());
        })
        .await
    }

    async fn detail(&self, id: Uuid) -> AppResult<RoleResource> {
        fetch_by_id(&self.pool, "role_resources", Self::NAME, id).await
    }

    async fn create(&self, input: &CreateRoleResource, actor: Uuid) -> AppResult<RoleResource> {
        sqlx::query_as::<_, RoleResource>(
            r#"
            INSERT INTO role_resources (role_id, resource_id, method, is_active, created_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(input.role_id)
        .bind(input.resource_id)
        .bind(&input.method)
        .bind(input.is_active)
        .bind(actor)
        .fetch_one(&self.pool)
        .await
        .map_err(constraint_error)
    }

    /// Deactivating a grant keeps the row; only `is_active` changes
    async fn update(
        &self,
        id: Uuid,
        input: &UpdateRoleResource,
        actor: Uuid,
    ) -> AppResult<RoleResource> {
        sqlx::query_as::<_, RoleResource>(
            r#"
            UPDATE role_resources
            SET role_id = COALESCE($2, role_id),
                resource_id = COALESCE($3, resource_id),
                method = COALESCE($4, method),
                is_active = COALESCE($5, is_active),
                updated_at = NOW(),
                updated_by = $6
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(input.role_id)
        .bind(input.resource_id)
        .bind(&input.method)
        .bind(input.is_active)
        .bind(actor)
        .fetch_optional(&self.pool)
        .await
        .map_err(constraint_error)?
        .ok_or_else(|| AppError::NotFound(format!("Role resource with id {} not found", id)))
    }
}
