//! Roles repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        role::{CreateRole, UpdateRole},
        ListQuery, NoFilter, Role,
    },
    repository::{constraint_error, fetch_by_id, fetch_page, CrudRepository, Repository},
};

#[derive(Clone)]
pub struct RolesRepository {
    pool: Pool<Postgres>,
}

impl RolesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Look a role up by its identifier, e.g. `guest`
    pub async fn id_by_identifier(&self, identifier: &str) -> AppResult<Option<Uuid>> {
        let id = sqlx::query_scalar::<_, Uuid>("SELECT id FROM roles WHERE identifier = $1")
            .bind(identifier)
            .fetch_optional(&self.pool)
            .await?;
        Ok(id)
    }
}

#[async_trait]
impl CrudRepository for RolesRepository {
    type Entity = Role;
    type Create = CreateRole;
    type Update = UpdateRole;
    type Filter = NoFilter;

    const NAME: &'static str = "Role";

    fn select(repository: &Repository) -> &Self {
        &repository.roles
    }

    async fn list(&self, query: &ListQuery, _filter: &NoFilter) -> AppResult<(Vec<Role>, i64)> {
        fetch_page(&self.pool, "roles", query, |c| {
            c.search(&["identifier", "description"], query.search_pattern());
        })
        .await
    }

    async fn detail(&self, id: Uuid) -> AppResult<Role> {
        fetch_by_id(&self.pool, "roles", Self::NAME, id).await
    }

    async fn create(&self, input: &CreateRole, actor: Uuid) -> AppResult<Role> {
        sqlx::query_as::<_, Role>(
            r#"
            INSERT INTO roles (identifier, description, created_by)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(&input.identifier)
        .bind(&input.description)
        .bind(actor)
        .fetch_one(&self.pool)
        .await
        .map_err(constraint_error)
    }

    async fn update(&self, id: Uuid, input: &UpdateRole, actor: Uuid) -> AppResult<Role> {
        sqlx::query_as::<_, Role>(
            r#"
            UPDATE roles
            SET identifier = COALESCE($2, identifier),
                description = COALESCE($3, description),
                updated_at = NOW(),
                updated_by = $4
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.identifier)
        .bind(&input.description)
        .bind(actor)
        .fetch_optional(&self.pool)
        .await
        .map_err(constraint_error)?
        .ok_or_else(|| AppError::NotFound(format!("Role with id {} not found", id)))
    }
}
