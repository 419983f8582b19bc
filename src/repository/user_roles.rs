//! User role assignments repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        user_role::{CreateUserRole, UpdateUserRole, UserRoleFilter},
        ListQuery, UserRole,
    },
    repository::{constraint_error, fetch_by_id, fetch_page, CrudRepository, Repository},
};

#[derive(Clone)]
pub struct UserRolesRepository {
    pool: Pool<Postgres>,
}

impl UserRolesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// The user's effective role: the oldest assignment
    pub async fn role_for_user(&self, user_id: Uuid) -> AppResult<Option<Uuid>> {
        let role_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT role_id
            FROM user_roles
            WHERE user_id = $1
            ORDER BY created_at, id
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(role_id)
    }
}

#[async_trait]
impl CrudRepository for UserRolesRepository {
    type Entity = UserRole;
    type Create = CreateUserRole;
    type Update = UpdateUserRole;
    type Filter = UserRoleFilter;

    const NAME: &'static str = "User role";

    fn select(repository: &Repository) -> &Self {
        &repository.user_roles
    }

    async fn list(&self, query: &ListQuery, filter: &UserRoleFilter) -> AppResult<(Vec<UserRole>, i64)> {
        fetch_page(&self.pool, "user_roles", query, |c| {
            c.eq("user_id", filter.user_id).eq("role_id", filter.role_id);
        })
        .await
    }

    async fn detail(&self, id: Uuid) -> AppResult<UserRole> {
        fetch_by_id(&self.pool, "user_roles", Self::NAME, id).await
    }

    async fn create(&self, input: &CreateUserRole, actor: Uuid) -> AppResult<UserRole> {
        sqlx::query_as::<_, UserRole>(
            r#"
            INSERT INTO user_roles (user_id, role_id, created_by)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(input.user_id)
        .bind(input.role_id)
        .bind(actor)
        .fetch_one(&self.pool)
        .await
        .map_err(constraint_error)
    }

    async fn update(&self, id: Uuid, input: &UpdateUserRole, actor: Uuid) -> AppResult<UserRole> {
        sqlx::query_as::<_, UserRole>(
            r#"
            UPDATE user_roles
            SET user_id = COALESCE($2, user_id),
                role_id = COALESCE($3, role_id),
                updated_at = NOW(),
                updated_by = $4
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(input.user_id)
        .bind(input.role_id)
        .bind(actor)
        .fetch_optional(&self.pool)
        .await
        .map_err(constraint_error)?
        .ok_or_else(|| AppError::NotFound(format!("User role with id {} not found", id)))
    }
}
