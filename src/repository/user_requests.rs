//! Role requests repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        user_request::{CreateUserRequest, RequestStatus, UpdateUserRequest, UserRequestFilter},
        ListQuery, UserRequest,
    },
    repository::{constraint_error, fetch_by_id, fetch_page, CrudRepository, Repository},
};

#[derive(Clone)]
pub struct UserRequestsRepository {
    pool: Pool<Postgres>,
}

impl UserRequestsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CrudRepository for UserRequestsRepository {
    type Entity = UserRequest;
    type Create = CreateUserRequest;
    type Update = UpdateUserRequest;
    type Filter = UserRequestFilter;

    const NAME: &'static str = "User request";

    fn select(repository: &Repository) -> &Self {
        &repository.user_requests
    }

    async fn list(
        &self,
        query: &ListQuery,
        filter: &UserRequestFilter,
    ) -> AppResult<(Vec<UserRequest>, i64)> {
        fetch_page(&self.pool, "user_requests", query, |c| {
            c.eq("user_id", filter.user_id)
                .eq("status", filter.status.map(|s| s.as_str()));
        })
        .await
    }

    async fn detail(&self, id: Uuid) -> AppResult<UserRequest> {
        fetch_by_id(&self.pool, "user_requests", Self::NAME, id).await
    }

    /// Filed for the caller, always starts as pending
    async fn create(&self, input: &CreateUserRequest, actor: Uuid) -> AppResult<UserRequest> {
        sqlx::query_as::<_, UserRequest>(
            r#"
            INSERT INTO user_requests (user_id, requested_role_id, status, created_by)
            VALUES ($1, $2, $3, $1)
            RETURNING *
            "#,
        )
        .bind(actor)
        .bind(input.requested_role_id)
        .bind(RequestStatus::Pending.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(constraint_error)
    }

    /// Decide a pending request. Approval moves the user onto the requested role.
    async fn update(&self, id: Uuid, input: &UpdateUserRequest, actor: Uuid) -> AppResult<UserRequest> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, UserRequest>(
            "SELECT * FROM user_requests WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User request with id {} not found", id)))?;

        if current.status != RequestStatus::Pending.as_str() {
            return Err(AppError::Conflict(format!(
                "User request is already {}",
                current.status
            )));
        }

        let request = sqlx::query_as::<_, UserRequest>(
            r#"
            UPDATE user_requests
            SET status = $2, updated_at = NOW(), updated_by = $3
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(input.status.as_str())
        .bind(actor)
        .fetch_one(&mut *tx)
        .await?;

        if input.status == RequestStatus::Approved {
            let updated = sqlx::query(
                r#"
                UPDATE user_roles
                SET role_id = $2, updated_at = NOW(), updated_by = $3
                WHERE user_id = $1
                "#,
            )
            .bind(request.user_id)
            .bind(request.requested_role_id)
            .bind(actor)
            .execute(&mut *tx)
            .await?;

            if updated.rows_affected() == 0 {
                sqlx::query(
                    "INSERT INTO user_roles (user_id, role_id, created_by) VALUES ($1, $2, $3)",
                )
                .bind(request.user_id)
                .bind(request.requested_role_id)
                .bind(actor)
                .execute(&mut *tx)
                .await
                .map_err(constraint_error)?;
            }
        }

        tx.commit().await?;

        Ok(request)
    }
}
