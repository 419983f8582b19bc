//! Users repository for database operations

use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{role::GUEST_ROLE, User, UserCredentials},
    repository::{constraint_error, SYSTEM_USER_ID},
};

/// Username of the seeded administrator
pub const SUPER_ADMIN_USERNAME: &str = "superadmin";
const ADMIN_ROLE: &str = "admin";

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get credentials by username
    pub async fn credentials_by_username(&self, username: &str) -> AppResult<Option<UserCredentials>> {
        let credentials = sqlx::query_as::<_, UserCredentials>(
            "SELECT id, password FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(credentials)
    }

    /// Get credentials by user ID
    pub async fn credentials_by_id(&self, id: Uuid) -> AppResult<Option<UserCredentials>> {
        let credentials =
            sqlx::query_as::<_, UserCredentials>("SELECT id, password FROM users WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(credentials)
    }

    /// Insert a user with the given role, in one transaction
    async fn create_with_role(&self, username: &str, password_hash: &str, role: &str) -> AppResult<User> {
        let mut tx = self.pool.begin().await?;

        let role_id = sqlx::query_scalar::<_, Uuid>("SELECT id FROM roles WHERE identifier = $1")
            .bind(role)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::Internal(format!("Role {} is not configured", role)))?;

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password, created_by)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .bind(SYSTEM_USER_ID)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match constraint_error(e) {
            AppError::Conflict(_) => AppError::Conflict("Username already taken".to_string()),
            other => other,
        })?;

        sqlx::query("INSERT INTO user_roles (user_id, role_id, created_by) VALUES ($1, $2, $3)")
            .bind(user.id)
            .bind(role_id)
            .bind(SYSTEM_USER_ID)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(user)
    }

    /// Register a new account holding the guest role
    pub async fn register(&self, username: &str, password_hash: &str) -> AppResult<User> {
        self.create_with_role(username, password_hash, GUEST_ROLE).await
    }

    /// Replace the stored password hash
    pub async fn update_password(&self, id: Uuid, password_hash: &str) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE users SET password = $2, updated_at = NOW(), updated_by = $1 WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User with id {} not found", id)));
        }
        Ok(())
    }

    /// Create the administrator account unless it already exists.
    /// Returns true when an account was created.
    pub async fn seed_super_admin(&self, password_hash: &str) -> AppResult<bool> {
        if self.credentials_by_username(SUPER_ADMIN_USERNAME).await?.is_some() {
            return Ok(false);
        }
        self.create_with_role(SUPER_ADMIN_USERNAME, password_hash, ADMIN_ROLE)
            .await?;
        Ok(true)
    }
}
