//! Password reset tokens repository for database operations

use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Only digests are stored; raw tokens never reach the database
#[derive(Clone)]
pub struct PasswordResetsRepository {
    pool: Pool<Postgres>,
}

impl PasswordResetsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn create(&self, user_id: Uuid, token_hash: &str, expires_at: DateTime<Utc>) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO password_resets (user_id, token_hash, expires_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(user_id)
        .bind(token_hash)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn owner(&self, token_hash: &str, now: DateTime<Utc>) -> AppResult<Option<Uuid>> {
        let user_id = sqlx::query_scalar::<_, Uuid>(
            "SELECT user_id FROM password_resets WHERE token_hash = $1 AND expires_at > $2",
        )
        .bind(token_hash)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user_id)
    }

    /// Spend an unexpired token and set the owner's password in one
    /// transaction. Returns the owner, or `None` when the token is unusable.
    pub async fn consume(
        &self,
        token_hash: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Uuid>> {
        let mut tx = self.pool.begin().await?;

        let user_id = sqlx::query_scalar::<_, Uuid>(
            "DELETE FROM password_resets WHERE token_hash = $1 AND expires_at > $2 RETURNING user_id",
        )
        .bind(token_hash)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(user_id) = user_id else {
            return Ok(None);
        };

        let result = sqlx::query(
            "UPDATE users SET password = $2, updated_at = NOW(), updated_by = $1 WHERE id = $1",
        )
        .bind(user_id)
        .bind(password_hash)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User with id {} not found", user_id)));
        }

        tx.commit().await?;

        Ok(Some(user_id))
    }
}
