//! Sessions repository for database operations

use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};

use crate::{error::AppResult, models::NewSession};

#[derive(Clone)]
pub struct SessionsRepository {
    pool: Pool<Postgres>,
}

impl SessionsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Persist a session; a second insert for the same token is a no-op
    pub async fn create(&self, session: &NewSession) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO sessions (user_id, token, expiration, created_by)
            VALUES ($1, $2, $3, $1)
            ON CONFLICT (token) DO NOTHING
            "#,
        )
        .bind(session.user_id)
        .bind(&session.token)
        .bind(session.expiration)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn exists(&self, token: &str, now: DateTime<Utc>) -> AppResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM sessions WHERE token = $1 AND expiration > $2)",
        )
        .bind(token)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    pub async fn delete(&self, token: &str) -> AppResult<()> {
        sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Remove sessions that expired before `now`
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expiration <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
