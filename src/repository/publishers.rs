//! Publishers repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        publisher::{CreatePublisher, PublisherFilter, UpdatePublisher},
        ListQuery, Publisher,
    },
    repository::{check_days, constraint_error, fetch_by_id, fetch_page, CrudRepository, Repository},
};

#[derive(Clone)]
pub struct PublishersRepository {
    pool: Pool<Postgres>,
}

impl PublishersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CrudRepository for PublishersRepository {
    type Entity = Publisher;
    type Create = CreatePublisher;
    type Update = UpdatePublisher;
    type Filter = PublisherFilter;

    const NAME: &'static str = "Publisher";

    fn select(repository: &Repository) -> &Self {
        &repository.publishers
    }

    async fn list(&self, query: &ListQuery, filter: &PublisherFilter) -> AppResult<(Vec<Publisher>, i64)> {
        check_days(filter.start_date, filter.end_date)?;
        fetch_page(&self.pool, "publishers", query, |c| {
            c.within_days("created_at", filter.start_date, filter.end_date)
                .search(&["name", "address"], query.search_pattern());
        })
        .await
    }

    async fn detail(&self, id: Uuid) -> AppResult<Publisher> {
        fetch_by_id(&self.pool, "publishers", Self::NAME, id).await
    }

    async fn create(&self, input: &CreatePublisher, actor: Uuid) -> AppResult<Publisher> {
        sqlx::query_as::<_, Publisher>(
            r#"
            INSERT INTO publishers (name, address, phone, created_by)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&input.name)
        .bind(&input.address)
        .bind(&input.phone)
        .bind(actor)
        .fetch_one(&self.pool)
        .await
        .map_err(constraint_error)
    }

    async fn update(&self, id: Uuid, input: &UpdatePublisher, actor: Uuid) -> AppResult<Publisher> {
        sqlx::query_as::<_, Publisher>(
            r#"
            UPDATE publishers
            SET name = COALESCE($2, name),
                address = COALESCE($3, address),
                phone = COALESCE($4, phone),
                updated_at = NOW(),
                updated_by = $5
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.address)
        .bind(&input.phone)
        .bind(actor)
        .fetch_optional(&self.pool)
        .await
        .map_err(constraint_error)?
        .ok_or_else(|| AppError::NotFound(format!("Publisher with id {} not found", id)))
    }
}
