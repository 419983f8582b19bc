//! Ratings repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        rating::{CreateRating, RatingFilter, UpdateRating},
        ListQuery, Rating,
    },
    repository::{constraint_error, fetch_by_id, fetch_page, CrudRepository, Repository},
};

#[derive(Clone)]
pub struct RatingsRepository {
    pool: Pool<Postgres>,
}

impl RatingsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CrudRepository for RatingsRepository {
    type Entity = Rating;
    type Create = CreateRating;
    type Update = UpdateRating;
    type Filter = RatingFilter;

    const NAME: &'static str = "Rating";

    fn select(repository: &Repository) -> &Self {
        &repository.ratings
    }

    async fn list(&self, query: &ListQuery, filter: &RatingFilter) -> AppResult<(Vec<Rating>, i64)> {
        fetch_page(&self.pool, "ratings", query, |c| {
            c.eq("book_id", filter.book_id)
                .eq("user_id", filter.user_id)
                .search(&["review"], query.search_pattern());
        })
        .await
    }

    async fn detail(&self, id: Uuid) -> AppResult<Rating> {
        fetch_by_id(&self.pool, "ratings", Self::NAME, id).await
    }

    /// The rating is attributed to the caller
    async fn create(&self, input: &CreateRating, actor: Uuid) -> AppResult<Rating> {
        sqlx::query_as::<_, Rating>(
            r#"
            INSERT INTO ratings (book_id, user_id, rating, review, created_by)
            VALUES ($1, $2, $3, $4, $2)
            RETURNING *
            "#,
        )
        .bind(input.book_id)
        .bind(actor)
        .bind(input.rating)
        .bind(&input.review)
        .fetch_one(&self.pool)
        .await
        .map_err(constraint_error)
    }

    async fn update(&self, id: Uuid, input: &UpdateRating, actor: Uuid) -> AppResult<Rating> {
        sqlx::query_as::<_, Rating>(
            r#"
            UPDATE ratings
            SET rating = COALESCE($2, rating),
                review = COALESCE($3, review),
                updated_at = NOW(),
                updated_by = $4
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(input.rating)
        .bind(&input.review)
        .bind(actor)
        .fetch_optional(&self.pool)
        .await
        .map_err(constraint_error)?
        .ok_or_else(|| AppError::NotFound(format!("Rating with id {} not found", id)))
    }
}
