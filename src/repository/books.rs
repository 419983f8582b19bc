//! Books repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{BookFilter, BookStatus, CreateBook, UpdateBook},
        Book, ListQuery,
    },
    repository::{check_days, constraint_error, fetch_by_id, fetch_page, CrudRepository, Repository},
};

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CrudRepository for BooksRepository {
    type Entity = Book;
    type Create = CreateBook;
    type Update = UpdateBook;
    type Filter = BookFilter;

    const NAME: &'static str = "Book";

    fn select(repository: &Repository) -> &Self {
        &repository.books
    }

    async fn list(&self, query: &ListQuery, filter: &BookFilter) -> AppResult<(Vec<Book>, i64)> {
        check_days(filter.start_date, filter.end_date)?;
        fetch_page(&self.pool, "books", query, |c| {
            c.eq("author_id", filter.author_id)
                .eq("publisher_id", filter.publisher_id)
                .eq("category_id", filter.category_id)
                .eq("published_year", filter.published_year)
                .eq("status", filter.status.map(|s| s.as_str()))
                .eq("access_level", filter.access_level.map(|a| a.as_str()))
                .within_days("created_at", filter.start_date, filter.end_date)
                .search(&["title", "isbn"], query.search_pattern());
        })
        .await
    }

    async fn detail(&self, id: Uuid) -> AppResult<Book> {
        fetch_by_id(&self.pool, "books", Self::NAME, id).await
    }

    async fn create(&self, input: &CreateBook, actor: Uuid) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (
                title, author_id, publisher_id, category_id, published_year,
                isbn, status, access_level, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(&input.title)
        .bind(input.author_id)
        .bind(input.publisher_id)
        .bind(input.category_id)
        .bind(input.published_year)
        .bind(&input.isbn)
        .bind(BookStatus::Available.as_str())
        .bind(input.access_level.as_str())
        .bind(actor)
        .fetch_one(&self.pool)
        .await
        .map_err(constraint_error)
    }

    async fn update(&self, id: Uuid, input: &UpdateBook, actor: Uuid) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET title = COALESCE($2, title),
                author_id = COALESCE($3, author_id),
                publisher_id = COALESCE($4, publisher_id),
                category_id = COALESCE($5, category_id),
                published_year = COALESCE($6, published_year),
                isbn = COALESCE($7, isbn),
                status = COALESCE($8, status),
                access_level = COALESCE($9, access_level),
                updated_at = NOW(),
                updated_by = $10
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.title)
        .bind(input.author_id)
        .bind(input.publisher_id)
        .bind(input.category_id)
        .bind(input.published_year)
        .bind(&input.isbn)
        .bind(input.status.map(|s| s.as_str()))
        .bind(input.access_level.map(|a| a.as_str()))
        .bind(actor)
        .fetch_optional(&self.pool)
        .await
        .map_err(constraint_error)?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }
}
