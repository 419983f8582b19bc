//! Loans repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::BookStatus,
        loan::{CreateLoan, LoanFilter, LoanStatus, UpdateLoan},
        ListQuery, Loan,
    },
    repository::{check_days, constraint_error, fetch_by_id, fetch_page, CrudRepository, Repository},
};

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Postgres>,
}

impl LoansRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CrudRepository for LoansRepository {
    type Entity = Loan;
    type Create = CreateLoan;
    type Update = UpdateLoan;
    type Filter = LoanFilter;

    const NAME: &'static str = "Loan";

    fn select(repository: &Repository) -> &Self {
        &repository.loans
    }

    async fn list(&self, query: &ListQuery, filter: &LoanFilter) -> AppResult<(Vec<Loan>, i64)> {
        check_days(filter.start_date, filter.end_date)?;
        fetch_page(&self.pool, "loans", query, |c| {
            c.eq("member_id", filter.member_id)
                .eq("book_id", filter.book_id)
                .eq("status", filter.status.map(|s| s.as_str()))
                .within_days("loan_date", filter.start_date, filter.end_date);
        })
        .await
    }

    async fn detail(&self, id: Uuid) -> AppResult<Loan> {
        fetch_by_id(&self.pool, "loans", Self::NAME, id).await
    }

    /// Lend a book: the book must be available and becomes borrowed
    async fn create(&self, input: &CreateLoan, actor: Uuid) -> AppResult<Loan> {
        let mut tx = self.pool.begin().await?;

        let status = sqlx::query_scalar::<_, String>(
            "SELECT status FROM books WHERE id = $1 FOR UPDATE",
        )
        .bind(input.book_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", input.book_id)))?;

        if status == BookStatus::Borrowed.as_str() {
            return Err(AppError::Conflict("Book is already borrowed".to_string()));
        }

        let loan = sqlx::query_as::<_, Loan>(
            r#"
            INSERT INTO loans (book_id, member_id, loan_date, status, created_by)
            VALUES ($1, $2, NOW(), $3, $4)
            RETURNING *
            "#,
        )
        .bind(input.book_id)
        .bind(input.member_id)
        .bind(LoanStatus::Borrowed.as_str())
        .bind(actor)
        .fetch_one(&mut *tx)
        .await
        .map_err(constraint_error)?;

        sqlx::query("UPDATE books SET status = $2, updated_at = NOW(), updated_by = $3 WHERE id = $1")
            .bind(input.book_id)
            .bind(BookStatus::Borrowed.as_str())
            .bind(actor)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(loan)
    }

    /// Only `borrowed -> returned` is a real transition; it stamps the
    /// return date and frees the book
    async fn update(&self, id: Uuid, input: &UpdateLoan, actor: Uuid) -> AppResult<Loan> {
        let mut tx = self.pool.begin().await?;

        let loan = sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", id)))?;

        if loan.status == input.status.as_str() {
            return Ok(loan);
        }

        if input.status == LoanStatus::Borrowed {
            return Err(AppError::BadRequest(
                "A returned loan cannot be reopened".to_string(),
            ));
        }

        let loan = sqlx::query_as::<_, Loan>(
            r#"
            UPDATE loans
            SET status = $2, return_date = NOW(), updated_at = NOW(), updated_by = $3
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(LoanStatus::Returned.as_str())
        .bind(actor)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE books SET status = $2, updated_at = NOW(), updated_by = $3 WHERE id = $1")
            .bind(loan.book_id)
            .bind(BookStatus::Available.as_str())
            .bind(actor)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(loan)
    }
}
