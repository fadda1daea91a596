//! Book instances and loans repository for database operations

use chrono::NaiveDate;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::book_instance::{BookInstance, BorrowedCopy, LoanStatus},
    pagination::Page,
};

use super::{constraint_kind, Constraint};

const INSTANCE_COLUMNS: &str = "id, book_id, imprint, due_back, status, borrower_id";

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Postgres>,
}

impl LoansRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get book instance by ID
    pub async fn get_instance(&self, id: Uuid) -> AppResult<BookInstance> {
        let query = format!("SELECT {} FROM book_instances WHERE id = $1", INSTANCE_COLUMNS);
        sqlx::query_as::<_, BookInstance>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book instance {} not found", id)))
    }

    /// On-loan copies ordered by due date, optionally restricted to one borrower
    pub async fn list_on_loan(
        &self,
        borrower_id: Option<i32>,
        page: &Page,
    ) -> AppResult<(Vec<BorrowedCopy>, i64)> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM book_instances
            WHERE status = $1 AND ($2::int IS NULL OR borrower_id = $2)
            "#,
        )
        .bind(LoanStatus::OnLoan)
        .bind(borrower_id)
        .fetch_one(&self.pool)
        .await?;

        let copies = sqlx::query_as::<_, BorrowedCopy>(
            r#"
            SELECT bi.id, bi.book_id, b.title, bi.imprint, bi.due_back,
                   bi.borrower_id, u.username AS borrower,
                   COALESCE(bi.due_back < CURRENT_DATE, FALSE) AS is_overdue
            FROM book_instances bi
            JOIN books b ON b.id = bi.book_id
            LEFT JOIN users u ON u.id = bi.borrower_id
            WHERE bi.status = $1 AND ($2::int IS NULL OR bi.borrower_id = $2)
            ORDER BY bi.due_back ASC NULLS LAST, bi.id
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(LoanStatus::OnLoan)
        .bind(borrower_id)
        .bind(page.size)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((copies, total))
    }

    /// Move the due-back date of a copy that is still on loan
    pub async fn renew(&self, id: Uuid, due_back: NaiveDate) -> AppResult<BookInstance> {
        let query = format!(
            "UPDATE book_instances SET due_back = $1 WHERE id = $2 AND status = $3 RETURNING {}",
            INSTANCE_COLUMNS
        );
        sqlx::query_as::<_, BookInstance>(&query)
            .bind(due_back)
            .bind(id)
            .bind(LoanStatus::OnLoan)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| {
                AppError::BusinessRule(format!("Book instance {} is no longer on loan", id))
            })
    }

    /// Put a copy on loan to a borrower
    pub async fn lend(&self, id: Uuid, borrower_id: i32, due_back: NaiveDate) -> AppResult<BookInstance> {
        let query = format!(
            "UPDATE book_instances SET status = $1, borrower_id = $2, due_back = $3 WHERE id = $4 RETURNING {}",
            INSTANCE_COLUMNS
        );
        sqlx::query_as::<_, BookInstance>(&query)
            .bind(LoanStatus::OnLoan)
            .bind(borrower_id)
            .bind(due_back)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| match constraint_kind(&e) {
                Some(Constraint::ForeignKey) => {
                    AppError::Validation(format!("User with id {} does not exist", borrower_id))
                }
                _ => AppError::Database(e),
            })?
            .ok_or_else(|| AppError::NotFound(format!("Book instance {} not found", id)))
    }

    /// Clear the loan and make the copy available again
    pub async fn mark_returned(&self, id: Uuid) -> AppResult<BookInstance> {
        let query = format!(
            "UPDATE book_instances SET status = $1, borrower_id = NULL, due_back = NULL WHERE id = $2 RETURNING {}",
            INSTANCE_COLUMNS
        );
        sqlx::query_as::<_, BookInstance>(&query)
            .bind(LoanStatus::Available)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book instance {} not found", id)))
    }

    /// Register a new copy of a book
    pub async fn create_instance(
        &self,
        book_id: i32,
        imprint: &str,
        status: LoanStatus,
    ) -> AppResult<BookInstance> {
        let query = format!(
            "INSERT INTO book_instances (id, book_id, imprint, status) VALUES ($1, $2, $3, $4) RETURNING {}",
            INSTANCE_COLUMNS
        );
        sqlx::query_as::<_, BookInstance>(&query)
            .bind(Uuid::new_v4())
            .bind(book_id)
            .bind(imprint)
            .bind(status)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match constraint_kind(&e) {
                Some(Constraint::ForeignKey) => {
                    AppError::NotFound(format!("Book with id {} not found", book_id))
                }
                Some(Constraint::Check) => AppError::Validation(
                    "A new copy cannot start on loan without a borrower".to_string(),
                ),
                _ => AppError::Database(e),
            })
    }
}
