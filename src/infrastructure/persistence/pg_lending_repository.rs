//! PostgreSQL implementation of the lending repository.
//!
//! Every [`PgLendingTransaction`] starts by setting a transaction-local
//! `lock_timeout`, so a borrower queued behind a stuck lock fails instead of
//! waiting forever. Locks are plain `SELECT ... FOR UPDATE` under the default
//! READ COMMITTED isolation: a waiter re-evaluates its `WHERE` clause against
//! the committed row, which is what makes a second concurrent return of the
//! same borrow see nothing.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::json;
use sqlx::{PgPool, Postgres, Transaction};
use std::sync::Arc;

use super::pg_book_repository::{BookRow, select_books_from};
use crate::domain::entities::{Book, Borrow, NewBorrow};
use crate::domain::repositories::{LendingRepository, LendingTransaction};
use crate::error::AppError;

const BORROW_COLUMNS: &str = "id, user_id, book_id, borrow_date, due_date, return_date";

#[derive(sqlx::FromRow)]
struct BorrowRow {
    id: i64,
    user_id: i64,
    book_id: i64,
    borrow_date: DateTime<Utc>,
    due_date: NaiveDate,
    return_date: Option<NaiveDate>,
}

impl From<BorrowRow> for Borrow {
    fn from(row: BorrowRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            book_id: row.book_id,
            borrow_date: row.borrow_date,
            due_date: row.due_date,
            return_date: row.return_date,
        }
    }
}

/// PostgreSQL repository for borrows.
pub struct PgLendingRepository {
    pool: Arc<PgPool>,
    lock_timeout_ms: u64,
}

impl PgLendingRepository {
    /// Creates a new repository.
    ///
    /// `lock_timeout_ms` bounds every row-lock wait inside a lending
    /// transaction.
    pub fn new(pool: Arc<PgPool>, lock_timeout_ms: u64) -> Self {
        Self {
            pool,
            lock_timeout_ms,
        }
    }
}

#[async_trait]
impl LendingRepository for PgLendingRepository {
    async fn count_active(&self, user_id: i64) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM borrows WHERE user_id = $1 AND return_date IS NULL",
        )
        .bind(user_id)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(count)
    }

    async fn list_active(&self, user_id: i64) -> Result<Vec<Borrow>, AppError> {
        let rows = sqlx::query_as::<_, BorrowRow>(&format!(
            r#"
            SELECT {BORROW_COLUMNS}
            FROM borrows
            WHERE user_id = $1 AND return_date IS NULL
            ORDER BY borrow_date, id
            "#
        ))
        .bind(user_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn begin(&self) -> Result<Box<dyn LendingTransaction>, AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT set_config('lock_timeout', $1, true)")
            .bind(format!("{}ms", self.lock_timeout_ms))
            .execute(&mut *tx)
            .await?;

        Ok(Box::new(PgLendingTransaction { tx }))
    }
}

/// An open PostgreSQL transaction. Rolls back on drop unless committed.
pub struct PgLendingTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl LendingTransaction for PgLendingTransaction {
    async fn lock_user(&mut self, user_id: i64) -> Result<bool, AppError> {
        let row: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(user_id)
            .fetch_optional(&mut *self.tx)
            .await?;

        Ok(row.is_some())
    }

    async fn count_active(&mut self, user_id: i64) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM borrows WHERE user_id = $1 AND return_date IS NULL",
        )
        .bind(user_id)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(count)
    }

    async fn lock_book(&mut self, book_id: i64) -> Result<Option<Book>, AppError> {
        let sql = format!(
            "{} WHERE b.id = $1 FOR UPDATE OF b",
            select_books_from("books")
        );

        let row = sqlx::query_as::<_, BookRow>(&sql)
            .bind(book_id)
            .fetch_optional(&mut *self.tx)
            .await?;

        Ok(row.map(Into::into))
    }

    async fn insert_borrow(&mut self, new_borrow: NewBorrow) -> Result<Borrow, AppError> {
        let row = sqlx::query_as::<_, BorrowRow>(&format!(
            r#"
            INSERT INTO borrows (user_id, book_id, borrow_date, due_date)
            VALUES ($1, $2, $3, $4)
            RETURNING {BORROW_COLUMNS}
            "#
        ))
        .bind(new_borrow.user_id)
        .bind(new_borrow.book_id)
        .bind(new_borrow.borrow_date)
        .bind(new_borrow.due_date)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(row.into())
    }

    async fn adjust_available_copies(
        &mut self,
        book_id: i64,
        delta: i32,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE books
            SET available_copies = available_copies + $2
            WHERE id = $1
              AND available_copies + $2 BETWEEN 0 AND total_copies
            "#,
        )
        .bind(book_id)
        .bind(delta)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::internal(
                "Stock invariant violated",
                json!({ "book_id": book_id, "delta": delta }),
            ));
        }

        Ok(())
    }

    async fn lock_active_borrow(
        &mut self,
        borrow_id: i64,
        user_id: i64,
    ) -> Result<Option<Borrow>, AppError> {
        let row = sqlx::query_as::<_, BorrowRow>(&format!(
            r#"
            SELECT {BORROW_COLUMNS}
            FROM borrows
            WHERE id = $1 AND user_id = $2 AND return_date IS NULL
            FOR UPDATE
            "#
        ))
        .bind(borrow_id)
        .bind(user_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn mark_returned(
        &mut self,
        borrow_id: i64,
        return_date: NaiveDate,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE borrows SET return_date = $2 WHERE id = $1 AND return_date IS NULL",
        )
        .bind(borrow_id)
        .bind(return_date)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::internal(
                "Borrow already returned",
                json!({ "borrow_id": borrow_id }),
            ));
        }

        Ok(())
    }

    async fn add_penalty_points(&mut self, user_id: i64, points: i32) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET penalty_points = penalty_points + $2 WHERE id = $1")
            .bind(user_id)
            .bind(points)
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        self.tx.commit().await?;
        Ok(())
    }
}
