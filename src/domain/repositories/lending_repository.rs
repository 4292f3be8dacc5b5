//! Storage contract for the borrow/return engine.
//!
//! Lending needs more than plain CRUD: it needs a unit of work that holds
//! row locks until it commits. [`LendingRepository::begin`] opens one as a
//! [`LendingTransaction`]. Dropping the transaction without calling
//! [`LendingTransaction::commit`] rolls every change back and releases the
//! locks.

use crate::domain::entities::{Book, Borrow, NewBorrow};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::NaiveDate;

/// Read access to loans plus the entry point for lending transactions.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgLendingRepository`] - PostgreSQL,
///   `SELECT ... FOR UPDATE` locks
/// - [`crate::infrastructure::memory::MemoryStore`] - In-process, one async
///   mutex per row
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LendingRepository: Send + Sync {
    /// Counts the user's active borrows without taking any lock.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn count_active(&self, user_id: i64) -> Result<i64, AppError>;

    /// Lists the user's active borrows, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn list_active(&self, user_id: i64) -> Result<Vec<Borrow>, AppError>;

    /// Opens an atomic unit of work.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if no transaction can be started.
    async fn begin(&self) -> Result<Box<dyn LendingTransaction>, AppError>;
}

/// A row-lock-scoped transaction over users, books and borrows.
///
/// Locks taken by the `lock_*` methods are exclusive and held until the
/// transaction commits or is dropped. Counter changes are relative updates
/// evaluated by the store, never values computed by the caller.
///
/// Callers touch rows in a fixed order: borrow, then user, then book.
#[async_trait]
pub trait LendingTransaction: Send {
    /// Locks the user row. Returns `false` if the user does not exist.
    async fn lock_user(&mut self, user_id: i64) -> Result<bool, AppError>;

    /// Counts the user's active borrows as visible inside this transaction.
    async fn count_active(&mut self, user_id: i64) -> Result<i64, AppError>;

    /// Locks the book row and reads it.
    async fn lock_book(&mut self, book_id: i64) -> Result<Option<Book>, AppError>;

    /// Inserts an active borrow record.
    async fn insert_borrow(&mut self, new_borrow: NewBorrow) -> Result<Borrow, AppError>;

    /// Adds `delta` to the book's `available_copies` as a relative update.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if the result would leave
    /// `0..=total_copies`.
    async fn adjust_available_copies(&mut self, book_id: i64, delta: i32)
    -> Result<(), AppError>;

    /// Locks the borrow row if it exists, belongs to `user_id` and is still
    /// active. Any other case yields `None`.
    async fn lock_active_borrow(
        &mut self,
        borrow_id: i64,
        user_id: i64,
    ) -> Result<Option<Borrow>, AppError>;

    /// Sets the one-time `return_date` on a locked active borrow.
    async fn mark_returned(
        &mut self,
        borrow_id: i64,
        return_date: NaiveDate,
    ) -> Result<(), AppError>;

    /// Adds `points` to the user's `penalty_points` as a relative update.
    async fn add_penalty_points(&mut self, user_id: i64, points: i32) -> Result<(), AppError>;

    /// Makes every change visible atomically and releases the locks.
    async fn commit(self: Box<Self>) -> Result<(), AppError>;
}
