//! Repository trait for books.

use crate::domain::entities::{Book, BookFilter, BookPatch, NewBook};
use crate::error::AppError;
use async_trait::async_trait;

/// Repository interface for book records.
///
/// Copy-count changes caused by lending do not go through this trait; see
/// [`super::LendingTransaction::adjust_available_copies`].
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgBookRepository`] - PostgreSQL implementation
/// - [`crate::infrastructure::memory::MemoryStore`] - In-process implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// Lists books matching `filter`, ordered by ID, with author and
    /// category names joined in.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn list(&self, filter: BookFilter) -> Result<Vec<Book>, AppError>;

    /// Finds a book by ID, with author and category names joined in.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find_by_id(&self, id: i64) -> Result<Option<Book>, AppError>;

    /// Creates a book.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the author or category does not exist.
    /// Returns [`AppError::Internal`] on database errors.
    async fn create(&self, new_book: NewBook) -> Result<Book, AppError>;

    /// Partially updates a book.
    ///
    /// A new `total_copies` moves `available_copies` by the same delta under
    /// a row lock, so copies already on loan stay accounted for.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the book does not exist.
    /// Returns [`AppError::Validation`] if the new total is below the
    /// number of copies on loan, or a reference does not exist.
    /// Returns [`AppError::Internal`] on database errors.
    async fn update(&self, id: i64, patch: BookPatch) -> Result<Book, AppError>;

    /// Deletes a book and, by cascade, its borrow records.
    ///
    /// Returns `Ok(false)` if no such book exists.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn delete(&self, id: i64) -> Result<bool, AppError>;
}
