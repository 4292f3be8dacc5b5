//! Repository trait definitions for the domain layer.
//!
//! These traits abstract the persistence layer. The services depend on them
//! only, never on a concrete store.
//!
//! # Architecture
//!
//! - Traits define the contract for data operations
//! - PostgreSQL implementations live in `crate::infrastructure::persistence`
//! - The in-process implementation lives in `crate::infrastructure::memory`
//! - Mock implementations are auto-generated via `mockall` for testing
//!
//! # Available Repositories
//!
//! - [`UserRepository`] - User accounts
//! - [`TokenRepository`] - Bearer token storage
//! - [`BookRepository`], [`CategoryRepository`], [`AuthorRepository`] - Catalog CRUD
//! - [`LendingRepository`] - Active borrow reads and [`LendingTransaction`]s
//! - [`StorageHealth`] - Connectivity probe for `/health`

pub mod author_repository;
pub mod book_repository;
pub mod category_repository;
pub mod lending_repository;
pub mod token_repository;
pub mod user_repository;

use crate::error::AppError;
use async_trait::async_trait;

pub use author_repository::AuthorRepository;
pub use book_repository::BookRepository;
pub use category_repository::CategoryRepository;
pub use lending_repository::{LendingRepository, LendingTransaction};
pub use token_repository::{ApiToken, TokenRepository};
pub use user_repository::UserRepository;

#[cfg(test)]
pub use author_repository::MockAuthorRepository;
#[cfg(test)]
pub use book_repository::MockBookRepository;
#[cfg(test)]
pub use category_repository::MockCategoryRepository;
#[cfg(test)]
pub use lending_repository::MockLendingRepository;
#[cfg(test)]
pub use token_repository::MockTokenRepository;
#[cfg(test)]
pub use user_repository::MockUserRepository;

/// Connectivity probe for the backing store.
#[async_trait]
pub trait StorageHealth: Send + Sync {
    /// Short backend name reported by the health endpoint.
    fn backend(&self) -> &'static str;

    /// Round-trips to the store.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] when the store is unreachable.
    async fn ping(&self) -> Result<(), AppError>;
}
