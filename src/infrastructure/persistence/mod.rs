//! PostgreSQL repository implementations.
//!
//! Concrete implementations of domain repository traits using SQLx runtime
//! queries mapped through `FromRow` row structs.
//!
//! # Repositories
//!
//! - [`PgUserRepository`] - User accounts
//! - [`PgTokenRepository`] - API token storage and validation
//! - [`PgBookRepository`] - Books with joined author and category names
//! - [`PgCategoryRepository`], [`PgAuthorRepository`] - Reference data
//! - [`PgLendingRepository`] - Borrows and row-locking lending transactions
//! - [`PgHealth`] - Connectivity probe

pub mod pg_author_repository;
pub mod pg_book_repository;
pub mod pg_category_repository;
pub mod pg_health;
pub mod pg_lending_repository;
pub mod pg_token_repository;
pub mod pg_user_repository;

pub use pg_author_repository::PgAuthorRepository;
pub use pg_book_repository::PgBookRepository;
pub use pg_category_repository::PgCategoryRepository;
pub use pg_health::PgHealth;
pub use pg_lending_repository::{PgLendingRepository, PgLendingTransaction};
pub use pg_token_repository::PgTokenRepository;
pub use pg_user_repository::PgUserRepository;
