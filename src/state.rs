//! Shared application state and backend wiring.

use std::sync::Arc;

use mockable::Clock;
use sqlx::PgPool;

use crate::application::services::{AuthService, CatalogService, LendingService, UserService};
use crate::domain::repositories::{
    AuthorRepository, BookRepository, CategoryRepository, LendingRepository, StorageHealth,
    TokenRepository, UserRepository,
};
use crate::infrastructure::memory::MemoryStore;
use crate::infrastructure::persistence::{
    PgAuthorRepository, PgBookRepository, PgCategoryRepository, PgHealth, PgLendingRepository,
    PgTokenRepository, PgUserRepository,
};

/// One storage backend, seen through every repository trait.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub tokens: Arc<dyn TokenRepository>,
    pub books: Arc<dyn BookRepository>,
    pub categories: Arc<dyn CategoryRepository>,
    pub authors: Arc<dyn AuthorRepository>,
    pub lending: Arc<dyn LendingRepository>,
    pub storage: Arc<dyn StorageHealth>,
}

impl Repositories {
    /// PostgreSQL repositories sharing one pool.
    pub fn postgres(pool: Arc<PgPool>, lock_timeout_ms: u64) -> Self {
        Self {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            tokens: Arc::new(PgTokenRepository::new(pool.clone())),
            books: Arc::new(PgBookRepository::new(pool.clone())),
            categories: Arc::new(PgCategoryRepository::new(pool.clone())),
            authors: Arc::new(PgAuthorRepository::new(pool.clone())),
            lending: Arc::new(PgLendingRepository::new(pool.clone(), lock_timeout_ms)),
            storage: Arc::new(PgHealth::new(pool)),
        }
    }

    /// Every repository backed by the same in-process store.
    pub fn memory(store: MemoryStore) -> Self {
        let store = Arc::new(store);
        Self {
            users: store.clone(),
            tokens: store.clone(),
            books: store.clone(),
            categories: store.clone(),
            authors: store.clone(),
            lending: store.clone(),
            storage: store,
        }
    }
}

/// Application state shared across all HTTP handlers.
///
/// Cloned per request by Axum; all fields are behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub user_service: Arc<UserService>,
    pub catalog_service: Arc<CatalogService>,
    pub lending_service: Arc<LendingService>,
    pub storage: Arc<dyn StorageHealth>,
}

impl AppState {
    /// Builds every service over `repositories`.
    ///
    /// # Arguments
    ///
    /// - `signing_secret` - HMAC key for token hashes
    /// - `password_pepper` - HMAC key for password hashes
    /// - `strict_borrow_limit` - re-check the borrow limit inside the lending transaction
    /// - `clock` - time source for borrow, due and return dates
    pub fn new(
        repositories: Repositories,
        signing_secret: String,
        password_pepper: String,
        strict_borrow_limit: bool,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Self {
        Self {
            auth_service: Arc::new(AuthService::new(
                repositories.tokens,
                repositories.users.clone(),
                signing_secret,
                password_pepper.clone(),
            )),
            user_service: Arc::new(UserService::new(repositories.users, password_pepper)),
            catalog_service: Arc::new(CatalogService::new(
                repositories.books,
                repositories.categories,
                repositories.authors,
            )),
            lending_service: Arc::new(LendingService::new(
                repositories.lending,
                clock,
                strict_borrow_limit,
            )),
            storage: repositories.storage,
        }
    }
}
