//! Application layer services implementing business logic.
//!
//! This layer orchestrates domain operations by coordinating repository calls,
//! authorization, and business rules. Services consume repository traits and
//! provide a clean API for HTTP handlers and the admin CLI.
//!
//! # Available Services
//!
//! - [`services::lending_service::LendingService`] - Borrow and return engine
//! - [`services::catalog_service::CatalogService`] - Books, categories and authors
//! - [`services::user_service::UserService`] - Registration and penalty queries
//! - [`services::auth_service::AuthService`] - Bearer tokens and login

pub mod services;
