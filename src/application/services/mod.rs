//! Business logic services for the application layer.

pub mod auth_service;
pub mod catalog_service;
pub mod lending_service;
pub mod user_service;

pub use auth_service::{AuthService, IssuedToken};
pub use catalog_service::CatalogService;
pub use lending_service::LendingService;
pub use user_service::UserService;
