//! HTTP request handlers for API endpoints.
//!
//! Each handler module corresponds to a logical grouping of endpoints.
//! Handlers extract the authenticated [`crate::domain::entities::Caller`]
//! inserted by the auth middleware and pass it to the services, which make
//! every authorization decision.

pub mod authors;
pub mod books;
pub mod borrows;
pub mod categories;
pub mod health;
pub mod users;

pub use authors::{
    create_author_handler, delete_author_handler, get_author_handler, list_authors_handler,
    update_author_handler,
};
pub use books::{
    create_book_handler, delete_book_handler, get_book_handler, list_books_handler,
    update_book_handler,
};
pub use borrows::{create_borrow_handler, list_borrows_handler, return_borrow_handler};
pub use categories::{
    create_category_handler, delete_category_handler, get_category_handler,
    list_categories_handler, update_category_handler,
};
pub use health::health_handler;
pub use users::{login_handler, penalties_handler, register_handler};
