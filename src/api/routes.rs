//! API route configuration.
//!
//! Routes are split by authentication requirement. [`crate::routes`] adds the
//! auth and rate-limit layers.

use crate::api::handlers::{
    create_author_handler, create_book_handler, create_borrow_handler, create_category_handler,
    delete_author_handler, delete_book_handler, delete_category_handler, get_author_handler,
    get_book_handler, get_category_handler, list_authors_handler, list_books_handler,
    list_borrows_handler, list_categories_handler, login_handler, penalties_handler,
    register_handler, return_borrow_handler, update_author_handler, update_book_handler,
    update_category_handler,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

/// Credential endpoints, reachable without a token.
///
/// # Endpoints
///
/// - `POST /register` - Create an account
/// - `POST /login`    - Issue a bearer token
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register_handler))
        .route("/login", post(login_handler))
}

/// Routes protected by Bearer token authentication.
///
/// # Endpoints
///
/// - `GET    /books`                  - List books (`?category=&author=`)
/// - `POST   /books`                  - Create a book (admin)
/// - `GET    /books/{id}`             - Book details
/// - `PUT    /books/{id}`, `PATCH`    - Update a book (admin)
/// - `DELETE /books/{id}`             - Delete a book (admin)
/// - `/categories`, `/categories/{id}` - Same shape, admin writes
/// - `/authors`, `/authors/{id}`       - Same shape, admin writes
/// - `POST   /borrow`                 - Borrow a book
/// - `GET    /borrow`                 - Caller's active borrows
/// - `POST   /return`                 - Return a borrow
/// - `GET    /users/{id}/penalties`   - Penalty points (self or admin)
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/books", get(list_books_handler).post(create_book_handler))
        .route(
            "/books/{id}",
            get(get_book_handler)
                .put(update_book_handler)
                .patch(update_book_handler)
                .delete(delete_book_handler),
        )
        .route(
            "/categories",
            get(list_categories_handler).post(create_category_handler),
        )
        .route(
            "/categories/{id}",
            get(get_category_handler)
                .put(update_category_handler)
                .patch(update_category_handler)
                .delete(delete_category_handler),
        )
        .route(
            "/authors",
            get(list_authors_handler).post(create_author_handler),
        )
        .route(
            "/authors/{id}",
            get(get_author_handler)
                .put(update_author_handler)
                .patch(update_author_handler)
                .delete(delete_author_handler),
        )
        .route(
            "/borrow",
            post(create_borrow_handler).get(list_borrows_handler),
        )
        .route("/return", post(return_borrow_handler))
        .route("/users/{id}/penalties", get(penalties_handler))
}
