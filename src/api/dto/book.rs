//! DTOs for book endpoints.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::entities::{Book, BookFilter, BookPatch};

/// Query string for `GET /api/books`. Empty values are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct BookListQuery {
    pub category: Option<String>,
    pub author: Option<String>,
}

impl From<BookListQuery> for BookFilter {
    fn from(query: BookListQuery) -> Self {
        BookFilter::new(query.category, query.author)
    }
}

/// Request to create a book.
///
/// `available_copies` defaults to `total_copies`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateBookRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    #[serde(default)]
    pub description: String,

    pub author_id: i64,

    pub category_id: i64,

    #[serde(default = "default_total_copies")]
    #[validate(range(min = 0))]
    pub total_copies: i32,

    #[validate(range(min = 0))]
    pub available_copies: Option<i32>,
}

fn default_total_copies() -> i32 {
    1
}

/// Partial update for a book. `available_copies` is not writable: it moves
/// with `total_copies` and with borrows and returns.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateBookRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,

    pub description: Option<String>,

    pub author_id: Option<i64>,

    pub category_id: Option<i64>,

    #[validate(range(min = 0))]
    pub total_copies: Option<i32>,
}

impl From<UpdateBookRequest> for BookPatch {
    fn from(request: UpdateBookRequest) -> Self {
        Self {
            title: request.title,
            description: request.description,
            author_id: request.author_id,
            category_id: request.category_id,
            total_copies: request.total_copies,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BookResponse {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub author_id: i64,
    pub author_name: Option<String>,
    pub category_id: i64,
    pub category_name: Option<String>,
    pub total_copies: i32,
    pub available_copies: i32,
}

impl From<Book> for BookResponse {
    fn from(book: Book) -> Self {
        Self {
            id: book.id,
            title: book.title,
            description: book.description,
            author_id: book.author_id,
            author_name: book.author_name,
            category_id: book.category_id,
            category_name: book.category_name,
            total_copies: book.total_copies,
            available_copies: book.available_copies,
        }
    }
}
