//! Handlers for book endpoints.

use axum::{
    Extension, Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
};
use validator::Validate;

use crate::api::dto::book::{BookListQuery, BookResponse, CreateBookRequest, UpdateBookRequest};
use crate::domain::entities::{Caller, NewBook, Stock};
use crate::error::AppError;
use crate::state::AppState;

/// Lists books.
///
/// # Endpoint
///
/// `GET /api/books?category=<name>&author=<substring>`
///
/// `category` matches the category name exactly. `author` matches any part
/// of the author name, ignoring case. Empty values are ignored.
pub async fn list_books_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    query: Result<Query<BookListQuery>, QueryRejection>,
) -> Result<Json<Vec<BookResponse>>, AppError> {
    let Query(query) = query?;
    let books = state
        .catalog_service
        .list_books(&caller, query.into())
        .await?;

    Ok(Json(books.into_iter().map(Into::into).collect()))
}

/// # Endpoint
///
/// `GET /api/books/{id}`
pub async fn get_book_handler(
    path: Result<Path<i64>, PathRejection>,
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<BookResponse>, AppError> {
    let Path(id) = path?;
    let book = state.catalog_service.get_book(&caller, id).await?;
    Ok(Json(book.into()))
}

/// Creates a book. Admin only.
///
/// # Endpoint
///
/// `POST /api/books`
///
/// # Errors
///
/// Returns 400 on invalid fields, unknown author or category, or
/// `available_copies > total_copies`.
/// Returns 403 for non-admin callers.
pub async fn create_book_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    payload: Result<Json<CreateBookRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<BookResponse>), AppError> {
    let Json(payload) = payload?;
    payload.validate()?;

    let stock = Stock::new(
        payload.total_copies,
        payload.available_copies.unwrap_or(payload.total_copies),
    )?;

    let book = state
        .catalog_service
        .create_book(
            &caller,
            NewBook {
                title: payload.title,
                description: payload.description,
                author_id: payload.author_id,
                category_id: payload.category_id,
                stock,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(book.into())))
}

/// Partially updates a book. Admin only.
///
/// # Endpoint
///
/// `PUT /api/books/{id}` or `PATCH /api/books/{id}`
///
/// Changing `total_copies` moves `available_copies` by the same amount.
///
/// # Errors
///
/// Returns 400 if the new total is below the copies currently on loan.
/// Returns 403 for non-admin callers.
/// Returns 404 if the book does not exist.
pub async fn update_book_handler(
    path: Result<Path<i64>, PathRejection>,
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    payload: Result<Json<UpdateBookRequest>, JsonRejection>,
) -> Result<Json<BookResponse>, AppError> {
    let Path(id) = path?;
    let Json(payload) = payload?;
    payload.validate()?;

    let book = state
        .catalog_service
        .update_book(&caller, id, payload.into())
        .await?;

    Ok(Json(book.into()))
}

/// Deletes a book and its borrow history. Admin only.
///
/// # Endpoint
///
/// `DELETE /api/books/{id}`
pub async fn delete_book_handler(
    path: Result<Path<i64>, PathRejection>,
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> Result<StatusCode, AppError> {
    let Path(id) = path?;
    state.catalog_service.delete_book(&caller, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
