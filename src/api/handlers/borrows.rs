//! Handlers for borrowing and returning books.

use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};

use crate::api::dto::borrow::{BorrowResponse, CreateBorrowRequest, ReturnRequest, ReturnResponse};
use crate::domain::entities::Caller;
use crate::error::AppError;
use crate::state::AppState;

/// Borrows one copy of a book for the caller.
///
/// # Endpoint
///
/// `POST /api/borrow`
///
/// # Request
///
/// ```json
/// { "book_id": 3 }
/// ```
///
/// `book_id` may also be sent as a string (`"3"`).
///
/// # Errors
///
/// Returns 400 `validation_error` if `book_id` is missing or not numeric.
/// Returns 400 `borrow_limit_exceeded` if the caller already has 3 active borrows.
/// Returns 400 `no_copies_available` if every copy is on loan.
/// Returns 404 if the book does not exist.
pub async fn create_borrow_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    payload: Result<Json<CreateBorrowRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<BorrowResponse>), AppError> {
    let Json(payload) = payload?;

    let borrow = state
        .lending_service
        .create_borrow(&caller, payload.book_id)
        .await?;

    Ok((StatusCode::CREATED, Json(borrow.into())))
}

/// Lists the caller's active borrows, oldest first.
///
/// # Endpoint
///
/// `GET /api/borrow`
pub async fn list_borrows_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<Vec<BorrowResponse>>, AppError> {
    let borrows = state.lending_service.list_active_borrows(&caller).await?;
    Ok(Json(borrows.into_iter().map(Into::into).collect()))
}

/// Returns a borrowed book.
///
/// # Endpoint
///
/// `POST /api/return`
///
/// # Response
///
/// ```json
/// {
///   "message": "Book returned successfully",
///   "borrow_id": 12,
///   "return_date": "2024-05-20",
///   "days_late": 5
/// }
/// ```
///
/// A late return adds `days_late` penalty points to the caller.
///
/// # Errors
///
/// Returns 400 if `borrow_id` is missing or not numeric.
/// Returns 404 if the borrow does not exist, is not the caller's, or was
/// already returned.
pub async fn return_borrow_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    payload: Result<Json<ReturnRequest>, JsonRejection>,
) -> Result<Json<ReturnResponse>, AppError> {
    let Json(payload) = payload?;

    let receipt = state
        .lending_service
        .return_borrow(&caller, payload.borrow_id)
        .await?;

    Ok(Json(receipt.into()))
}
