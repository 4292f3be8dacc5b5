//! Handlers for author endpoints.

use axum::{
    Extension, Json,
    extract::{Path, State, rejection::{JsonRejection, PathRejection}},
    http::StatusCode,
};
use validator::Validate;

use crate::api::dto::author::{AuthorResponse, CreateAuthorRequest, UpdateAuthorRequest};
use crate::domain::entities::Caller;
use crate::error::AppError;
use crate::state::AppState;

/// # Endpoint
///
/// `GET /api/authors`
pub async fn list_authors_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<Vec<AuthorResponse>>, AppError> {
    let authors = state.catalog_service.list_authors(&caller).await?;
    Ok(Json(authors.into_iter().map(Into::into).collect()))
}

/// # Endpoint
///
/// `GET /api/authors/{id}`
pub async fn get_author_handler(
    path: Result<Path<i64>, PathRejection>,
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<AuthorResponse>, AppError> {
    let Path(id) = path?;
    let author = state.catalog_service.get_author(&caller, id).await?;
    Ok(Json(author.into()))
}

/// Creates an author. Admin only.
///
/// # Endpoint
///
/// `POST /api/authors`
pub async fn create_author_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    payload: Result<Json<CreateAuthorRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthorResponse>), AppError> {
    let Json(payload) = payload?;
    payload.validate()?;

    let author = state
        .catalog_service
        .create_author(&caller, payload.into())
        .await?;

    Ok((StatusCode::CREATED, Json(author.into())))
}

/// Partially updates an author. Admin only.
///
/// # Endpoint
///
/// `PUT /api/authors/{id}` or `PATCH /api/authors/{id}`
pub async fn update_author_handler(
    path: Result<Path<i64>, PathRejection>,
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    payload: Result<Json<UpdateAuthorRequest>, JsonRejection>,
) -> Result<Json<AuthorResponse>, AppError> {
    let Path(id) = path?;
    let Json(payload) = payload?;
    payload.validate()?;

    let author = state
        .catalog_service
        .update_author(&caller, id, payload.into())
        .await?;

    Ok(Json(author.into()))
}

/// Deletes an author and all of their books. Admin only.
///
/// # Endpoint
///
/// `DELETE /api/authors/{id}`
pub async fn delete_author_handler(
    path: Result<Path<i64>, PathRejection>,
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> Result<StatusCode, AppError> {
    let Path(id) = path?;
    state.catalog_service.delete_author(&caller, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
