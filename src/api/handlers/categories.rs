//! Handlers for category endpoints.

use axum::{
    Extension, Json,
    extract::{Path, State, rejection::{JsonRejection, PathRejection}},
    http::StatusCode,
};
use validator::Validate;

use crate::api::dto::category::{CategoryRequest, CategoryResponse};
use crate::domain::entities::Caller;
use crate::error::AppError;
use crate::state::AppState;

/// # Endpoint
///
/// `GET /api/categories`
pub async fn list_categories_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<Vec<CategoryResponse>>, AppError> {
    let categories = state.catalog_service.list_categories(&caller).await?;
    Ok(Json(categories.into_iter().map(Into::into).collect()))
}

/// # Endpoint
///
/// `GET /api/categories/{id}`
pub async fn get_category_handler(
    path: Result<Path<i64>, PathRejection>,
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<CategoryResponse>, AppError> {
    let Path(id) = path?;
    let category = state.catalog_service.get_category(&caller, id).await?;
    Ok(Json(category.into()))
}

/// Creates a category. Admin only.
///
/// # Endpoint
///
/// `POST /api/categories`
pub async fn create_category_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    payload: Result<Json<CategoryRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CategoryResponse>), AppError> {
    let Json(payload) = payload?;
    payload.validate()?;

    let category = state
        .catalog_service
        .create_category(&caller, payload.into())
        .await?;

    Ok((StatusCode::CREATED, Json(category.into())))
}

/// Renames a category. Admin only.
///
/// # Endpoint
///
/// `PUT /api/categories/{id}` or `PATCH /api/categories/{id}`
pub async fn update_category_handler(
    path: Result<Path<i64>, PathRejection>,
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    payload: Result<Json<CategoryRequest>, JsonRejection>,
) -> Result<Json<CategoryResponse>, AppError> {
    let Path(id) = path?;
    let Json(payload) = payload?;
    payload.validate()?;

    let category = state
        .catalog_service
        .update_category(&caller, id, payload.into())
        .await?;

    Ok(Json(category.into()))
}

/// Deletes a category and every book in it. Admin only.
///
/// # Endpoint
///
/// `DELETE /api/categories/{id}`
pub async fn delete_category_handler(
    path: Result<Path<i64>, PathRejection>,
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> Result<StatusCode, AppError> {
    let Path(id) = path?;
    state.catalog_service.delete_category(&caller, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
