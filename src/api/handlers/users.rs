//! Handlers for registration, login and penalty queries.

use axum::{
    Extension, Json,
    extract::{Path, State, rejection::{JsonRejection, PathRejection}},
    http::StatusCode,
};
use validator::Validate;

use crate::api::dto::user::{
    LoginRequest, LoginResponse, PenaltyResponse, RegisterRequest, UserResponse,
};
use crate::domain::entities::Caller;
use crate::error::AppError;
use crate::state::AppState;

/// Registers a new account.
///
/// # Endpoint
///
/// `POST /api/register`
///
/// # Errors
///
/// Returns 400 if the body is malformed or fails validation.
/// Returns 409 if the username or email is taken.
pub async fn register_handler(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let Json(payload) = payload?;
    payload.validate()?;

    let user = state
        .user_service
        .register(&payload.username, &payload.email, &payload.password)
        .await?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// Exchanges credentials for a bearer token.
///
/// # Endpoint
///
/// `POST /api/login`
///
/// # Errors
///
/// Returns 401 on wrong username or password.
pub async fn login_handler(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, AppError> {
    let Json(payload) = payload?;

    let issued = state
        .auth_service
        .login(&payload.username, &payload.password)
        .await?;

    Ok(Json(LoginResponse {
        token: issued.token,
        user_id: issued.user_id,
    }))
}

/// Returns a user's penalty points.
///
/// # Endpoint
///
/// `GET /api/users/{id}/penalties`
///
/// # Errors
///
/// Returns 403 unless the caller is that user or an admin.
/// Returns 404 if the user does not exist.
pub async fn penalties_handler(
    path: Result<Path<i64>, PathRejection>,
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<PenaltyResponse>, AppError> {
    let Path(user_id) = path?;
    let summary = state.user_service.get_penalties(&caller, user_id).await?;
    Ok(Json(summary.into()))
}
