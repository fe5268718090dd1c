//! Handlers for user administration. Every endpoint requires an administrator.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use validator::Validate;

use crate::api::dto::user::{
    AssignStationsRequest, CreateUserRequest, UpdateUserRequest, UserListResponse,
};
use crate::api::middleware::Authenticated;
use crate::domain::entities::{Role, User};
use crate::error::AppError;
use crate::state::AppState;

/// `GET /api/users`
pub async fn list_users_handler(
    State(state): State<AppState>,
    Extension(current): Authenticated,
) -> Result<Json<UserListResponse>, AppError> {
    current.require(Role::Administrador)?;

    let items = state.user_service.list_users().await?;

    Ok(Json(UserListResponse {
        total: items.len(),
        items,
    }))
}

/// `GET /api/users/{id}`
pub async fn get_user_handler(
    State(state): State<AppState>,
    Extension(current): Authenticated,
    Path(id): Path<i64>,
) -> Result<Json<User>, AppError> {
    current.require(Role::Administrador)?;

    Ok(Json(state.user_service.get_user(id).await?))
}

/// Creates a user account.
///
/// # Endpoint
///
/// `POST /api/users`
///
/// # Errors
///
/// Returns 400 for invalid fields and 409 if the username or email is taken.
pub async fn create_user_handler(
    State(state): State<AppState>,
    Extension(current): Authenticated,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let actor = current.require(Role::Administrador)?;

    let user = state
        .user_service
        .create_user(payload.into(), Some(actor))
        .await?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// Replaces the editable fields of a user.
///
/// # Endpoint
///
/// `PUT /api/users/{id}`
pub async fn update_user_handler(
    State(state): State<AppState>,
    Extension(current): Authenticated,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<User>, AppError> {
    let actor = current.require(Role::Administrador)?;

    let user = state
        .user_service
        .update_user(id, payload.into(), Some(actor))
        .await?;

    Ok(Json(user))
}

/// Deletes a user. Administrators cannot delete themselves.
///
/// # Endpoint
///
/// `DELETE /api/users/{id}`
pub async fn delete_user_handler(
    State(state): State<AppState>,
    Extension(current): Authenticated,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let actor = current.require(Role::Administrador)?;

    state.user_service.delete_user(id, Some(actor)).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Replaces the stations assigned to a user.
///
/// # Endpoint
///
/// `PUT /api/users/{id}/stations`
pub async fn assign_stations_handler(
    State(state): State<AppState>,
    Extension(current): Authenticated,
    Path(id): Path<i64>,
    Json(payload): Json<AssignStationsRequest>,
) -> Result<Json<User>, AppError> {
    let actor = current.require(Role::Administrador)?;
    payload.validate()?;

    let user = state
        .user_service
        .assign_stations(id, payload.station_ids, Some(actor))
        .await?;

    Ok(Json(user))
}
