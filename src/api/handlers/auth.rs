//! Handlers for login, registration and session management.

use axum::{Extension, Json, extract::State, http::StatusCode};
use axum_auth::AuthBearer;

use crate::api::dto::auth::{LoginRequest, RefreshRequest, RegisterRequest, SessionResponse};
use crate::api::middleware::{Authenticated, CurrentUser};
use crate::domain::entities::User;
use crate::error::AppError;
use crate::state::AppState;

/// Exchanges credentials for a bearer token.
///
/// # Endpoint
///
/// `POST /api/auth/login`
///
/// # Errors
///
/// Returns 400 for missing or too short credentials and 401 for wrong ones.
pub async fn login_handler(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let session = state
        .auth_service
        .login(&payload.username, &payload.password)
        .await?;

    Ok(Json(session.into()))
}

/// Creates an observer account and signs it in.
///
/// # Endpoint
///
/// `POST /api/auth/register`
pub async fn register_handler(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), AppError> {
    let session = state.auth_service.register(payload.into()).await?;

    Ok((StatusCode::CREATED, Json(session.into())))
}

/// Revokes the token used for this request.
///
/// # Endpoint
///
/// `POST /api/auth/logout`
pub async fn logout_handler(
    State(state): State<AppState>,
    AuthBearer(token): AuthBearer,
) -> Result<StatusCode, AppError> {
    state.auth_service.logout(&token).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Swaps a valid token for a new one.
///
/// # Endpoint
///
/// `POST /api/auth/refresh`
///
/// The old token is revoked.
pub async fn refresh_handler(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let session = state.auth_service.refresh_token(&payload.token).await?;

    Ok(Json(session.into()))
}

/// Returns the authenticated user.
///
/// # Endpoint
///
/// `GET /api/auth/me`
pub async fn me_handler(Extension(CurrentUser(user)): Authenticated) -> Json<User> {
    Json(user)
}
