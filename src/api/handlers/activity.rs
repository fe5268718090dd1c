//! Handlers for the activity log.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use validator::Validate;

use crate::api::dto::activity::{ActivityListResponse, ActivityQuery, PurgeRequest, PurgeResponse};
use crate::api::middleware::Authenticated;
use crate::domain::entities::{ActivityStats, Role};
use crate::error::AppError;
use crate::state::AppState;

/// Lists audit entries, newest first.
///
/// # Endpoint
///
/// `GET /api/activity`
///
/// # Query Parameters
///
/// - `start_date`, `end_date` - RFC 3339 or `YYYY-MM-DD`
/// - `types` - comma-separated activity types, e.g. `user_login,station_created`
/// - `statuses` - comma-separated statuses (`success`, `warning`, `error`, `info`)
/// - `user_id`, `station_id`
/// - `search` - case-insensitive match on title, description, user and station
pub async fn list_activity_handler(
    State(state): State<AppState>,
    Query(query): Query<ActivityQuery>,
) -> Result<Json<ActivityListResponse>, AppError> {
    let items = state.activity_service.list(query.into_filter()?).await?;

    Ok(Json(ActivityListResponse {
        total: items.len(),
        items,
    }))
}

/// Counts by type and status plus the five newest entries.
///
/// # Endpoint
///
/// `GET /api/activity/stats`
pub async fn activity_stats_handler(
    State(state): State<AppState>,
    Query(query): Query<ActivityQuery>,
) -> Result<Json<ActivityStats>, AppError> {
    Ok(Json(
        state.activity_service.stats(query.into_filter()?).await?,
    ))
}

/// `DELETE /api/activity/{id}` (Administrador)
pub async fn delete_activity_handler(
    State(state): State<AppState>,
    Extension(current): Authenticated,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    current.require(Role::Administrador)?;

    state.activity_service.delete(id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Removes entries older than `days_to_keep` days.
///
/// # Endpoint
///
/// `POST /api/activity/purge` (Administrador)
///
/// # Request
///
/// ```json
/// { "days_to_keep": 90 }
/// ```
pub async fn purge_activity_handler(
    State(state): State<AppState>,
    Extension(current): Authenticated,
    Json(payload): Json<PurgeRequest>,
) -> Result<Json<PurgeResponse>, AppError> {
    let actor = current.require(Role::Administrador)?;
    payload.validate()?;

    let removed = state
        .activity_service
        .purge(payload.days_to_keep, Some(actor))
        .await?;

    Ok(Json(PurgeResponse {
        removed,
        days_to_keep: payload.days_to_keep,
    }))
}
