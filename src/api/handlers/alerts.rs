//! Handlers for alerts and alert configurations.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::api::dto::alert::{
    AlertListQuery, AlertListResponse, ConfigurationListQuery, CreateAlertConfigurationRequest,
    UpdateAlertConfigurationRequest,
};
use crate::api::middleware::Authenticated;
use crate::domain::entities::{Alert, AlertConfiguration, Role};
use crate::error::AppError;
use crate::state::AppState;

/// Lists alerts, most severe first when listing active ones.
///
/// # Endpoint
///
/// `GET /api/alerts?active_only=true`
pub async fn list_alerts_handler(
    State(state): State<AppState>,
    Query(query): Query<AlertListQuery>,
) -> Result<Json<AlertListResponse>, AppError> {
    let items = state
        .alert_service
        .list_alerts(query.active_only.unwrap_or(true))
        .await?;

    Ok(Json(AlertListResponse {
        total: items.len(),
        items,
    }))
}

/// Marks an alert as resolved.
///
/// # Endpoint
///
/// `POST /api/alerts/{id}/resolve` (Técnico)
///
/// # Errors
///
/// Returns 404 for unknown alerts and 409 if it was already resolved.
pub async fn resolve_alert_handler(
    State(state): State<AppState>,
    Extension(current): Authenticated,
    Path(id): Path<i64>,
) -> Result<Json<Alert>, AppError> {
    let actor = current.require(Role::Tecnico)?;

    let alert = state.alert_service.resolve_alert(id, Some(actor)).await?;

    Ok(Json(alert))
}

/// Lists alert configurations.
///
/// # Endpoint
///
/// `GET /api/alert-configurations`
///
/// With `station_id` only that station's configurations are returned; adding
/// `sensor_type` narrows it to a single sensor.
pub async fn list_configurations_handler(
    State(state): State<AppState>,
    Query(query): Query<ConfigurationListQuery>,
) -> Result<Json<Vec<AlertConfiguration>>, AppError> {
    let service = &state.alert_configuration_service;

    let items = match (query.station_id, query.sensor_type.as_deref()) {
        (Some(station_id), Some(sensor)) if !sensor.trim().is_empty() => service
            .configuration_for_sensor(station_id, sensor)
            .await?
            .into_iter()
            .collect(),
        (Some(station_id), _) => service.configurations_for_station(station_id).await?,
        (None, _) => service.list_configurations().await?,
    };

    Ok(Json(items))
}

/// `GET /api/alert-configurations/{id}`
pub async fn get_configuration_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<AlertConfiguration>, AppError> {
    Ok(Json(
        state.alert_configuration_service.get_configuration(id).await?,
    ))
}

/// Creates a configuration for a station sensor.
///
/// # Endpoint
///
/// `POST /api/alert-configurations` (Técnico)
///
/// # Errors
///
/// Returns 400 for invalid thresholds, 404 for unknown stations and 409 if
/// the sensor is already configured.
pub async fn create_configuration_handler(
    State(state): State<AppState>,
    Extension(current): Authenticated,
    Json(payload): Json<CreateAlertConfigurationRequest>,
) -> Result<(StatusCode, Json<AlertConfiguration>), AppError> {
    let actor = current.require(Role::Tecnico)?;

    let configuration = state
        .alert_configuration_service
        .create_configuration(payload.into(), Some(actor))
        .await?;

    Ok((StatusCode::CREATED, Json(configuration)))
}

/// Toggles a configuration or replaces its thresholds.
///
/// # Endpoint
///
/// `PATCH /api/alert-configurations/{id}` (Técnico)
pub async fn update_configuration_handler(
    State(state): State<AppState>,
    Extension(current): Authenticated,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateAlertConfigurationRequest>,
) -> Result<Json<AlertConfiguration>, AppError> {
    let actor = current.require(Role::Tecnico)?;

    let configuration = state
        .alert_configuration_service
        .update_configuration(id, payload.into(), Some(actor))
        .await?;

    Ok(Json(configuration))
}

/// `DELETE /api/alert-configurations/{id}` (Técnico)
pub async fn delete_configuration_handler(
    State(state): State<AppState>,
    Extension(current): Authenticated,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let actor = current.require(Role::Tecnico)?;

    state
        .alert_configuration_service
        .delete_configuration(id, Some(actor))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
