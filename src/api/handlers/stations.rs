//! Handlers for station management endpoints.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde_json::json;

use crate::api::dto::normalize::NormalizeResponse;
use crate::api::dto::station::{
    CreateStationRequest, SeriesQuery, StationListQuery, StationListResponse,
    UpdateStationRequest,
};
use crate::api::middleware::Authenticated;
use crate::application::normalization::{self, SourceType};
use crate::domain::entities::{MeasurementFilter, Role, Station, WATER_LEVEL};
use crate::error::AppError;
use crate::state::AppState;

/// Lists stations.
///
/// # Endpoint
///
/// `GET /api/stations`
///
/// # Query Parameters
///
/// - `page`, `limit`, `sort_by`, `sort_order` - pagination (1-indexed, limit ≤ 100)
/// - `name`, `code`, `location` - case-insensitive substring filters
/// - `status` - `active`, `maintenance` or `inactive`
/// - `latitude_min`/`latitude_max`, `longitude_min`/`longitude_max`,
///   `threshold_min`/`threshold_max`, `level_min`/`level_max` - numeric ranges
///
/// Without any parameter every station is returned ordered by name.
pub async fn list_stations_handler(
    State(state): State<AppState>,
    Query(query): Query<StationListQuery>,
) -> Result<Json<StationListResponse>, AppError> {
    if !query.is_paginated() {
        let items = state.station_service.list_stations().await?;
        return Ok(Json(StationListResponse::All {
            total: items.len(),
            items,
        }));
    }

    let page = query.pagination.to_page_request()?;
    let filter = query.filter()?;
    let result = state
        .station_service
        .list_stations_paginated(page, filter)
        .await?;

    Ok(Json(StationListResponse::Page(result)))
}

/// `GET /api/stations/{id}`
pub async fn get_station_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Station>, AppError> {
    Ok(Json(state.station_service.get_station(id).await?))
}

/// Creates a station.
///
/// # Endpoint
///
/// `POST /api/stations` (Administrador)
///
/// # Errors
///
/// Returns 400 for invalid fields and 409 if the code is taken.
pub async fn create_station_handler(
    State(state): State<AppState>,
    Extension(current): Authenticated,
    Json(payload): Json<CreateStationRequest>,
) -> Result<(StatusCode, Json<Station>), AppError> {
    let actor = current.require(Role::Administrador)?;

    let station = state
        .station_service
        .create_station(payload.into_input()?, Some(actor))
        .await?;

    Ok((StatusCode::CREATED, Json(station)))
}

/// Partially updates a station.
///
/// # Endpoint
///
/// `PATCH /api/stations/{id}` (Administrador)
pub async fn update_station_handler(
    State(state): State<AppState>,
    Extension(current): Authenticated,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateStationRequest>,
) -> Result<Json<Station>, AppError> {
    let actor = current.require(Role::Administrador)?;

    let station = state
        .station_service
        .update_station(id, payload.into(), Some(actor))
        .await?;

    Ok(Json(station))
}

/// Deletes a station.
///
/// # Endpoint
///
/// `DELETE /api/stations/{id}` (Administrador)
///
/// # Errors
///
/// Returns 422 for stations the system depends on.
pub async fn delete_station_handler(
    State(state): State<AppState>,
    Extension(current): Authenticated,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let actor = current.require(Role::Administrador)?;

    state.station_service.delete_station(id, Some(actor)).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Returns a station's readings as a normalized chart series.
///
/// # Endpoint
///
/// `GET /api/stations/{id}/series`
///
/// Defaults to water-level readings.
pub async fn station_series_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<SeriesQuery>,
) -> Result<Json<NormalizeResponse>, AppError> {
    let station = state.station_service.get_station(id).await?;

    let readings = state
        .measurement_service
        .historical(MeasurementFilter {
            station_id: Some(station.id),
            start_date: query.start_date,
            end_date: query.end_date,
            variable_type: Some(
                query
                    .variable_type
                    .filter(|v| !v.trim().is_empty())
                    .unwrap_or_else(|| WATER_LEVEL.to_string()),
            ),
        })
        .await?;

    let raw = serde_json::to_value(&readings).map_err(|e| {
        AppError::internal("No se pudo serializar la serie", json!({ "reason": e.to_string() }))
    })?;
    let dataset = normalization::normalize(&raw, SourceType::Measurement);
    let chart_config = normalization::chart_config(&dataset);

    Ok(Json(NormalizeResponse {
        dataset,
        chart_config,
    }))
}
