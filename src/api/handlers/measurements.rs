//! Handlers for measurement queries and ingestion.

use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
};
use serde_json::json;
use tokio::sync::mpsc::error::TrySendError;
use validator::Validate;

use crate::api::dto::measurement::{
    AcceptedResponse, HistoricalQuery, LatestQuery, RecordMeasurementRequest,
};
use crate::api::middleware::Authenticated;
use crate::domain::entities::{Measurement, Role};
use crate::error::AppError;
use crate::state::AppState;

/// Returns readings filtered by station, variable and date range, oldest first.
///
/// # Endpoint
///
/// `GET /api/measurements`
///
/// # Query Parameters
///
/// - `station_id` - Restrict to one station
/// - `variable_type` - e.g. `water_level`, `flow`
/// - `start_date`, `end_date` - RFC 3339 or `YYYY-MM-DD` (inclusive)
pub async fn historical_handler(
    State(state): State<AppState>,
    Query(query): Query<HistoricalQuery>,
) -> Result<Json<Vec<Measurement>>, AppError> {
    let readings = state.measurement_service.historical(query.into()).await?;

    Ok(Json(readings))
}

/// Returns the 24 newest readings, newest first.
///
/// # Endpoint
///
/// `GET /api/measurements/latest`
///
/// # Caching
///
/// Served from the cache when possible; the ingest worker drops the cached
/// lists a new reading affects.
pub async fn latest_handler(
    State(state): State<AppState>,
    Query(query): Query<LatestQuery>,
) -> Result<Json<Vec<Measurement>>, AppError> {
    if let Ok(Some(cached)) = state.cache.get_latest(query.station_id).await {
        tracing::debug!(station_id = ?query.station_id, "Latest readings served from cache");
        return Ok(Json(cached));
    }

    let readings = state.measurement_service.latest(query.station_id).await?;

    if let Err(e) = state
        .cache
        .set_latest(query.station_id, &readings, None)
        .await
    {
        tracing::warn!(error = %e, "Failed to cache latest readings");
    }

    Ok(Json(readings))
}

/// Queues a reading for asynchronous recording.
///
/// # Endpoint
///
/// `POST /api/measurements` (Técnico)
///
/// # Response Codes
///
/// - **202 Accepted**: Reading queued; persistence and alert evaluation
///   happen in the background worker
/// - **400 Bad Request**: Malformed reading
/// - **503 Service Unavailable**: Ingest queue is full or closed
pub async fn record_measurement_handler(
    State(state): State<AppState>,
    Extension(current): Authenticated,
    Json(payload): Json<RecordMeasurementRequest>,
) -> Result<(StatusCode, Json<AcceptedResponse>), AppError> {
    let actor = current.require(Role::Tecnico)?;
    payload.validate()?;
    if !payload.value.is_finite() {
        return Err(AppError::bad_request(
            "El valor de la medición debe ser numérico",
            json!({ "field": "value" }),
        ));
    }

    let event = payload.into_event(Some(actor.id));
    let response = AcceptedResponse {
        status: "queued",
        station_id: event.station_id,
        variable_type: event.variable_type.clone(),
        timestamp: event.timestamp,
    };

    match state.reading_sender.try_send(event) {
        Ok(()) => {
            metrics::counter!("measurements_queued_total").increment(1);
            Ok((StatusCode::ACCEPTED, Json(response)))
        }
        Err(TrySendError::Full(_)) => {
            tracing::warn!("Ingest queue full, rejecting reading");
            metrics::counter!("measurements_rejected_total").increment(1);
            Err(AppError::unavailable(
                "La cola de ingesta está llena, intente nuevamente",
                json!({ "capacity": state.reading_sender.max_capacity() }),
            ))
        }
        Err(TrySendError::Closed(_)) => {
            tracing::error!("Ingest queue closed");
            Err(AppError::unavailable(
                "La cola de ingesta no está disponible",
                json!({}),
            ))
        }
    }
}
