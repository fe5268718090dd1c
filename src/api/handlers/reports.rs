//! Handlers for report endpoints.

use axum::{
    Extension, Json,
    extract::{Query, State},
    http::{HeaderValue, header},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::api::dto::report::{ExportQuery, ReportQuery, ReportResponse};
use crate::api::middleware::Authenticated;
use crate::domain::entities::{CriticalEvent, DailyAverage, ReportFilter, Role, StationComparison};
use crate::error::AppError;
use crate::state::AppState;

fn respond<T>(filter: &ReportFilter, items: Vec<T>) -> Json<ReportResponse<T>> {
    Json(ReportResponse {
        start_date: filter.start_date,
        end_date: filter.end_date,
        total: items.len(),
        items,
    })
}

/// Daily average, minimum and maximum per station.
///
/// # Endpoint
///
/// `GET /api/reports/daily-average?start_date=2026-01-01&end_date=2026-01-31`
///
/// # Errors
///
/// Returns 400 when a date is missing, the range is inverted or longer than
/// one year.
pub async fn daily_average_handler(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<ReportResponse<DailyAverage>>, AppError> {
    let filter = ReportFilter::from(query);
    let items = state.report_service.daily_average(filter.clone()).await?;

    Ok(respond(&filter, items))
}

/// Runs of consecutive critical water-level readings, newest first.
///
/// # Endpoint
///
/// `GET /api/reports/critical-events`
pub async fn critical_events_handler(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<ReportResponse<CriticalEvent>>, AppError> {
    let filter = ReportFilter::from(query);
    let items = state.report_service.critical_events(filter.clone()).await?;

    Ok(respond(&filter, items))
}

/// Per-station water-level summary across the window.
///
/// # Endpoint
///
/// `GET /api/reports/comparative`
pub async fn comparative_handler(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<ReportResponse<StationComparison>>, AppError> {
    let filter = ReportFilter::from(query);
    let items = state.report_service.comparative(filter.clone()).await?;

    Ok(respond(&filter, items))
}

/// Downloads a report as a file.
///
/// # Endpoint
///
/// `GET /api/reports/export?type=daily-average&format=csv&start_date=...&end_date=...` (Técnico)
///
/// # Response
///
/// The file body with `Content-Type` for the format and a
/// `Content-Disposition: attachment` header carrying
/// `reporte_<type>_<start>_<end>.<ext>`.
///
/// # Errors
///
/// Returns 400 for unknown types, formats or date windows.
pub async fn export_handler(
    State(state): State<AppState>,
    Extension(current): Authenticated,
    Query(query): Query<ExportQuery>,
) -> Result<Response, AppError> {
    let actor = current.require(Role::Tecnico)?;

    let file = state
        .report_service
        .export(
            &query.report_type,
            query.filter.into(),
            &query.format,
            Some(actor),
        )
        .await?;

    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        file.filename
    ))
    .map_err(|e| {
        AppError::internal(
            "Nombre de archivo inválido",
            json!({ "filename": file.filename, "reason": e.to_string() }),
        )
    })?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(file.content_type)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        file.body,
    )
        .into_response())
}
