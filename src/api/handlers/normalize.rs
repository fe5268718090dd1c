//! Handler for the normalization endpoint.

use axum::Json;

use crate::api::dto::normalize::{NormalizeRequest, NormalizeResponse};
use crate::application::normalization::{self, SourceType};
use crate::error::AppError;

/// Normalizes a raw payload into a chart series.
///
/// # Endpoint
///
/// `POST /api/normalize`
///
/// # Request
///
/// ```json
/// { "source_type": "api_v2", "data": [{ "datetime": "2026-01-01T10:00:00Z", "water_height": "2.4" }] }
/// ```
///
/// A `data` value that is not an array yields an empty series.
///
/// # Errors
///
/// Returns 400 for unknown source types.
pub async fn normalize_handler(
    Json(payload): Json<NormalizeRequest>,
) -> Result<Json<NormalizeResponse>, AppError> {
    let source_type = SourceType::parse(payload.source_type.trim())?;

    let dataset = normalization::normalize(&payload.data, source_type);
    let chart_config = normalization::chart_config(&dataset);

    Ok(Json(NormalizeResponse {
        dataset,
        chart_config,
    }))
}
