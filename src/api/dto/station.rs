//! DTOs for station endpoints.

use serde::{Deserialize, Serialize};
use serde_json::json;
use serde_with::{DisplayFromStr, serde_as};

use super::pagination::PaginationParams;
use crate::application::services::station_service::{StationInput, StationUpdate};
use crate::domain::entities::{Station, StationStatus};
use crate::domain::pagination::{Page, Range, StationFilter};
use crate::error::AppError;

/// Body of `POST /api/stations`.
///
/// Text fields default to empty so the service reports them as missing with
/// its own messages.
#[derive(Debug, Deserialize)]
pub struct CreateStationRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub location: String,
    pub status: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub current_level: Option<f64>,
    pub threshold: Option<f64>,
}

fn required(value: Option<f64>, message: &str, field: &str) -> Result<f64, AppError> {
    value.ok_or_else(|| AppError::bad_request(message, json!({ "field": field })))
}

impl CreateStationRequest {
    pub fn into_input(self) -> Result<StationInput, AppError> {
        Ok(StationInput {
            latitude: required(self.latitude, "La latitud es requerida", "latitude")?,
            longitude: required(self.longitude, "La longitud es requerida", "longitude")?,
            threshold: required(self.threshold, "El umbral es requerido", "threshold")?,
            name: self.name,
            code: self.code,
            location: self.location,
            status: self.status,
            current_level: self.current_level,
        })
    }
}

/// Body of `PATCH /api/stations/{id}`. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateStationRequest {
    pub name: Option<String>,
    pub code: Option<String>,
    pub location: Option<String>,
    pub status: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub current_level: Option<f64>,
    pub threshold: Option<f64>,
}

impl From<UpdateStationRequest> for StationUpdate {
    fn from(r: UpdateStationRequest) -> Self {
        StationUpdate {
            name: r.name,
            code: r.code,
            location: r.location,
            status: r.status,
            latitude: r.latitude,
            longitude: r.longitude,
            current_level: r.current_level,
            threshold: r.threshold,
        }
    }
}

/// Query of `GET /api/stations`.
///
/// Without any pagination or filter parameter the full list is returned;
/// otherwise the response is a page.
#[serde_as]
#[derive(Debug, Default, Deserialize)]
pub struct StationListQuery {
    #[serde(flatten)]
    pub pagination: PaginationParams,

    pub name: Option<String>,
    pub code: Option<String>,
    pub location: Option<String>,
    pub status: Option<String>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub latitude_min: Option<f64>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub latitude_max: Option<f64>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub longitude_min: Option<f64>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub longitude_max: Option<f64>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub threshold_min: Option<f64>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub threshold_max: Option<f64>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub level_min: Option<f64>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub level_max: Option<f64>,
}

fn range(min: Option<f64>, max: Option<f64>) -> Option<Range> {
    (min.is_some() || max.is_some()).then_some(Range { min, max })
}

fn text(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

impl StationListQuery {
    /// True when the client asked for a page rather than the full list.
    pub fn is_paginated(&self) -> bool {
        let p = &self.pagination;
        p.page.is_some()
            || p.limit.is_some()
            || p.sort_by.is_some()
            || p.sort_order.is_some()
            || [&self.name, &self.code, &self.location, &self.status]
                .iter()
                .any(|v| text(v).is_some())
            || [
                self.latitude_min,
                self.latitude_max,
                self.longitude_min,
                self.longitude_max,
                self.threshold_min,
                self.threshold_max,
                self.level_min,
                self.level_max,
            ]
            .iter()
            .any(Option::is_some)
    }

    pub fn filter(&self) -> Result<StationFilter, AppError> {
        let status = match text(&self.status) {
            Some(s) => Some(s.parse::<StationStatus>().map_err(|_| {
                AppError::bad_request(
                    "Estado de estación inválido",
                    json!({ "status": s, "allowed": ["active", "maintenance", "inactive"] }),
                )
            })?),
            None => None,
        };

        Ok(StationFilter {
            name: text(&self.name),
            code: text(&self.code),
            location: text(&self.location),
            status,
            latitude: range(self.latitude_min, self.latitude_max),
            longitude: range(self.longitude_min, self.longitude_max),
            threshold: range(self.threshold_min, self.threshold_max),
            current_level: range(self.level_min, self.level_max),
        })
    }
}

/// Response of `GET /api/stations`: the full list, or a page when any
/// pagination or filter parameter was given.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum StationListResponse {
    Page(Page<Station>),
    All { total: usize, items: Vec<Station> },
}

/// Query of `GET /api/stations/{id}/series`.
#[derive(Debug, Default, Deserialize)]
pub struct SeriesQuery {
    pub variable_type: Option<String>,
    #[serde(default, with = "super::pagination::optional_date_start")]
    pub start_date: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default, with = "super::pagination::optional_date_end")]
    pub end_date: Option<chrono::DateTime<chrono::Utc>>,
}
