//! DTOs for measurement queries and ingestion.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use validator::Validate;

use crate::application::services::measurement_service::VARIABLE_TYPE_REGEX;
use crate::domain::entities::{MeasurementFilter, Quality};
use crate::domain::reading_event::ReadingEvent;

#[serde_as]
#[derive(Debug, Default, Deserialize)]
pub struct HistoricalQuery {
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub station_id: Option<i64>,

    pub variable_type: Option<String>,

    #[serde(default, with = "super::pagination::optional_date_start")]
    pub start_date: Option<DateTime<Utc>>,

    #[serde(default, with = "super::pagination::optional_date_end")]
    pub end_date: Option<DateTime<Utc>>,
}

impl From<HistoricalQuery> for MeasurementFilter {
    fn from(q: HistoricalQuery) -> Self {
        MeasurementFilter {
            station_id: q.station_id,
            start_date: q.start_date,
            end_date: q.end_date,
            variable_type: q.variable_type.filter(|v| !v.trim().is_empty()),
        }
    }
}

#[serde_as]
#[derive(Debug, Default, Deserialize)]
pub struct LatestQuery {
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub station_id: Option<i64>,
}

/// Body of `POST /api/measurements`.
#[derive(Debug, Deserialize, Validate)]
pub struct RecordMeasurementRequest {
    #[validate(range(min = 1, message = "ID de estación inválido"))]
    pub station_id: i64,

    #[validate(length(min = 1, max = 50))]
    #[validate(regex(path = "*VARIABLE_TYPE_REGEX", message = "Tipo de variable inválido"))]
    pub variable_type: String,

    pub value: f64,

    #[validate(length(min = 1, max = 20))]
    pub unit: Option<String>,

    /// Reading time. Defaults to the time the request is accepted.
    pub timestamp: Option<DateTime<Utc>>,

    pub quality: Option<Quality>,
}

impl RecordMeasurementRequest {
    pub fn into_event(self, submitted_by: Option<i64>) -> ReadingEvent {
        let mut event = ReadingEvent::new(self.station_id, self.variable_type, self.value);
        event.unit = self.unit;
        event.quality = self.quality;
        event.submitted_by = submitted_by;
        if let Some(ts) = self.timestamp {
            event.timestamp = ts;
        }
        event
    }
}

/// Returned with `202 Accepted` once a reading is queued.
#[derive(Debug, Serialize)]
pub struct AcceptedResponse {
    pub status: &'static str,
    pub station_id: i64,
    pub variable_type: String,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(json: &str) -> RecordMeasurementRequest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_valid_request() {
        let req = request(r#"{"station_id": 1, "variable_type": "water_level", "value": 2.5}"#);
        assert!(req.validate().is_ok());

        let event = req.into_event(Some(7));
        assert_eq!(event.station_id, 1);
        assert_eq!(event.submitted_by, Some(7));
        assert!(event.unit.is_none());
    }

    #[test]
    fn test_invalid_station_id() {
        let req = request(r#"{"station_id": 0, "variable_type": "water_level", "value": 2.5}"#);
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_invalid_variable_type() {
        let req = request(r#"{"station_id": 1, "variable_type": "Water Level", "value": 2.5}"#);
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_explicit_timestamp_kept() {
        let req = request(
            r#"{"station_id": 2, "variable_type": "flow", "value": 10,
                "timestamp": "2026-05-01T12:00:00Z", "quality": "good"}"#,
        );
        let event = req.into_event(None);
        assert_eq!(event.timestamp.to_rfc3339(), "2026-05-01T12:00:00+00:00");
        assert_eq!(event.quality, Some(Quality::Good));
    }

    #[test]
    fn test_historical_query_into_filter() {
        let q = HistoricalQuery {
            station_id: Some(3),
            variable_type: Some("  ".into()),
            ..Default::default()
        };
        let filter = MeasurementFilter::from(q);
        assert_eq!(filter.station_id, Some(3));
        assert!(filter.variable_type.is_none());
    }
}
