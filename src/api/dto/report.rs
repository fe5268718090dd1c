//! DTOs for report endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};

use crate::domain::entities::ReportFilter;

/// Date window and optional narrowing shared by every report.
#[serde_as]
#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    #[serde(default, with = "super::pagination::optional_date_start")]
    pub start_date: Option<DateTime<Utc>>,

    #[serde(default, with = "super::pagination::optional_date_end")]
    pub end_date: Option<DateTime<Utc>>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub station_id: Option<i64>,

    pub variable_type: Option<String>,
}

impl From<ReportQuery> for ReportFilter {
    fn from(q: ReportQuery) -> Self {
        ReportFilter {
            start_date: q.start_date,
            end_date: q.end_date,
            station_id: q.station_id,
            variable_type: q.variable_type.filter(|v| !v.trim().is_empty()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    #[serde(rename = "type", default)]
    pub report_type: String,

    #[serde(default = "default_format")]
    pub format: String,

    #[serde(flatten)]
    pub filter: ReportQuery,
}

fn default_format() -> String {
    "csv".to_string()
}

#[derive(Debug, Serialize)]
pub struct ReportResponse<T> {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub total: usize,
    pub items: Vec<T>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_query_defaults_to_csv() {
        let q: ExportQuery = serde_json::from_value(serde_json::json!({
            "type": "daily-average",
            "start_date": "2026-01-01",
            "end_date": "2026-01-31",
            "station_id": "2"
        }))
        .unwrap();

        assert_eq!(q.format, "csv");
        assert_eq!(q.report_type, "daily-average");
        assert_eq!(q.filter.station_id, Some(2));
        assert!(q.filter.end_date > q.filter.start_date);
    }

    #[test]
    fn test_report_query_into_filter() {
        let filter = ReportFilter::from(ReportQuery {
            variable_type: Some(String::new()),
            station_id: Some(1),
            ..Default::default()
        });
        assert_eq!(filter.station_id, Some(1));
        assert!(filter.variable_type.is_none());
        assert!(filter.start_date.is_none());
    }
}
