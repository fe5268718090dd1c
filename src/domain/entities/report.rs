//! Report filters and result rows.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq)]
pub struct ReportFilter {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub station_id: Option<i64>,
    pub variable_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyAverage {
    pub date: NaiveDate,
    pub station_id: i64,
    pub station_name: String,
    pub average_value: f64,
    pub min_value: f64,
    pub max_value: f64,
    pub measurement_count: usize,
}

/// A run of consecutive critical water-level readings at one station.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CriticalEvent {
    pub id: i64,
    pub station_id: i64,
    pub station_name: String,
    pub water_level: f64,
    pub threshold: f64,
    pub timestamp: DateTime<Utc>,
    pub duration_minutes: i64,
}

/// Per-station summary over a date range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationComparison {
    pub station_id: i64,
    pub station_name: String,
    pub average_value: f64,
    pub min_value: f64,
    pub max_value: f64,
    pub measurement_count: usize,
    pub critical_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportType {
    DailyAverage,
    CriticalEvents,
    Comparative,
}

impl ReportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DailyAverage => "daily-average",
            Self::CriticalEvents => "critical-events",
            Self::Comparative => "comparative",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "daily-average" => Some(Self::DailyAverage),
            "critical-events" => Some(Self::CriticalEvents),
            "comparative" => Some(Self::Comparative),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Pdf,
    Excel,
}

impl ExportFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "csv" => Some(Self::Csv),
            "pdf" => Some(Self::Pdf),
            "excel" => Some(Self::Excel),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Pdf => "pdf",
            Self::Excel => "xlsx",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Csv => "text/csv; charset=utf-8",
            Self::Pdf => "application/pdf",
            Self::Excel => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        }
    }
}

/// A rendered report file ready to be served.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportFile {
    pub filename: String,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}
