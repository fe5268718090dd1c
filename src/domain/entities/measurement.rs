//! Measurement entity: a timestamped sensor reading tied to a station.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Variable type slug for water level readings.
pub const WATER_LEVEL: &str = "water_level";

/// Default unit for a variable type.
///
/// Unknown variable types fall back to an empty unit.
pub fn default_unit(variable_type: &str) -> &'static str {
    match variable_type {
        "water_level" => "m",
        "flow" | "flow_rate" => "m3/s",
        "velocity" => "m/s",
        "temperature" => "°C",
        "turbidity" => "NTU",
        "ph" => "pH",
        "rainfall" => "mm",
        _ => "",
    }
}

/// Data quality flag attached by the sensor or operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    Good,
    Fair,
    Poor,
}

impl Quality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Good => "good",
            Self::Fair => "fair",
            Self::Poor => "poor",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "good" => Some(Self::Good),
            "fair" => Some(Self::Fair),
            "poor" => Some(Self::Poor),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub id: i64,
    pub station_id: i64,
    pub station_name: Option<String>,
    pub variable_type: String,
    pub value: f64,
    pub unit: String,
    pub timestamp: DateTime<Utc>,
    pub is_critical: bool,
    pub quality: Option<Quality>,
}

/// Input data for persisting a measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMeasurement {
    pub station_id: i64,
    pub station_name: Option<String>,
    pub variable_type: String,
    pub value: f64,
    pub unit: String,
    pub timestamp: DateTime<Utc>,
    pub is_critical: bool,
    pub quality: Option<Quality>,
}

/// Filter for historical measurement queries.
///
/// All fields are optional; an empty filter matches every reading.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeasurementFilter {
    pub station_id: Option<i64>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub variable_type: Option<String>,
}

impl MeasurementFilter {
    /// Returns true when the measurement satisfies every set criterion.
    pub fn matches(&self, m: &Measurement) -> bool {
        self.station_id.is_none_or(|id| m.station_id == id)
            && self
                .variable_type
                .as_deref()
                .is_none_or(|v| m.variable_type == v)
            && self.start_date.is_none_or(|from| m.timestamp >= from)
            && self.end_date.is_none_or(|to| m.timestamp <= to)
    }
}
