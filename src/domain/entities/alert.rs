//! Alerts raised from readings and the per-sensor configurations that drive them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Alert severity shown to operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

/// Threshold level within an alert configuration, ordered by gravity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThresholdLevel {
    Warning,
    Critical,
    Emergency,
}

impl ThresholdLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Critical => "critical",
            Self::Emergency => "emergency",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "warning" => Some(Self::Warning),
            "critical" => Some(Self::Critical),
            "emergency" => Some(Self::Emergency),
            _ => None,
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::Warning => Severity::Low,
            Self::Critical => Severity::Medium,
            Self::Emergency => Severity::High,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: i64,
    pub station_id: i64,
    pub station_name: Option<String>,
    pub variable_type: String,
    pub threshold_value: f64,
    pub current_value: f64,
    pub alert_type: String,
    pub message: String,
    pub severity: Severity,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewAlert {
    pub station_id: i64,
    pub station_name: Option<String>,
    pub variable_type: String,
    pub threshold_value: f64,
    pub current_value: f64,
    pub alert_type: String,
    pub message: String,
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertThreshold {
    pub id: i64,
    pub level: ThresholdLevel,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub tolerance: Option<f64>,
    /// Minutes a breach must persist before it counts.
    pub persistence_time: Option<i32>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Breach direction of a reading relative to a threshold band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Breach {
    Below(f64),
    Above(f64),
}

impl Breach {
    pub fn limit(&self) -> f64 {
        match self {
            Self::Below(v) | Self::Above(v) => *v,
        }
    }
}

impl AlertThreshold {
    /// Returns the breached bound when the value falls outside the band
    /// widened by `tolerance`.
    pub fn breach(&self, value: f64) -> Option<Breach> {
        if !self.is_active {
            return None;
        }

        let tolerance = self.tolerance.unwrap_or(0.0);

        if let Some(max) = self.max_value
            && value > max + tolerance
        {
            return Some(Breach::Above(max));
        }

        if let Some(min) = self.min_value
            && value < min - tolerance
        {
            return Some(Breach::Below(min));
        }

        None
    }
}

/// Threshold definition supplied when creating or replacing thresholds.
///
/// `id` is set when an existing threshold is being updated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdSpec {
    #[serde(default)]
    pub id: Option<i64>,
    pub level: ThresholdLevel,
    #[serde(default)]
    pub min_value: Option<f64>,
    #[serde(default)]
    pub max_value: Option<f64>,
    #[serde(default)]
    pub tolerance: Option<f64>,
    #[serde(default)]
    pub persistence_time: Option<i32>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertConfiguration {
    pub id: i64,
    pub station_id: i64,
    pub station_name: Option<String>,
    pub sensor_type: String,
    pub sensor_unit: String,
    pub is_active: bool,
    pub thresholds: Vec<AlertThreshold>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AlertConfiguration {
    /// Finds the most severe threshold breached by `value`.
    pub fn evaluate(&self, value: f64) -> Option<(&AlertThreshold, Breach)> {
        if !self.is_active {
            return None;
        }

        self.thresholds
            .iter()
            .filter_map(|t| t.breach(value).map(|b| (t, b)))
            .max_by_key(|(t, _)| t.level)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewAlertConfiguration {
    pub station_id: i64,
    pub station_name: Option<String>,
    pub sensor_type: String,
    pub sensor_unit: String,
    pub is_active: bool,
    pub thresholds: Vec<ThresholdSpec>,
}

/// Partial update for an alert configuration.
///
/// When `thresholds` is present it replaces the full threshold set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlertConfigurationPatch {
    pub is_active: Option<bool>,
    pub thresholds: Option<Vec<ThresholdSpec>>,
}
