//! Station entity representing a river monitoring site.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Operational status of a station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StationStatus {
    Active,
    Maintenance,
    Inactive,
}

impl StationStatus {
    pub const ALL: [StationStatus; 3] = [Self::Active, Self::Maintenance, Self::Inactive];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Maintenance => "maintenance",
            Self::Inactive => "inactive",
        }
    }
}

impl fmt::Display for StationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "maintenance" => Ok(Self::Maintenance),
            "inactive" => Ok(Self::Inactive),
            other => Err(format!("unknown station status '{other}'")),
        }
    }
}

/// A physical monitoring location with coordinates and an alert threshold.
///
/// `current_level` and `last_measurement` track the latest water-level
/// reading and are refreshed by the ingestion path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub location: String,
    pub status: StationStatus,
    pub latitude: f64,
    pub longitude: f64,
    pub current_level: f64,
    pub threshold: f64,
    pub last_measurement: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Station {
    /// Returns true when the current level reached the station threshold.
    pub fn is_above_threshold(&self) -> bool {
        self.current_level >= self.threshold
    }
}

/// Input data for creating a station.
#[derive(Debug, Clone, PartialEq)]
pub struct NewStation {
    pub name: String,
    pub code: String,
    pub location: String,
    pub status: StationStatus,
    pub latitude: f64,
    pub longitude: f64,
    pub current_level: f64,
    pub threshold: f64,
    pub last_measurement: Option<DateTime<Utc>>,
}

/// Partial update for an existing station.
///
/// `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StationPatch {
    pub name: Option<String>,
    pub code: Option<String>,
    pub location: Option<String>,
    pub status: Option<StationStatus>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub current_level: Option<f64>,
    pub threshold: Option<f64>,
    pub last_measurement: Option<DateTime<Utc>>,
}

impl StationPatch {
    /// Returns true when no field is set.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.code.is_none()
            && self.location.is_none()
            && self.status.is_none()
            && self.latitude.is_none()
            && self.longitude.is_none()
            && self.current_level.is_none()
            && self.threshold.is_none()
            && self.last_measurement.is_none()
    }

    /// Applies the patch to a station in place.
    pub fn apply(&self, station: &mut Station) {
        if let Some(name) = &self.name {
            station.name = name.clone();
        }
        if let Some(code) = &self.code {
            station.code = code.clone();
        }
        if let Some(location) = &self.location {
            station.location = location.clone();
        }
        if let Some(status) = self.status {
            station.status = status;
        }
        if let Some(latitude) = self.latitude {
            station.latitude = latitude;
        }
        if let Some(longitude) = self.longitude {
            station.longitude = longitude;
        }
        if let Some(current_level) = self.current_level {
            station.current_level = current_level;
        }
        if let Some(threshold) = self.threshold {
            station.threshold = threshold;
        }
        if let Some(last_measurement) = self.last_measurement {
            station.last_measurement = Some(last_measurement);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Station {
        Station {
            id: 1,
            name: "Estación Río Claro Norte".to_string(),
            code: "RCN-001".to_string(),
            location: "Pucón".to_string(),
            status: StationStatus::Active,
            latitude: -39.29,
            longitude: -71.95,
            current_level: 2.1,
            threshold: 3.0,
            last_measurement: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_status_round_trip_through_str() {
        for status in StationStatus::ALL {
            assert_eq!(status.as_str().parse::<StationStatus>().unwrap(), status);
        }
        assert!("broken".parse::<StationStatus>().is_err());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&StationStatus::Maintenance).unwrap();
        assert_eq!(json, "\"maintenance\"");
    }

    #[test]
    fn test_is_above_threshold() {
        let mut station = sample();
        assert!(!station.is_above_threshold());
        station.current_level = 3.0;
        assert!(station.is_above_threshold());
    }

    #[test]
    fn test_patch_apply_only_touches_present_fields() {
        let mut station = sample();
        let patch = StationPatch {
            threshold: Some(4.5),
            status: Some(StationStatus::Maintenance),
            ..Default::default()
        };

        patch.apply(&mut station);

        assert_eq!(station.threshold, 4.5);
        assert_eq!(station.status, StationStatus::Maintenance);
        assert_eq!(station.code, "RCN-001");
    }

    #[test]
    fn test_patch_is_empty() {
        assert!(StationPatch::default().is_empty());
        assert!(
            !StationPatch {
                name: Some("x".to_string()),
                ..Default::default()
            }
            .is_empty()
        );
    }
}
