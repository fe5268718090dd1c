//! Reading event model for asynchronous ingestion.

use chrono::{DateTime, Utc};

use crate::domain::entities::Quality;

/// A sensor reading accepted by the API and waiting to be recorded.
///
/// Handlers send it through a bounded channel so the HTTP response does not
/// wait for persistence and alert evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadingEvent {
    pub station_id: i64,
    pub variable_type: String,
    pub value: f64,
    pub unit: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub quality: Option<Quality>,
    /// User that submitted the reading, if authenticated.
    pub submitted_by: Option<i64>,
}

impl ReadingEvent {
    pub fn new(station_id: i64, variable_type: impl Into<String>, value: f64) -> Self {
        Self {
            station_id,
            variable_type: variable_type.into(),
            value,
            unit: None,
            timestamp: Utc::now(),
            quality: None,
            submitted_by: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reading_event_defaults() {
        let event = ReadingEvent::new(3, "water_level", 2.4);

        assert_eq!(event.station_id, 3);
        assert_eq!(event.variable_type, "water_level");
        assert!(event.unit.is_none());
        assert!(event.quality.is_none());
        assert!(event.timestamp <= Utc::now());
    }
}
