//! Measurement queries and reading ingestion.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde_json::json;

use crate::application::services::activity_service::log_activity;
use crate::domain::entities::{
    ActivityStatus, ActivityType, Measurement, MeasurementFilter, NewActivityLog, NewMeasurement,
    Station, WATER_LEVEL, measurement::default_unit,
};
use crate::domain::reading_event::ReadingEvent;
use crate::domain::repositories::{
    ActivityLogRepository, MeasurementRepository, StationRepository,
};
use crate::error::AppError;

/// Number of readings returned by [`MeasurementService::latest`].
pub const LATEST_LIMIT: usize = 24;

/// Variable types are lowercase slugs such as `water_level`.
pub static VARIABLE_TYPE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9_]{0,49}$").unwrap());

/// Checks a reading before it is queued or recorded.
pub fn validate_reading(event: &ReadingEvent) -> Result<(), AppError> {
    if event.station_id <= 0 {
        return Err(AppError::bad_request(
            "ID de estación inválido",
            json!({ "station_id": event.station_id }),
        ));
    }
    if !VARIABLE_TYPE_REGEX.is_match(&event.variable_type) {
        return Err(AppError::bad_request(
            "Tipo de variable inválido",
            json!({ "variable_type": event.variable_type }),
        ));
    }
    if !event.value.is_finite() {
        return Err(AppError::bad_request(
            "El valor de la medición debe ser numérico",
            json!({ "field": "value" }),
        ));
    }
    Ok(())
}

/// Service for reading queries and persistence.
///
/// Recording a water-level reading also refreshes the station's
/// `current_level` and `last_measurement`. Alert evaluation is done by
/// [`crate::application::services::AlertService`] on the returned pair.
pub struct MeasurementService<M, S, A>
where
    M: MeasurementRepository + ?Sized,
    S: StationRepository + ?Sized,
    A: ActivityLogRepository + ?Sized,
{
    measurements: Arc<M>,
    stations: Arc<S>,
    activity: Arc<A>,
}

impl<M, S, A> MeasurementService<M, S, A>
where
    M: MeasurementRepository + ?Sized,
    S: StationRepository + ?Sized,
    A: ActivityLogRepository + ?Sized,
{
    pub fn new(measurements: Arc<M>, stations: Arc<S>, activity: Arc<A>) -> Self {
        Self {
            measurements,
            stations,
            activity,
        }
    }

    /// Returns the newest readings, newest first.
    pub async fn latest(&self, station_id: Option<i64>) -> Result<Vec<Measurement>, AppError> {
        self.measurements.find_latest(station_id, LATEST_LIMIT).await
    }

    /// Returns readings matching `filter`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] when the start date is after the end date.
    pub async fn historical(
        &self,
        filter: MeasurementFilter,
    ) -> Result<Vec<Measurement>, AppError> {
        if let (Some(from), Some(to)) = (filter.start_date, filter.end_date)
            && from > to
        {
            return Err(AppError::bad_request(
                "La fecha de inicio debe ser anterior a la fecha de fin",
                json!({ "start_date": from, "end_date": to }),
            ));
        }

        self.measurements.find_historical(filter).await
    }

    /// Persists a reading and returns it with the refreshed station.
    ///
    /// Equivalent to [`Self::store`] followed by [`Self::apply_level`].
    ///
    /// # Errors
    ///
    /// - [`AppError::Validation`] for malformed readings
    /// - [`AppError::NotFound`] when the station does not exist
    pub async fn record(&self, event: ReadingEvent) -> Result<(Station, Measurement), AppError> {
        let (station, measurement) = self.store(event).await?;
        let station = self.apply_level(station, &measurement).await?;
        Ok((station, measurement))
    }

    /// Inserts a reading without touching the station row.
    ///
    /// Critical water-level readings are also written to the activity log.
    pub async fn store(&self, event: ReadingEvent) -> Result<(Station, Measurement), AppError> {
        validate_reading(&event)?;

        let station = self
            .stations
            .find_by_id(event.station_id)
            .await?
            .ok_or_else(|| station_not_found(event.station_id))?;

        let is_critical = event.variable_type == WATER_LEVEL && event.value >= station.threshold;
        let unit = event
            .unit
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| default_unit(&event.variable_type).to_string());

        let measurement = self
            .measurements
            .create(NewMeasurement {
                station_id: station.id,
                station_name: Some(station.name.clone()),
                variable_type: event.variable_type,
                value: event.value,
                unit,
                timestamp: event.timestamp,
                is_critical,
                quality: event.quality,
            })
            .await?;

        if is_critical {
            let entry = NewActivityLog::new(
                ActivityType::MeasurementRecorded,
                "Medición crítica registrada",
                format!(
                    "{} registró {} {} (umbral {} {})",
                    station.name, measurement.value, measurement.unit, station.threshold, measurement.unit
                ),
            )
            .with_status(ActivityStatus::Warning)
            .with_station(station.id, station.name.clone())
            .with_metadata(json!({ "measurement_id": measurement.id }));
            log_activity(self.activity.as_ref(), entry).await;
        }

        tracing::debug!(
            station_id = station.id,
            measurement_id = measurement.id,
            is_critical,
            "Reading stored"
        );

        Ok((station, measurement))
    }

    /// Moves the station's `current_level` to a stored water-level reading.
    ///
    /// Readings older than the station's `last_measurement` and other
    /// variables leave the station unchanged. Safe to repeat.
    pub async fn apply_level(
        &self,
        station: Station,
        measurement: &Measurement,
    ) -> Result<Station, AppError> {
        if measurement.variable_type != WATER_LEVEL {
            return Ok(station);
        }

        self.stations
            .record_level(station.id, measurement.value, measurement.timestamp)
            .await?
            .ok_or_else(|| station_not_found(station.id))
    }
}

fn station_not_found(id: i64) -> AppError {
    AppError::not_found(
        format!("No se encontró la estación con ID: {id}"),
        json!({ "station_id": id }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{ActivityLog, StationStatus};
    use crate::domain::repositories::{
        MockActivityLogRepository, MockMeasurementRepository, MockStationRepository,
    };
    use chrono::{Duration, Utc};

    type Service =
        MeasurementService<MockMeasurementRepository, MockStationRepository, MockActivityLogRepository>;

    fn station() -> Station {
        Station {
            id: 1,
            name: "Río Claro Norte".to_string(),
            code: "RCN-001".to_string(),
            location: "Pucón".to_string(),
            status: StationStatus::Active,
            latitude: -39.28,
            longitude: -71.95,
            current_level: 1.0,
            threshold: 3.0,
            last_measurement: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn stored(new: NewMeasurement) -> Measurement {
        Measurement {
            id: 100,
            station_id: new.station_id,
            station_name: new.station_name,
            variable_type: new.variable_type,
            value: new.value,
            unit: new.unit,
            timestamp: new.timestamp,
            is_critical: new.is_critical,
            quality: new.quality,
        }
    }

    fn activity() -> MockActivityLogRepository {
        let mut repo = MockActivityLogRepository::new();
        repo.expect_create().returning(|e| {
            Ok(ActivityLog {
                id: 1,
                timestamp: e.timestamp,
                user_id: None,
                user_name: None,
                activity_type: e.activity_type,
                title: e.title,
                description: e.description,
                status: e.status,
                station_id: e.station_id,
                station_name: e.station_name,
                ip_address: None,
                user_agent: None,
                metadata: e.metadata,
                created_at: Utc::now(),
            })
        });
        repo
    }

    fn service(measurements: MockMeasurementRepository, stations: MockStationRepository) -> Service {
        MeasurementService::new(Arc::new(measurements), Arc::new(stations), Arc::new(activity()))
    }

    #[test]
    fn test_validate_reading() {
        assert!(validate_reading(&ReadingEvent::new(1, "water_level", 1.0)).is_ok());
        assert!(validate_reading(&ReadingEvent::new(0, "water_level", 1.0)).is_err());
        assert!(validate_reading(&ReadingEvent::new(1, "Water Level", 1.0)).is_err());
        assert!(validate_reading(&ReadingEvent::new(1, "flow", f64::NAN)).is_err());
    }

    #[tokio::test]
    async fn test_latest_uses_fixed_limit() {
        let mut measurements = MockMeasurementRepository::new();
        measurements
            .expect_find_latest()
            .withf(|station_id, limit| *station_id == Some(2) && *limit == 24)
            .times(1)
            .returning(|_, _| Ok(vec![]));

        let result = service(measurements, MockStationRepository::new())
            .latest(Some(2))
            .await
            .unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_historical_rejects_inverted_range() {
        let mut measurements = MockMeasurementRepository::new();
        measurements.expect_find_historical().never();

        let filter = MeasurementFilter {
            start_date: Some(Utc::now()),
            end_date: Some(Utc::now() - Duration::hours(1)),
            ..Default::default()
        };
        let err = service(measurements, MockStationRepository::new())
            .historical(filter)
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "La fecha de inicio debe ser anterior a la fecha de fin"
        );
    }

    #[tokio::test]
    async fn test_record_critical_water_level_updates_station() {
        let mut stations = MockStationRepository::new();
        stations.expect_find_by_id().returning(|_| Ok(Some(station())));
        stations
            .expect_record_level()
            .withf(|id, level, _| *id == 1 && *level == 3.4)
            .times(1)
            .returning(|_, level, ts| {
                let mut s = station();
                s.current_level = level;
                s.last_measurement = Some(ts);
                Ok(Some(s))
            });

        let mut measurements = MockMeasurementRepository::new();
        measurements
            .expect_create()
            .withf(|m| m.is_critical && m.unit == "m")
            .times(1)
            .returning(|m| Ok(stored(m)));

        let (station, measurement) = service(measurements, stations)
            .record(ReadingEvent::new(1, WATER_LEVEL, 3.4))
            .await
            .unwrap();

        assert!(measurement.is_critical);
        assert_eq!(station.current_level, 3.4);
    }

    #[tokio::test]
    async fn test_record_other_variable_leaves_station() {
        let mut stations = MockStationRepository::new();
        stations.expect_find_by_id().returning(|_| Ok(Some(station())));
        stations.expect_record_level().never();

        let mut measurements = MockMeasurementRepository::new();
        measurements
            .expect_create()
            .withf(|m| !m.is_critical && m.unit == "m3/s")
            .returning(|m| Ok(stored(m)));

        let (_, measurement) = service(measurements, stations)
            .record(ReadingEvent::new(1, "flow", 50.0))
            .await
            .unwrap();
        assert_eq!(measurement.variable_type, "flow");
    }

    #[tokio::test]
    async fn test_record_unknown_station() {
        let mut stations = MockStationRepository::new();
        stations.expect_find_by_id().returning(|_| Ok(None));
        let mut measurements = MockMeasurementRepository::new();
        measurements.expect_create().never();

        let err = service(measurements, stations)
            .record(ReadingEvent::new(9, WATER_LEVEL, 1.0))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_record_older_reading_keeps_stored_level() {
        let newest = Utc::now();
        let mut stations = MockStationRepository::new();
        stations.expect_find_by_id().returning(move |_| {
            let mut s = station();
            s.current_level = 2.2;
            s.last_measurement = Some(newest);
            Ok(Some(s))
        });
        stations.expect_update().never();
        // The repository decides; an older reading comes back unchanged.
        stations
            .expect_record_level()
            .withf(move |_, _, ts| *ts < newest)
            .times(1)
            .returning(move |_, _, _| {
                let mut s = station();
                s.current_level = 2.2;
                s.last_measurement = Some(newest);
                Ok(Some(s))
            });

        let mut measurements = MockMeasurementRepository::new();
        measurements.expect_create().returning(|m| Ok(stored(m)));

        let mut event = ReadingEvent::new(1, WATER_LEVEL, 1.5);
        event.timestamp = newest - Duration::hours(2);
        let (station, _) = service(measurements, stations).record(event).await.unwrap();
        assert_eq!(station.current_level, 2.2);
    }

    #[tokio::test]
    async fn test_store_does_not_touch_station() {
        let mut stations = MockStationRepository::new();
        stations.expect_find_by_id().returning(|_| Ok(Some(station())));
        stations.expect_update().never();
        stations.expect_record_level().never();

        let mut measurements = MockMeasurementRepository::new();
        measurements.expect_create().times(1).returning(|m| Ok(stored(m)));

        let (station, measurement) = service(measurements, stations)
            .store(ReadingEvent::new(1, WATER_LEVEL, 2.0))
            .await
            .unwrap();
        assert_eq!(station.current_level, 1.0);
        assert_eq!(measurement.value, 2.0);
    }
}
