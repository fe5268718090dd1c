//! Background consumer of the reading ingest queue.
//!
//! Readings accepted by `POST /api/measurements` are processed here: each one
//! is persisted, the station level is advanced, the latest-readings cache is
//! invalidated for its station and the alert thresholds are evaluated.
//!
//! The insert and the station update are retried separately on transient
//! failures, so a failed station update never inserts the reading twice.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Semaphore, mpsc};
use tokio_retry::RetryIf;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, error, info, warn};

use crate::domain::entities::Alert;
use crate::domain::reading_event::ReadingEvent;
use crate::error::AppError;
use crate::infrastructure::cache::CacheService;
use crate::state::{DynAlertService, DynMeasurementService};

/// Attempts after the first one for transient failures.
const MAX_RETRIES: usize = 3;

/// Only storage-level failures are retried; validation and missing stations
/// would fail the same way again.
fn is_transient(error: &AppError) -> bool {
    matches!(
        error,
        AppError::Internal { .. } | AppError::ServiceUnavailable { .. }
    )
}

fn backoff() -> impl Iterator<Item = Duration> {
    ExponentialBackoff::from_millis(50)
        .max_delay(Duration::from_secs(2))
        .map(jitter)
        .take(MAX_RETRIES)
}

/// Outcome of processing one reading.
#[derive(Debug)]
pub enum ReadingOutcome {
    Recorded { alert: Option<Alert> },
    Failed(AppError),
}

/// Records one reading and evaluates its alert thresholds.
pub async fn process_reading(
    event: ReadingEvent,
    measurements: &DynMeasurementService,
    alerts: &DynAlertService,
    cache: &dyn CacheService,
) -> ReadingOutcome {
    let variable_type = event.variable_type.clone();

    let stored = RetryIf::start(backoff(), || measurements.store(event.clone()), is_transient).await;

    let (station, measurement) = match stored {
        Ok(pair) => pair,
        Err(e) => {
            metrics::counter!("measurements_failed_total", "variable_type" => variable_type)
                .increment(1);
            error!(
                station_id = event.station_id,
                error = %e,
                "Failed to record reading"
            );
            return ReadingOutcome::Failed(e);
        }
    };

    metrics::counter!("measurements_ingested_total", "variable_type" => variable_type).increment(1);

    let station = match RetryIf::start(
        backoff(),
        || measurements.apply_level(station.clone(), &measurement),
        is_transient,
    )
    .await
    {
        Ok(updated) => updated,
        Err(e) => {
            warn!(
                station_id = station.id,
                measurement_id = measurement.id,
                error = %e,
                "Failed to update station level"
            );
            station
        }
    };

    if let Err(e) = cache.invalidate_latest(station.id).await {
        warn!(station_id = station.id, "Failed to invalidate latest readings: {}", e);
    }

    let alert = match alerts.evaluate_reading(&station, &measurement).await {
        Ok(alert) => alert,
        Err(e) => {
            warn!(
                station_id = station.id,
                measurement_id = measurement.id,
                error = %e,
                "Alert evaluation failed"
            );
            None
        }
    };

    ReadingOutcome::Recorded { alert }
}

/// Drains `rx` until every sender is dropped, processing up to `concurrency`
/// readings at a time. In-flight readings finish before the function returns.
pub async fn run_reading_worker(
    mut rx: mpsc::Receiver<ReadingEvent>,
    measurements: Arc<DynMeasurementService>,
    alerts: Arc<DynAlertService>,
    cache: Arc<dyn CacheService>,
    concurrency: usize,
) {
    let concurrency = concurrency.max(1);
    let semaphore = Arc::new(Semaphore::new(concurrency));
    info!(concurrency, "Reading worker started");

    while let Some(event) = rx.recv().await {
        let Ok(permit) = semaphore.clone().acquire_owned().await else {
            break;
        };

        let measurements = measurements.clone();
        let alerts = alerts.clone();
        let cache = cache.clone();

        tokio::spawn(async move {
            let _permit = permit;
            let station_id = event.station_id;
            match process_reading(event, &measurements, &alerts, cache.as_ref()).await {
                ReadingOutcome::Recorded { alert: Some(alert) } => {
                    info!(station_id, alert_id = alert.id, "Alert opened");
                }
                ReadingOutcome::Recorded { alert: None } => {
                    debug!(station_id, "Reading processed");
                }
                ReadingOutcome::Failed(_) => {}
            }
        });
    }

    // Wait for in-flight readings.
    let _ = semaphore.acquire_many(concurrency as u32).await;
    info!("Reading worker stopped");
}
