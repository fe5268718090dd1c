//! Repository trait for sensor readings.

use crate::domain::entities::{Measurement, MeasurementFilter, NewMeasurement};
use crate::error::AppError;
use async_trait::async_trait;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MeasurementRepository: Send + Sync {
    /// Returns at most `limit` readings, newest first.
    async fn find_latest(
        &self,
        station_id: Option<i64>,
        limit: usize,
    ) -> Result<Vec<Measurement>, AppError>;

    /// Returns every reading matching `filter`, oldest first.
    async fn find_historical(
        &self,
        filter: MeasurementFilter,
    ) -> Result<Vec<Measurement>, AppError>;

    async fn create(&self, measurement: NewMeasurement) -> Result<Measurement, AppError>;
}
