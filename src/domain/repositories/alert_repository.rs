//! Repository traits for raised alerts and alert configurations.

use crate::domain::entities::{
    Alert, AlertConfiguration, AlertConfigurationPatch, NewAlert, NewAlertConfiguration,
};
use crate::error::AppError;
use async_trait::async_trait;

/// Raised alerts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AlertRepository: Send + Sync {
    /// Lists alerts newest first, optionally only unresolved ones.
    async fn find_all(&self, active_only: bool) -> Result<Vec<Alert>, AppError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Alert>, AppError>;

    /// Finds the unresolved alert for a station and variable, if any.
    async fn find_active(
        &self,
        station_id: i64,
        variable_type: &str,
    ) -> Result<Option<Alert>, AppError>;

    async fn create(&self, alert: NewAlert) -> Result<Alert, AppError>;

    /// Marks an alert resolved. Returns `Ok(None)` when it does not exist.
    async fn resolve(&self, id: i64) -> Result<Option<Alert>, AppError>;
}

/// Per-sensor alert configurations and their thresholds.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AlertConfigurationRepository: Send + Sync {
    async fn find_all(&self) -> Result<Vec<AlertConfiguration>, AppError>;

    async fn find_by_station(&self, station_id: i64)
    -> Result<Vec<AlertConfiguration>, AppError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<AlertConfiguration>, AppError>;

    async fn find_by_sensor(
        &self,
        station_id: i64,
        sensor_type: &str,
    ) -> Result<Option<AlertConfiguration>, AppError>;

    async fn create(
        &self,
        configuration: NewAlertConfiguration,
    ) -> Result<AlertConfiguration, AppError>;

    /// Replaces thresholds when `patch.thresholds` is set.
    async fn update(
        &self,
        id: i64,
        patch: AlertConfigurationPatch,
    ) -> Result<Option<AlertConfiguration>, AppError>;

    async fn delete(&self, id: i64) -> Result<bool, AppError>;
}
