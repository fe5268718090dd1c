//! Alert configuration management.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::json;

use crate::application::services::activity_service::{attributed, log_activity};
use crate::domain::entities::{
    ActivityType, AlertConfiguration, AlertConfigurationPatch, NewActivityLog,
    NewAlertConfiguration, ThresholdSpec, User, measurement::default_unit,
};
use crate::domain::repositories::{
    ActivityLogRepository, AlertConfigurationRepository, StationRepository,
};
use crate::error::AppError;

/// Raw configuration input as received from clients.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertConfigurationInput {
    pub station_id: i64,
    pub sensor_type: String,
    pub sensor_unit: Option<String>,
    pub is_active: Option<bool>,
    pub thresholds: Vec<ThresholdSpec>,
}

pub struct AlertConfigurationService<C, S, A>
where
    C: AlertConfigurationRepository + ?Sized,
    S: StationRepository + ?Sized,
    A: ActivityLogRepository + ?Sized,
{
    configurations: Arc<C>,
    stations: Arc<S>,
    activity: Arc<A>,
}

impl<C, S, A> AlertConfigurationService<C, S, A>
where
    C: AlertConfigurationRepository + ?Sized,
    S: StationRepository + ?Sized,
    A: ActivityLogRepository + ?Sized,
{
    pub fn new(configurations: Arc<C>, stations: Arc<S>, activity: Arc<A>) -> Self {
        Self {
            configurations,
            stations,
            activity,
        }
    }

    pub async fn list_configurations(&self) -> Result<Vec<AlertConfiguration>, AppError> {
        self.configurations.find_all().await
    }

    pub async fn configurations_for_station(
        &self,
        station_id: i64,
    ) -> Result<Vec<AlertConfiguration>, AppError> {
        validate_station_id(station_id)?;
        self.configurations.find_by_station(station_id).await
    }

    pub async fn get_configuration(&self, id: i64) -> Result<AlertConfiguration, AppError> {
        validate_id(id)?;
        self.configurations
            .find_by_id(id)
            .await?
            .ok_or_else(|| configuration_not_found(id))
    }

    pub async fn configuration_for_sensor(
        &self,
        station_id: i64,
        sensor_type: &str,
    ) -> Result<Option<AlertConfiguration>, AppError> {
        validate_station_id(station_id)?;
        self.configurations
            .find_by_sensor(station_id, sensor_type.trim())
            .await
    }

    /// Creates a configuration for a station sensor.
    ///
    /// # Errors
    ///
    /// - [`AppError::Validation`] for invalid thresholds or missing fields
    /// - [`AppError::NotFound`] when the station does not exist
    /// - [`AppError::Conflict`] when the sensor already has a configuration
    pub async fn create_configuration(
        &self,
        input: AlertConfigurationInput,
        actor: Option<&User>,
    ) -> Result<AlertConfiguration, AppError> {
        validate_station_id(input.station_id)?;

        let sensor_type = input.sensor_type.trim().to_lowercase();
        if sensor_type.is_empty() {
            return Err(AppError::bad_request(
                "Tipo de sensor requerido",
                json!({ "field": "sensor_type" }),
            ));
        }

        validate_thresholds(&input.thresholds)?;

        let station = self
            .stations
            .find_by_id(input.station_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(
                    format!("No se encontró la estación con ID: {}", input.station_id),
                    json!({ "station_id": input.station_id }),
                )
            })?;

        if self
            .configurations
            .find_by_sensor(station.id, &sensor_type)
            .await?
            .is_some()
        {
            return Err(AppError::conflict(
                format!("Ya existe una configuración para el sensor {sensor_type} en esta estación"),
                json!({ "station_id": station.id, "sensor_type": sensor_type }),
            ));
        }

        let sensor_unit = input
            .sensor_unit
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| default_unit(&sensor_type).to_string());

        let configuration = self
            .configurations
            .create(NewAlertConfiguration {
                station_id: station.id,
                station_name: Some(station.name.clone()),
                sensor_type,
                sensor_unit,
                is_active: input.is_active.unwrap_or(true),
                thresholds: input.thresholds,
            })
            .await?;

        let entry = NewActivityLog::new(
            ActivityType::ConfigurationChanged,
            "Configuración de alerta creada",
            format!(
                "Se configuraron {} umbrales para {} en {}",
                configuration.thresholds.len(),
                configuration.sensor_type,
                station.name
            ),
        )
        .with_station(station.id, station.name);
        log_activity(self.activity.as_ref(), attributed(entry, actor)).await;

        Ok(configuration)
    }

    pub async fn update_configuration(
        &self,
        id: i64,
        patch: AlertConfigurationPatch,
        actor: Option<&User>,
    ) -> Result<AlertConfiguration, AppError> {
        validate_id(id)?;

        self.configurations
            .find_by_id(id)
            .await?
            .ok_or_else(|| configuration_not_found(id))?;

        if let Some(thresholds) = &patch.thresholds {
            validate_thresholds(thresholds)?;
        }

        let thresholds_changed = patch.thresholds.is_some();
        let configuration = self
            .configurations
            .update(id, patch)
            .await?
            .ok_or_else(|| configuration_not_found(id))?;

        let activity_type = if thresholds_changed {
            ActivityType::ThresholdUpdated
        } else {
            ActivityType::ConfigurationChanged
        };
        let mut entry = NewActivityLog::new(
            activity_type,
            "Configuración de alerta actualizada",
            format!("Se actualizó la configuración de {}", configuration.sensor_type),
        );
        if let Some(name) = &configuration.station_name {
            entry = entry.with_station(configuration.station_id, name.clone());
        }
        log_activity(self.activity.as_ref(), attributed(entry, actor)).await;

        Ok(configuration)
    }

    pub async fn delete_configuration(
        &self,
        id: i64,
        actor: Option<&User>,
    ) -> Result<(), AppError> {
        validate_id(id)?;

        let existing = self
            .configurations
            .find_by_id(id)
            .await?
            .ok_or_else(|| configuration_not_found(id))?;

        if !self.configurations.delete(id).await? {
            return Err(configuration_not_found(id));
        }

        let entry = NewActivityLog::new(
            ActivityType::ConfigurationChanged,
            "Configuración de alerta eliminada",
            format!("Se eliminó la configuración de {}", existing.sensor_type),
        );
        log_activity(self.activity.as_ref(), attributed(entry, actor)).await;

        Ok(())
    }
}

/// Rejects empty sets, duplicated levels, inverted bands and negative
/// persistence or tolerance.
fn validate_thresholds(thresholds: &[ThresholdSpec]) -> Result<(), AppError> {
    if thresholds.is_empty() {
        return Err(AppError::bad_request(
            "Al menos un umbral es requerido",
            json!({ "field": "thresholds" }),
        ));
    }

    let mut seen = HashSet::new();
    if !thresholds.iter().all(|t| seen.insert(t.level)) {
        return Err(AppError::bad_request(
            "No se pueden duplicar niveles de umbral",
            json!({ "field": "thresholds" }),
        ));
    }

    for threshold in thresholds {
        if let (Some(min), Some(max)) = (threshold.min_value, threshold.max_value)
            && min >= max
        {
            return Err(AppError::bad_request(
                format!(
                    "Valor mínimo debe ser menor al máximo para el nivel {}",
                    threshold.level.as_str()
                ),
                json!({ "level": threshold.level, "min_value": min, "max_value": max }),
            ));
        }
        if threshold.persistence_time.is_some_and(|p| p < 0) {
            return Err(AppError::bad_request(
                "Tiempo de persistencia debe ser mayor o igual a 0",
                json!({ "level": threshold.level }),
            ));
        }
        if threshold.tolerance.is_some_and(|t| t < 0.0) {
            return Err(AppError::bad_request(
                "La tolerancia no puede ser negativa",
                json!({ "level": threshold.level }),
            ));
        }
    }

    Ok(())
}

fn validate_id(id: i64) -> Result<(), AppError> {
    if id <= 0 {
        return Err(AppError::bad_request(
            "ID de configuración inválido",
            json!({ "id": id }),
        ));
    }
    Ok(())
}

fn validate_station_id(station_id: i64) -> Result<(), AppError> {
    if station_id <= 0 {
        return Err(AppError::bad_request(
            "ID de estación requerido y debe ser mayor a 0",
            json!({ "station_id": station_id }),
        ));
    }
    Ok(())
}

fn configuration_not_found(id: i64) -> AppError {
    AppError::not_found("Configuración de alerta no encontrada", json!({ "id": id }))
}
