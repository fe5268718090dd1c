use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use tokio::sync::RwLock;

use super::Table;
use crate::domain::entities::{
    Alert, AlertConfiguration, AlertConfigurationPatch, AlertThreshold, NewAlert,
    NewAlertConfiguration, ThresholdSpec,
};
use crate::domain::repositories::{AlertConfigurationRepository, AlertRepository};
use crate::error::AppError;

pub struct MemoryAlertRepository {
    table: RwLock<Table<Alert>>,
}

impl MemoryAlertRepository {
    pub fn new(alerts: Vec<Alert>) -> Self {
        Self {
            table: RwLock::new(Table::new(alerts, |a| a.id)),
        }
    }
}

impl Default for MemoryAlertRepository {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl AlertRepository for MemoryAlertRepository {
    async fn find_all(&self, active_only: bool) -> Result<Vec<Alert>, AppError> {
        let mut alerts: Vec<Alert> = self
            .table
            .read()
            .await
            .rows
            .iter()
            .filter(|a| !active_only || a.is_active)
            .cloned()
            .collect();
        alerts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(alerts)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Alert>, AppError> {
        Ok(self
            .table
            .read()
            .await
            .rows
            .iter()
            .find(|a| a.id == id)
            .cloned())
    }

    async fn find_active(
        &self,
        station_id: i64,
        variable_type: &str,
    ) -> Result<Option<Alert>, AppError> {
        Ok(self
            .table
            .read()
            .await
            .rows
            .iter()
            .filter(|a| a.is_active && a.station_id == station_id && a.variable_type == variable_type)
            .max_by_key(|a| (a.severity, a.created_at))
            .cloned())
    }

    async fn create(&self, alert: NewAlert) -> Result<Alert, AppError> {
        let mut table = self.table.write().await;
        let created = Alert {
            id: table.allocate_id(),
            station_id: alert.station_id,
            station_name: alert.station_name,
            variable_type: alert.variable_type,
            threshold_value: alert.threshold_value,
            current_value: alert.current_value,
            alert_type: alert.alert_type,
            message: alert.message,
            severity: alert.severity,
            is_active: true,
            created_at: Utc::now(),
            resolved_at: None,
        };
        table.rows.push(created.clone());
        Ok(created)
    }

    async fn resolve(&self, id: i64) -> Result<Option<Alert>, AppError> {
        let mut table = self.table.write().await;
        let Some(alert) = table.rows.iter_mut().find(|a| a.id == id) else {
            return Ok(None);
        };
        if alert.is_active {
            alert.is_active = false;
            alert.resolved_at = Some(Utc::now());
        }
        Ok(Some(alert.clone()))
    }
}

#[derive(Debug)]
struct ConfigurationRows {
    configurations: Table<AlertConfiguration>,
    next_threshold_id: i64,
}

impl ConfigurationRows {
    /// Builds thresholds from specs, keeping ids and creation times of
    /// thresholds that already exist in `previous`.
    fn thresholds(
        &mut self,
        specs: Vec<ThresholdSpec>,
        previous: &[AlertThreshold],
    ) -> Vec<AlertThreshold> {
        let now = Utc::now();
        specs
            .into_iter()
            .map(|spec| {
                let existing = spec
                    .id
                    .and_then(|id| previous.iter().find(|t| t.id == id));
                let (id, created_at) = match existing {
                    Some(t) => (t.id, t.created_at),
                    None => {
                        let id = self.next_threshold_id;
                        self.next_threshold_id += 1;
                        (id, now)
                    }
                };
                AlertThreshold {
                    id,
                    level: spec.level,
                    min_value: spec.min_value,
                    max_value: spec.max_value,
                    tolerance: spec.tolerance,
                    persistence_time: spec.persistence_time,
                    is_active: spec.is_active,
                    created_at,
                    updated_at: now,
                }
            })
            .collect()
    }
}

pub struct MemoryAlertConfigurationRepository {
    rows: RwLock<ConfigurationRows>,
}

impl MemoryAlertConfigurationRepository {
    pub fn new(configurations: Vec<AlertConfiguration>) -> Self {
        let next_threshold_id = configurations
            .iter()
            .flat_map(|c| c.thresholds.iter().map(|t| t.id))
            .max()
            .unwrap_or(0)
            + 1;
        Self {
            rows: RwLock::new(ConfigurationRows {
                configurations: Table::new(configurations, |c| c.id),
                next_threshold_id,
            }),
        }
    }
}

impl Default for MemoryAlertConfigurationRepository {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl AlertConfigurationRepository for MemoryAlertConfigurationRepository {
    async fn find_all(&self) -> Result<Vec<AlertConfiguration>, AppError> {
        Ok(self.rows.read().await.configurations.rows.clone())
    }

    async fn find_by_station(
        &self,
        station_id: i64,
    ) -> Result<Vec<AlertConfiguration>, AppError> {
        Ok(self
            .rows
            .read()
            .await
            .configurations
            .rows
            .iter()
            .filter(|c| c.station_id == station_id)
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<AlertConfiguration>, AppError> {
        Ok(self
            .rows
            .read()
            .await
            .configurations
            .rows
            .iter()
            .find(|c| c.id == id)
            .cloned())
    }

    async fn find_by_sensor(
        &self,
        station_id: i64,
        sensor_type: &str,
    ) -> Result<Option<AlertConfiguration>, AppError> {
        Ok(self
            .rows
            .read()
            .await
            .configurations
            .rows
            .iter()
            .find(|c| c.station_id == station_id && c.sensor_type == sensor_type)
            .cloned())
    }

    async fn create(
        &self,
        configuration: NewAlertConfiguration,
    ) -> Result<AlertConfiguration, AppError> {
        let mut rows = self.rows.write().await;
        if rows.configurations.rows.iter().any(|c| {
            c.station_id == configuration.station_id && c.sensor_type == configuration.sensor_type
        }) {
            return Err(AppError::conflict(
                format!(
                    "Ya existe una configuración para el sensor {} en esta estación",
                    configuration.sensor_type
                ),
                json!({
                    "station_id": configuration.station_id,
                    "sensor_type": configuration.sensor_type,
                }),
            ));
        }
        let now = Utc::now();
        let thresholds = rows.thresholds(configuration.thresholds, &[]);
        let created = AlertConfiguration {
            id: rows.configurations.allocate_id(),
            station_id: configuration.station_id,
            station_name: configuration.station_name,
            sensor_type: configuration.sensor_type,
            sensor_unit: configuration.sensor_unit,
            is_active: configuration.is_active,
            thresholds,
            created_at: now,
            updated_at: now,
        };
        rows.configurations.rows.push(created.clone());
        Ok(created)
    }

    async fn update(
        &self,
        id: i64,
        patch: AlertConfigurationPatch,
    ) -> Result<Option<AlertConfiguration>, AppError> {
        let mut rows = self.rows.write().await;
        let Some(index) = rows.configurations.rows.iter().position(|c| c.id == id) else {
            return Ok(None);
        };

        let thresholds = match patch.thresholds {
            Some(specs) => {
                let previous = rows.configurations.rows[index].thresholds.clone();
                Some(rows.thresholds(specs, &previous))
            }
            None => None,
        };

        let configuration = &mut rows.configurations.rows[index];
        if let Some(is_active) = patch.is_active {
            configuration.is_active = is_active;
        }
        if let Some(thresholds) = thresholds {
            configuration.thresholds = thresholds;
        }
        configuration.updated_at = Utc::now();
        Ok(Some(configuration.clone()))
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let mut rows = self.rows.write().await;
        let before = rows.configurations.rows.len();
        rows.configurations.rows.retain(|c| c.id != id);
        Ok(rows.configurations.rows.len() != before)
    }
}
