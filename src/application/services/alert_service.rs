//! Alert listing, resolution and threshold evaluation.

use std::sync::Arc;

use serde_json::json;

use crate::application::services::activity_service::{attributed, log_activity};
use crate::domain::entities::{
    ActivityStatus, ActivityType, Alert, Breach, Measurement, NewActivityLog, NewAlert, Station,
    User,
};
use crate::domain::repositories::{
    ActivityLogRepository, AlertConfigurationRepository, AlertRepository,
};
use crate::error::AppError;

/// Service for raised alerts.
///
/// Alerts are opened by the ingestion path through [`AlertService::evaluate_reading`]
/// and closed by operators through [`AlertService::resolve_alert`]. At most one
/// unresolved alert is kept per station and variable unless a more severe
/// threshold is breached.
pub struct AlertService<R, C, A>
where
    R: AlertRepository + ?Sized,
    C: AlertConfigurationRepository + ?Sized,
    A: ActivityLogRepository + ?Sized,
{
    alerts: Arc<R>,
    configurations: Arc<C>,
    activity: Arc<A>,
}

impl<R, C, A> AlertService<R, C, A>
where
    R: AlertRepository + ?Sized,
    C: AlertConfigurationRepository + ?Sized,
    A: ActivityLogRepository + ?Sized,
{
    pub fn new(alerts: Arc<R>, configurations: Arc<C>, activity: Arc<A>) -> Self {
        Self {
            alerts,
            configurations,
            activity,
        }
    }

    /// Lists alerts newest first.
    pub async fn list_alerts(&self, active_only: bool) -> Result<Vec<Alert>, AppError> {
        self.alerts.find_all(active_only).await
    }

    /// # Errors
    ///
    /// - [`AppError::NotFound`] when the alert does not exist
    /// - [`AppError::Conflict`] when it is already resolved
    pub async fn resolve_alert(&self, id: i64, actor: Option<&User>) -> Result<Alert, AppError> {
        if id <= 0 {
            return Err(AppError::bad_request(
                "ID de alerta inválido",
                json!({ "id": id }),
            ));
        }

        let alert = self
            .alerts
            .find_by_id(id)
            .await?
            .ok_or_else(|| alert_not_found(id))?;

        if !alert.is_active {
            return Err(AppError::conflict(
                "La alerta ya fue resuelta",
                json!({ "id": id, "resolved_at": alert.resolved_at }),
            ));
        }

        let resolved = self
            .alerts
            .resolve(id)
            .await?
            .ok_or_else(|| alert_not_found(id))?;

        let mut entry = NewActivityLog::new(
            ActivityType::AlertResolved,
            "Alerta resuelta",
            resolved.message.clone(),
        );
        if let Some(name) = &resolved.station_name {
            entry = entry.with_station(resolved.station_id, name.clone());
        }
        log_activity(self.activity.as_ref(), attributed(entry, actor)).await;

        Ok(resolved)
    }

    /// Opens an alert for a new alert record.
    pub async fn open_alert(&self, alert: NewAlert) -> Result<Alert, AppError> {
        let alert = self.alerts.create(alert).await?;

        metrics::counter!("alerts_triggered_total", "severity" => alert.severity.as_str())
            .increment(1);
        tracing::warn!(
            alert_id = alert.id,
            station_id = alert.station_id,
            severity = alert.severity.as_str(),
            "Alert opened"
        );

        let mut entry = NewActivityLog::new(
            ActivityType::AlertTriggered,
            "Alerta activada",
            alert.message.clone(),
        )
        .with_status(ActivityStatus::Warning)
        .with_metadata(json!({
            "alert_id": alert.id,
            "severity": alert.severity,
            "value": alert.current_value,
            "threshold": alert.threshold_value,
        }));
        if let Some(name) = &alert.station_name {
            entry = entry.with_station(alert.station_id, name.clone());
        }
        log_activity(self.activity.as_ref(), entry).await;

        Ok(alert)
    }

    /// Evaluates the alert configuration matching a recorded reading.
    ///
    /// Returns the opened alert, or `None` when no threshold is breached or
    /// an equally severe alert is already open.
    pub async fn evaluate_reading(
        &self,
        station: &Station,
        measurement: &Measurement,
    ) -> Result<Option<Alert>, AppError> {
        let Some(configuration) = self
            .configurations
            .find_by_sensor(station.id, &measurement.variable_type)
            .await?
        else {
            return Ok(None);
        };

        let Some((threshold, breach)) = configuration.evaluate(measurement.value) else {
            return Ok(None);
        };

        let severity = threshold.level.severity();

        if let Some(open) = self
            .alerts
            .find_active(station.id, &measurement.variable_type)
            .await?
            && open.severity >= severity
        {
            tracing::debug!(
                alert_id = open.id,
                station_id = station.id,
                "Alert already open for sensor"
            );
            return Ok(None);
        }

        let direction = match breach {
            Breach::Above(_) => "supera",
            Breach::Below(_) => "está bajo",
        };
        let message = format!(
            "{}: {} {} {} el umbral {} de {} {}",
            station.name,
            measurement.variable_type,
            measurement.value,
            direction,
            threshold.level.as_str(),
            breach.limit(),
            measurement.unit,
        );

        let alert = self
            .open_alert(NewAlert {
                station_id: station.id,
                station_name: Some(station.name.clone()),
                variable_type: measurement.variable_type.clone(),
                threshold_value: breach.limit(),
                current_value: measurement.value,
                alert_type: threshold.level.as_str().to_string(),
                message,
                severity,
            })
            .await?;

        Ok(Some(alert))
    }
}

fn alert_not_found(id: i64) -> AppError {
    AppError::not_found("Alerta no encontrada", json!({ "id": id }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{
        ActivityLog, AlertConfiguration, AlertThreshold, Quality, Severity, StationStatus,
        ThresholdLevel,
    };
    use crate::domain::repositories::{
        MockActivityLogRepository, MockAlertConfigurationRepository, MockAlertRepository,
    };
    use chrono::Utc;

    type Service = AlertService<
        MockAlertRepository,
        MockAlertConfigurationRepository,
        MockActivityLogRepository,
    >;

    fn service(alerts: MockAlertRepository, configs: MockAlertConfigurationRepository) -> Service {
        let mut activity = MockActivityLogRepository::new();
        activity.expect_create().returning(|e| {
            Ok(ActivityLog {
                id: 1,
                timestamp: e.timestamp,
                user_id: e.user_id,
                user_name: e.user_name,
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
        AlertService::new(Arc::new(alerts), Arc::new(configs), Arc::new(activity))
    }

    fn alert(id: i64, severity: Severity, is_active: bool) -> Alert {
        Alert {
            id,
            station_id: 1,
            station_name: Some("Río Claro Norte".to_string()),
            variable_type: "water_level".to_string(),
            threshold_value: 3.0,
            current_value: 3.4,
            alert_type: "critical".to_string(),
            message: "nivel alto".to_string(),
            severity,
            is_active,
            created_at: Utc::now(),
            resolved_at: (!is_active).then(Utc::now),
        }
    }

    fn station() -> Station {
        Station {
            id: 1,
            name: "Río Claro Norte".to_string(),
            code: "RCN-001".to_string(),
            location: "Pucón".to_string(),
            status: StationStatus::Active,
            latitude: -39.28,
            longitude: -71.95,
            current_level: 3.6,
            threshold: 3.0,
            last_measurement: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn reading(value: f64) -> Measurement {
        Measurement {
            id: 10,
            station_id: 1,
            station_name: Some("Río Claro Norte".to_string()),
            variable_type: "water_level".to_string(),
            value,
            unit: "m".to_string(),
            timestamp: Utc::now(),
            is_critical: value >= 3.0,
            quality: Some(Quality::Good),
        }
    }

    fn configuration() -> AlertConfiguration {
        let threshold = |id, level, max| AlertThreshold {
            id,
            level,
            min_value: None,
            max_value: Some(max),
            tolerance: None,
            persistence_time: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        AlertConfiguration {
            id: 1,
            station_id: 1,
            station_name: None,
            sensor_type: "water_level".to_string(),
            sensor_unit: "m".to_string(),
            is_active: true,
            thresholds: vec![
                threshold(1, ThresholdLevel::Warning, 2.5),
                threshold(2, ThresholdLevel::Critical, 3.0),
                threshold(3, ThresholdLevel::Emergency, 4.0),
            ],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_resolve_active_alert() {
        let mut alerts = MockAlertRepository::new();
        alerts
            .expect_find_by_id()
            .returning(|id| Ok(Some(alert(id, Severity::High, true))));
        alerts
            .expect_resolve()
            .times(1)
            .returning(|id| Ok(Some(alert(id, Severity::High, false))));

        let resolved = service(alerts, MockAlertConfigurationRepository::new())
            .resolve_alert(5, None)
            .await
            .unwrap();
        assert!(!resolved.is_active);
        assert!(resolved.resolved_at.is_some());
    }

    #[tokio::test]
    async fn test_resolve_already_resolved_alert_conflicts() {
        let mut alerts = MockAlertRepository::new();
        alerts
            .expect_find_by_id()
            .returning(|id| Ok(Some(alert(id, Severity::Low, false))));
        alerts.expect_resolve().never();

        let err = service(alerts, MockAlertConfigurationRepository::new())
            .resolve_alert(5, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_evaluate_opens_alert_for_most_severe_breach() {
        let mut configs = MockAlertConfigurationRepository::new();
        configs
            .expect_find_by_sensor()
            .withf(|station_id, sensor| *station_id == 1 && sensor == "water_level")
            .returning(|_, _| Ok(Some(configuration())));

        let mut alerts = MockAlertRepository::new();
        alerts.expect_find_active().returning(|_, _| Ok(None));
        alerts
            .expect_create()
            .withf(|a| {
                a.severity == Severity::Medium
                    && a.threshold_value == 3.0
                    && a.alert_type == "critical"
            })
            .times(1)
            .returning(|a| {
                let mut created = alert(7, a.severity, true);
                created.message = a.message;
                Ok(created)
            });

        let opened = service(alerts, configs)
            .evaluate_reading(&station(), &reading(3.6))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(opened.id, 7);
        assert!(opened.message.contains("supera"));
    }

    #[tokio::test]
    async fn test_evaluate_skips_when_equal_alert_open() {
        let mut configs = MockAlertConfigurationRepository::new();
        configs
            .expect_find_by_sensor()
            .returning(|_, _| Ok(Some(configuration())));

        let mut alerts = MockAlertRepository::new();
        alerts
            .expect_find_active()
            .returning(|_, _| Ok(Some(alert(3, Severity::Medium, true))));
        alerts.expect_create().never();

        let opened = service(alerts, configs)
            .evaluate_reading(&station(), &reading(3.6))
            .await
            .unwrap();
        assert!(opened.is_none());
    }

    #[tokio::test]
    async fn test_evaluate_escalates_to_higher_severity() {
        let mut configs = MockAlertConfigurationRepository::new();
        configs
            .expect_find_by_sensor()
            .returning(|_, _| Ok(Some(configuration())));

        let mut alerts = MockAlertRepository::new();
        alerts
            .expect_find_active()
            .returning(|_, _| Ok(Some(alert(3, Severity::Low, true))));
        alerts
            .expect_create()
            .withf(|a| a.severity == Severity::High)
            .times(1)
            .returning(|a| Ok(alert(8, a.severity, true)));

        let opened = service(alerts, configs)
            .evaluate_reading(&station(), &reading(4.5))
            .await
            .unwrap();
        assert!(opened.is_some());
    }

    #[tokio::test]
    async fn test_evaluate_without_configuration() {
        let mut configs = MockAlertConfigurationRepository::new();
        configs.expect_find_by_sensor().returning(|_, _| Ok(None));
        let mut alerts = MockAlertRepository::new();
        alerts.expect_create().never();

        let opened = service(alerts, configs)
            .evaluate_reading(&station(), &reading(9.0))
            .await
            .unwrap();
        assert!(opened.is_none());
    }
}
