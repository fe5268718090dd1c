//! PostgreSQL implementations of alert and alert configuration repositories.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::{FromRow, PgConnection, PgPool};
use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::entities::{
    Alert, AlertConfiguration, AlertConfigurationPatch, AlertThreshold, NewAlert,
    NewAlertConfiguration, Severity, ThresholdLevel, ThresholdSpec,
};
use crate::domain::repositories::{AlertConfigurationRepository, AlertRepository};
use crate::error::AppError;

const ALERT_COLUMNS: &str = "id, station_id, station_name, variable_type, threshold_value, \
     current_value, alert_type, message, severity, is_active, created_at, resolved_at";

#[derive(FromRow)]
struct AlertRow {
    id: i64,
    station_id: i64,
    station_name: Option<String>,
    variable_type: String,
    threshold_value: f64,
    current_value: f64,
    alert_type: String,
    message: String,
    severity: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    resolved_at: Option<DateTime<Utc>>,
}

impl TryFrom<AlertRow> for Alert {
    type Error = AppError;

    fn try_from(row: AlertRow) -> Result<Self, Self::Error> {
        let severity = Severity::parse(&row.severity).ok_or_else(|| {
            AppError::internal(
                "Severidad de alerta corrupta",
                json!({ "severity": row.severity }),
            )
        })?;

        Ok(Alert {
            id: row.id,
            station_id: row.station_id,
            station_name: row.station_name,
            variable_type: row.variable_type,
            threshold_value: row.threshold_value,
            current_value: row.current_value,
            alert_type: row.alert_type,
            message: row.message,
            severity,
            is_active: row.is_active,
            created_at: row.created_at,
            resolved_at: row.resolved_at,
        })
    }
}

/// PostgreSQL repository for raised alerts.
pub struct PgAlertRepository {
    pool: Arc<PgPool>,
}

impl PgAlertRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AlertRepository for PgAlertRepository {
    async fn find_all(&self, active_only: bool) -> Result<Vec<Alert>, AppError> {
        let rows = sqlx::query_as::<_, AlertRow>(&format!(
            r#"
            SELECT {ALERT_COLUMNS}
            FROM alerts
            WHERE (NOT $1 OR is_active)
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(active_only)
        .fetch_all(self.pool.as_ref())
        .await?;

        rows.into_iter().map(Alert::try_from).collect()
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Alert>, AppError> {
        let row = sqlx::query_as::<_, AlertRow>(&format!(
            "SELECT {ALERT_COLUMNS} FROM alerts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        row.map(Alert::try_from).transpose()
    }

    async fn find_active(
        &self,
        station_id: i64,
        variable_type: &str,
    ) -> Result<Option<Alert>, AppError> {
        let row = sqlx::query_as::<_, AlertRow>(&format!(
            r#"
            SELECT {ALERT_COLUMNS}
            FROM alerts
            WHERE is_active AND station_id = $1 AND variable_type = $2
            ORDER BY CASE severity WHEN 'high' THEN 3 WHEN 'medium' THEN 2 ELSE 1 END DESC,
                     created_at DESC
            LIMIT 1
            "#
        ))
        .bind(station_id)
        .bind(variable_type)
        .fetch_optional(self.pool.as_ref())
        .await?;

        row.map(Alert::try_from).transpose()
    }

    async fn create(&self, alert: NewAlert) -> Result<Alert, AppError> {
        let row = sqlx::query_as::<_, AlertRow>(&format!(
            r#"
            INSERT INTO alerts
                (station_id, station_name, variable_type, threshold_value,
                 current_value, alert_type, message, severity)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {ALERT_COLUMNS}
            "#
        ))
        .bind(alert.station_id)
        .bind(alert.station_name)
        .bind(alert.variable_type)
        .bind(alert.threshold_value)
        .bind(alert.current_value)
        .bind(alert.alert_type)
        .bind(alert.message)
        .bind(alert.severity.as_str())
        .fetch_one(self.pool.as_ref())
        .await?;

        row.try_into()
    }

    async fn resolve(&self, id: i64) -> Result<Option<Alert>, AppError> {
        // Already resolved alerts keep their original resolution time.
        let row = sqlx::query_as::<_, AlertRow>(&format!(
            r#"
            UPDATE alerts
            SET is_active = FALSE,
                resolved_at = COALESCE(resolved_at, NOW())
            WHERE id = $1
            RETURNING {ALERT_COLUMNS}
            "#
        ))
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        row.map(Alert::try_from).transpose()
    }
}

const CONFIGURATION_COLUMNS: &str =
    "id, station_id, station_name, sensor_type, sensor_unit, is_active, created_at, updated_at";

const THRESHOLD_COLUMNS: &str = "id, configuration_id, level, min_value, max_value, tolerance, \
     persistence_time, is_active, created_at, updated_at";

#[derive(FromRow)]
struct ConfigurationRow {
    id: i64,
    station_id: i64,
    station_name: Option<String>,
    sensor_type: String,
    sensor_unit: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct ThresholdRow {
    id: i64,
    configuration_id: i64,
    level: String,
    min_value: Option<f64>,
    max_value: Option<f64>,
    tolerance: Option<f64>,
    persistence_time: Option<i32>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ThresholdRow> for AlertThreshold {
    type Error = AppError;

    fn try_from(row: ThresholdRow) -> Result<Self, Self::Error> {
        let level = ThresholdLevel::parse(&row.level).ok_or_else(|| {
            AppError::internal("Nivel de umbral corrupto", json!({ "level": row.level }))
        })?;

        Ok(AlertThreshold {
            id: row.id,
            level,
            min_value: row.min_value,
            max_value: row.max_value,
            tolerance: row.tolerance,
            persistence_time: row.persistence_time,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Loads the thresholds of `rows` and assembles full configurations.
async fn attach_thresholds(
    conn: &mut PgConnection,
    rows: Vec<ConfigurationRow>,
) -> Result<Vec<AlertConfiguration>, AppError> {
    let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
    let thresholds = sqlx::query_as::<_, ThresholdRow>(&format!(
        r#"
        SELECT {THRESHOLD_COLUMNS}
        FROM alert_thresholds
        WHERE configuration_id = ANY($1)
        ORDER BY id
        "#
    ))
    .bind(&ids[..])
    .fetch_all(&mut *conn)
    .await?;

    let mut grouped: HashMap<i64, Vec<AlertThreshold>> = HashMap::new();
    for row in thresholds {
        let configuration_id = row.configuration_id;
        grouped
            .entry(configuration_id)
            .or_default()
            .push(row.try_into()?);
    }

    Ok(rows
        .into_iter()
        .map(|row| AlertConfiguration {
            thresholds: grouped.remove(&row.id).unwrap_or_default(),
            id: row.id,
            station_id: row.station_id,
            station_name: row.station_name,
            sensor_type: row.sensor_type,
            sensor_unit: row.sensor_unit,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
        .collect())
}

async fn insert_threshold(
    conn: &mut PgConnection,
    configuration_id: i64,
    spec: &ThresholdSpec,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO alert_thresholds
            (configuration_id, level, min_value, max_value, tolerance, persistence_time, is_active)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(configuration_id)
    .bind(spec.level.as_str())
    .bind(spec.min_value)
    .bind(spec.max_value)
    .bind(spec.tolerance)
    .bind(spec.persistence_time)
    .bind(spec.is_active)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Replaces the threshold set of a configuration.
///
/// Specs carrying the id of an existing threshold update it in place; the
/// rest are inserted. Thresholds not mentioned are removed.
async fn replace_thresholds(
    conn: &mut PgConnection,
    configuration_id: i64,
    specs: &[ThresholdSpec],
) -> Result<(), AppError> {
    let kept: Vec<i64> = specs.iter().filter_map(|s| s.id).collect();

    sqlx::query("DELETE FROM alert_thresholds WHERE configuration_id = $1 AND NOT (id = ANY($2))")
        .bind(configuration_id)
        .bind(&kept[..])
        .execute(&mut *conn)
        .await?;

    for spec in specs {
        let updated = match spec.id {
            Some(id) => sqlx::query(
                r#"
                UPDATE alert_thresholds
                SET level = $3, min_value = $4, max_value = $5, tolerance = $6,
                    persistence_time = $7, is_active = $8, updated_at = NOW()
                WHERE id = $1 AND configuration_id = $2
                "#,
            )
            .bind(id)
            .bind(configuration_id)
            .bind(spec.level.as_str())
            .bind(spec.min_value)
            .bind(spec.max_value)
            .bind(spec.tolerance)
            .bind(spec.persistence_time)
            .bind(spec.is_active)
            .execute(&mut *conn)
            .await?
            .rows_affected(),
            None => 0,
        };

        if updated == 0 {
            insert_threshold(conn, configuration_id, spec).await?;
        }
    }

    Ok(())
}

/// PostgreSQL repository for per-sensor alert configurations.
///
/// Writes touching thresholds run in a single transaction.
pub struct PgAlertConfigurationRepository {
    pool: Arc<PgPool>,
}

impl PgAlertConfigurationRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    async fn fetch_where(
        &self,
        clause: &str,
        binds: (Option<i64>, Option<&str>),
    ) -> Result<Vec<AlertConfiguration>, AppError> {
        let mut conn = self.pool.acquire().await?;
        let sql =
            format!("SELECT {CONFIGURATION_COLUMNS} FROM alert_configurations {clause} ORDER BY id");

        let mut query = sqlx::query_as::<_, ConfigurationRow>(&sql);
        if let Some(id) = binds.0 {
            query = query.bind(id);
        }
        if let Some(sensor) = binds.1 {
            query = query.bind(sensor);
        }
        let rows = query.fetch_all(&mut *conn).await?;

        attach_thresholds(&mut conn, rows).await
    }
}

#[async_trait]
impl AlertConfigurationRepository for PgAlertConfigurationRepository {
    async fn find_all(&self) -> Result<Vec<AlertConfiguration>, AppError> {
        self.fetch_where("", (None, None)).await
    }

    async fn find_by_station(
        &self,
        station_id: i64,
    ) -> Result<Vec<AlertConfiguration>, AppError> {
        self.fetch_where("WHERE station_id = $1", (Some(station_id), None))
            .await
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<AlertConfiguration>, AppError> {
        Ok(self
            .fetch_where("WHERE id = $1", (Some(id), None))
            .await?
            .into_iter()
            .next())
    }

    async fn find_by_sensor(
        &self,
        station_id: i64,
        sensor_type: &str,
    ) -> Result<Option<AlertConfiguration>, AppError> {
        Ok(self
            .fetch_where(
                "WHERE station_id = $1 AND sensor_type = $2",
                (Some(station_id), Some(sensor_type)),
            )
            .await?
            .into_iter()
            .next())
    }

    async fn create(
        &self,
        configuration: NewAlertConfiguration,
    ) -> Result<AlertConfiguration, AppError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, ConfigurationRow>(&format!(
            r#"
            INSERT INTO alert_configurations (station_id, station_name, sensor_type, sensor_unit, is_active)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {CONFIGURATION_COLUMNS}
            "#
        ))
        .bind(configuration.station_id)
        .bind(configuration.station_name)
        .bind(configuration.sensor_type)
        .bind(configuration.sensor_unit)
        .bind(configuration.is_active)
        .fetch_one(&mut *tx)
        .await?;

        for spec in &configuration.thresholds {
            insert_threshold(&mut tx, row.id, spec).await?;
        }

        let created = attach_thresholds(&mut tx, vec![row]).await?;
        tx.commit().await?;

        created.into_iter().next().ok_or_else(|| {
            AppError::internal("Configuración no creada", json!({}))
        })
    }

    async fn update(
        &self,
        id: i64,
        patch: AlertConfigurationPatch,
    ) -> Result<Option<AlertConfiguration>, AppError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, ConfigurationRow>(&format!(
            r#"
            UPDATE alert_configurations
            SET is_active = COALESCE($2, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {CONFIGURATION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(patch.is_active)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        if let Some(specs) = &patch.thresholds {
            replace_thresholds(&mut tx, id, specs).await?;
        }

        let updated = attach_thresholds(&mut tx, vec![row]).await?;
        tx.commit().await?;

        Ok(updated.into_iter().next())
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM alert_configurations WHERE id = $1")
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
