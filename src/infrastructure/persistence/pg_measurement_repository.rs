//! PostgreSQL implementation of measurement repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use std::sync::Arc;

use crate::domain::entities::{Measurement, MeasurementFilter, NewMeasurement, Quality};
use crate::domain::repositories::MeasurementRepository;
use crate::error::AppError;

const MEASUREMENT_COLUMNS: &str =
    "id, station_id, station_name, variable_type, value, unit, timestamp, is_critical, quality";

#[derive(FromRow)]
struct MeasurementRow {
    id: i64,
    station_id: i64,
    station_name: Option<String>,
    variable_type: String,
    value: f64,
    unit: String,
    timestamp: DateTime<Utc>,
    is_critical: bool,
    quality: Option<String>,
}

impl From<MeasurementRow> for Measurement {
    fn from(row: MeasurementRow) -> Self {
        Measurement {
            id: row.id,
            station_id: row.station_id,
            station_name: row.station_name,
            variable_type: row.variable_type,
            value: row.value,
            unit: row.unit,
            timestamp: row.timestamp,
            is_critical: row.is_critical,
            quality: row.quality.as_deref().and_then(Quality::parse),
        }
    }
}

/// PostgreSQL repository for sensor readings.
///
/// Readings are append-only.
pub struct PgMeasurementRepository {
    pool: Arc<PgPool>,
}

impl PgMeasurementRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MeasurementRepository for PgMeasurementRepository {
    async fn find_latest(
        &self,
        station_id: Option<i64>,
        limit: usize,
    ) -> Result<Vec<Measurement>, AppError> {
        let rows = sqlx::query_as::<_, MeasurementRow>(&format!(
            r#"
            SELECT {MEASUREMENT_COLUMNS}
            FROM measurements
            WHERE ($1::BIGINT IS NULL OR station_id = $1)
            ORDER BY timestamp DESC, id DESC
            LIMIT $2
            "#
        ))
        .bind(station_id)
        .bind(limit as i64)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows.into_iter().map(Measurement::from).collect())
    }

    async fn find_historical(
        &self,
        filter: MeasurementFilter,
    ) -> Result<Vec<Measurement>, AppError> {
        let mut query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {MEASUREMENT_COLUMNS} FROM measurements WHERE TRUE"
        ));
        if let Some(station_id) = filter.station_id {
            query.push(" AND station_id = ").push_bind(station_id);
        }
        if let Some(variable_type) = filter.variable_type {
            query.push(" AND variable_type = ").push_bind(variable_type);
        }
        if let Some(start) = filter.start_date {
            query.push(" AND timestamp >= ").push_bind(start);
        }
        if let Some(end) = filter.end_date {
            query.push(" AND timestamp <= ").push_bind(end);
        }
        query.push(" ORDER BY timestamp ASC, id ASC");

        let rows = query
            .build_query_as::<MeasurementRow>()
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(rows.into_iter().map(Measurement::from).collect())
    }

    async fn create(&self, measurement: NewMeasurement) -> Result<Measurement, AppError> {
        let row = sqlx::query_as::<_, MeasurementRow>(&format!(
            r#"
            INSERT INTO measurements
                (station_id, station_name, variable_type, value, unit, timestamp, is_critical, quality)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {MEASUREMENT_COLUMNS}
            "#
        ))
        .bind(measurement.station_id)
        .bind(measurement.station_name)
        .bind(measurement.variable_type)
        .bind(measurement.value)
        .bind(measurement.unit)
        .bind(measurement.timestamp)
        .bind(measurement.is_critical)
        .bind(measurement.quality.map(|q| q.as_str()))
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(row.into())
    }
}
