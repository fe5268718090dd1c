use async_trait::async_trait;
use tokio::sync::RwLock;

use super::Table;
use crate::domain::entities::{Measurement, MeasurementFilter, NewMeasurement};
use crate::domain::repositories::MeasurementRepository;
use crate::error::AppError;

pub struct MemoryMeasurementRepository {
    table: RwLock<Table<Measurement>>,
}

impl MemoryMeasurementRepository {
    pub fn new(measurements: Vec<Measurement>) -> Self {
        Self {
            table: RwLock::new(Table::new(measurements, |m| m.id)),
        }
    }
}

impl Default for MemoryMeasurementRepository {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl MeasurementRepository for MemoryMeasurementRepository {
    async fn find_latest(
        &self,
        station_id: Option<i64>,
        limit: usize,
    ) -> Result<Vec<Measurement>, AppError> {
        let mut readings: Vec<Measurement> = self
            .table
            .read()
            .await
            .rows
            .iter()
            .filter(|m| station_id.is_none_or(|id| m.station_id == id))
            .cloned()
            .collect();
        readings.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        readings.truncate(limit);
        Ok(readings)
    }

    async fn find_historical(
        &self,
        filter: MeasurementFilter,
    ) -> Result<Vec<Measurement>, AppError> {
        let mut readings: Vec<Measurement> = self
            .table
            .read()
            .await
            .rows
            .iter()
            .filter(|m| filter.matches(m))
            .cloned()
            .collect();
        readings.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));
        Ok(readings)
    }

    async fn create(&self, measurement: NewMeasurement) -> Result<Measurement, AppError> {
        let mut table = self.table.write().await;
        let created = Measurement {
            id: table.allocate_id(),
            station_id: measurement.station_id,
            station_name: measurement.station_name,
            variable_type: measurement.variable_type,
            value: measurement.value,
            unit: measurement.unit,
            timestamp: measurement.timestamp,
            is_critical: measurement.is_critical,
            quality: measurement.quality,
        };
        table.rows.push(created.clone());
        Ok(created)
    }
}
