use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use tokio::sync::RwLock;

use super::Table;
use crate::domain::entities::{NewStation, Station, StationPatch};
use crate::domain::pagination::{Page, PageInfo, PageRequest, StationFilter, sort_stations};
use crate::domain::repositories::StationRepository;
use crate::error::AppError;

pub struct MemoryStationRepository {
    table: RwLock<Table<Station>>,
}

impl MemoryStationRepository {
    pub fn new(stations: Vec<Station>) -> Self {
        Self {
            table: RwLock::new(Table::new(stations, |s| s.id)),
        }
    }
}

fn code_taken(table: &Table<Station>, code: &str, except: Option<i64>) -> Result<(), AppError> {
    if table
        .rows
        .iter()
        .any(|s| Some(s.id) != except && s.code.eq_ignore_ascii_case(code))
    {
        return Err(AppError::conflict(
            format!("Ya existe una estación con el código: {code}"),
            json!({ "code": code }),
        ));
    }
    Ok(())
}

impl Default for MemoryStationRepository {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl StationRepository for MemoryStationRepository {
    async fn find_all(&self) -> Result<Vec<Station>, AppError> {
        let mut stations = self.table.read().await.rows.clone();
        stations.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(stations)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Station>, AppError> {
        Ok(self
            .table
            .read()
            .await
            .rows
            .iter()
            .find(|s| s.id == id)
            .cloned())
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Station>, AppError> {
        Ok(self
            .table
            .read()
            .await
            .rows
            .iter()
            .find(|s| s.code.eq_ignore_ascii_case(code))
            .cloned())
    }

    async fn find_page(
        &self,
        page: PageRequest,
        filter: StationFilter,
    ) -> Result<Page<Station>, AppError> {
        let mut matching: Vec<Station> = self
            .table
            .read()
            .await
            .rows
            .iter()
            .filter(|s| filter.matches(s))
            .cloned()
            .collect();

        sort_stations(&mut matching, page.sort_by.as_deref(), page.sort_order);

        let total = matching.len() as u64;
        let data = matching
            .into_iter()
            .skip(page.offset())
            .take(page.limit as usize)
            .collect();

        Ok(Page {
            data,
            pagination: PageInfo::new(page.page, page.limit, total),
        })
    }

    async fn create(&self, station: NewStation) -> Result<Station, AppError> {
        let mut table = self.table.write().await;
        code_taken(&table, &station.code, None)?;
        let now = Utc::now();
        let created = Station {
            id: table.allocate_id(),
            name: station.name,
            code: station.code,
            location: station.location,
            status: station.status,
            latitude: station.latitude,
            longitude: station.longitude,
            current_level: station.current_level,
            threshold: station.threshold,
            last_measurement: station.last_measurement,
            created_at: now,
            updated_at: now,
        };
        table.rows.push(created.clone());
        Ok(created)
    }

    async fn update(&self, id: i64, patch: StationPatch) -> Result<Option<Station>, AppError> {
        let mut table = self.table.write().await;
        if let Some(code) = &patch.code {
            code_taken(&table, code, Some(id))?;
        }
        let Some(station) = table.rows.iter_mut().find(|s| s.id == id) else {
            return Ok(None);
        };
        patch.apply(station);
        station.updated_at = Utc::now();
        Ok(Some(station.clone()))
    }

    async fn record_level(
        &self,
        id: i64,
        level: f64,
        timestamp: DateTime<Utc>,
    ) -> Result<Option<Station>, AppError> {
        let mut table = self.table.write().await;
        let Some(station) = table.rows.iter_mut().find(|s| s.id == id) else {
            return Ok(None);
        };
        if station.last_measurement.is_none_or(|last| timestamp >= last) {
            station.current_level = level;
            station.last_measurement = Some(timestamp);
            station.updated_at = Utc::now();
        }
        Ok(Some(station.clone()))
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let mut table = self.table.write().await;
        let before = table.rows.len();
        table.rows.retain(|s| s.id != id);
        Ok(table.rows.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::StationStatus;
    use crate::domain::pagination::SortOrder;

    fn new_station(name: &str, code: &str, threshold: f64) -> NewStation {
        NewStation {
            name: name.to_string(),
            code: code.to_string(),
            location: "Pucón".to_string(),
            status: StationStatus::Active,
            latitude: -39.28,
            longitude: -71.94,
            current_level: 1.0,
            threshold,
            last_measurement: None,
        }
    }

    #[tokio::test]
    async fn test_create_assigns_sequential_ids() {
        let repo = MemoryStationRepository::default();
        let a = repo.create(new_station("Norte", "N-1", 3.0)).await.unwrap();
        let b = repo.create(new_station("Sur", "S-1", 2.0)).await.unwrap();
        assert_eq!((a.id, b.id), (1, 2));
        assert_eq!(repo.find_by_code("n-1").await.unwrap().unwrap().id, 1);
    }

    #[tokio::test]
    async fn test_find_page_filters_sorts_and_slices() {
        let repo = MemoryStationRepository::default();
        for (i, threshold) in [3.0, 1.0, 2.0, 4.0].into_iter().enumerate() {
            repo.create(new_station(&format!("E{i}"), &format!("C-{i}"), threshold))
                .await
                .unwrap();
        }

        let page = PageRequest {
            page: 1,
            limit: 2,
            sort_by: Some("threshold".to_string()),
            sort_order: SortOrder::Desc,
        };
        let result = repo.find_page(page, StationFilter::default()).await.unwrap();

        assert_eq!(result.pagination.total, 4);
        assert!(result.pagination.has_next);
        let thresholds: Vec<f64> = result.data.iter().map(|s| s.threshold).collect();
        assert_eq!(thresholds, vec![4.0, 3.0]);
    }

    #[tokio::test]
    async fn test_codes_stay_unique() {
        let repo = MemoryStationRepository::default();
        repo.create(new_station("Norte", "DUP-1", 3.0)).await.unwrap();
        let sur = repo.create(new_station("Sur", "S-1", 3.0)).await.unwrap();

        let err = repo
            .create(new_station("Otra", "dup-1", 3.0))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict { .. }));

        let rename = StationPatch {
            code: Some("DUP-1".to_string()),
            ..Default::default()
        };
        let err = repo.update(sur.id, rename).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict { .. }));

        // Keeping its own code is not a conflict.
        let same = StationPatch {
            code: Some("S-1".to_string()),
            ..Default::default()
        };
        assert!(repo.update(sur.id, same).await.unwrap().is_some());
        assert_eq!(repo.find_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_creates_with_same_code() {
        let repo = std::sync::Arc::new(MemoryStationRepository::default());
        let tasks: Vec<_> = (0..8)
            .map(|i| {
                let repo = repo.clone();
                tokio::spawn(async move {
                    repo.create(new_station(&format!("E{i}"), "DUP-1", 3.0)).await
                })
            })
            .collect();

        let mut created = 0;
        for task in tasks {
            if task.await.unwrap().is_ok() {
                created += 1;
            }
        }
        assert_eq!(created, 1);
    }

    #[tokio::test]
    async fn test_record_level_ignores_older_readings() {
        let repo = MemoryStationRepository::default();
        let s = repo.create(new_station("Norte", "N-1", 3.0)).await.unwrap();
        let t10 = Utc::now();
        let t5 = t10 - chrono::Duration::minutes(5);

        let updated = repo.record_level(s.id, 2.4, t10).await.unwrap().unwrap();
        assert_eq!(updated.current_level, 2.4);

        let kept = repo.record_level(s.id, 1.1, t5).await.unwrap().unwrap();
        assert_eq!(kept.current_level, 2.4);
        assert_eq!(kept.last_measurement, Some(t10));

        assert!(repo.record_level(99, 1.0, t10).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let repo = MemoryStationRepository::default();
        let s = repo.create(new_station("Norte", "N-1", 3.0)).await.unwrap();

        let patch = StationPatch {
            threshold: Some(3.5),
            ..Default::default()
        };
        let updated = repo.update(s.id, patch).await.unwrap().unwrap();
        assert_eq!(updated.threshold, 3.5);

        assert!(repo.delete(s.id).await.unwrap());
        assert!(!repo.delete(s.id).await.unwrap());
        assert!(repo.update(s.id, StationPatch::default()).await.unwrap().is_none());
    }
}
