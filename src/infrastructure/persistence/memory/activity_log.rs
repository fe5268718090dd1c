use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::Table;
use crate::domain::entities::{ActivityLog, ActivityLogFilter, NewActivityLog};
use crate::domain::repositories::ActivityLogRepository;
use crate::error::AppError;

pub struct MemoryActivityLogRepository {
    table: RwLock<Table<ActivityLog>>,
}

impl MemoryActivityLogRepository {
    pub fn new(entries: Vec<ActivityLog>) -> Self {
        Self {
            table: RwLock::new(Table::new(entries, |e| e.id)),
        }
    }
}

impl Default for MemoryActivityLogRepository {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl ActivityLogRepository for MemoryActivityLogRepository {
    async fn find_all(&self, filter: ActivityLogFilter) -> Result<Vec<ActivityLog>, AppError> {
        let mut entries: Vec<ActivityLog> = self
            .table
            .read()
            .await
            .rows
            .iter()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        Ok(entries)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<ActivityLog>, AppError> {
        Ok(self
            .table
            .read()
            .await
            .rows
            .iter()
            .find(|e| e.id == id)
            .cloned())
    }

    async fn create(&self, entry: NewActivityLog) -> Result<ActivityLog, AppError> {
        let mut table = self.table.write().await;
        let created = ActivityLog {
            id: table.allocate_id(),
            timestamp: entry.timestamp,
            user_id: entry.user_id,
            user_name: entry.user_name,
            activity_type: entry.activity_type,
            title: entry.title,
            description: entry.description,
            status: entry.status,
            station_id: entry.station_id,
            station_name: entry.station_name,
            ip_address: entry.ip_address,
            user_agent: entry.user_agent,
            metadata: entry.metadata,
            created_at: Utc::now(),
        };
        table.rows.push(created.clone());
        Ok(created)
    }

    async fn delete_by_id(&self, id: i64) -> Result<bool, AppError> {
        let mut table = self.table.write().await;
        let before = table.rows.len();
        table.rows.retain(|e| e.id != id);
        Ok(table.rows.len() != before)
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, AppError> {
        let mut table = self.table.write().await;
        let before = table.rows.len();
        table.rows.retain(|e| e.timestamp >= cutoff);
        Ok((before - table.rows.len()) as u64)
    }
}
