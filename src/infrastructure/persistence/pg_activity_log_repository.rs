//! PostgreSQL implementation of the activity log repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use std::sync::Arc;

use crate::domain::entities::{
    ActivityLog, ActivityLogFilter, ActivityStatus, ActivityType, NewActivityLog,
};
use crate::domain::repositories::ActivityLogRepository;
use crate::error::AppError;

const ACTIVITY_COLUMNS: &str = "id, timestamp, user_id, user_name, activity_type, title, \
     description, status, station_id, station_name, ip_address, user_agent, metadata, created_at";

#[derive(FromRow)]
struct ActivityRow {
    id: i64,
    timestamp: DateTime<Utc>,
    user_id: Option<i64>,
    user_name: Option<String>,
    activity_type: String,
    title: String,
    description: String,
    status: String,
    station_id: Option<i64>,
    station_name: Option<String>,
    ip_address: Option<String>,
    user_agent: Option<String>,
    metadata: Option<Value>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ActivityRow> for ActivityLog {
    type Error = AppError;

    fn try_from(row: ActivityRow) -> Result<Self, Self::Error> {
        let activity_type = ActivityType::parse(&row.activity_type).ok_or_else(|| {
            AppError::internal(
                "Tipo de actividad corrupto",
                json!({ "activity_type": row.activity_type }),
            )
        })?;
        let status = ActivityStatus::parse(&row.status).unwrap_or(ActivityStatus::Info);

        Ok(ActivityLog {
            id: row.id,
            timestamp: row.timestamp,
            user_id: row.user_id,
            user_name: row.user_name,
            activity_type,
            title: row.title,
            description: row.description,
            status,
            station_id: row.station_id,
            station_name: row.station_name,
            ip_address: row.ip_address,
            user_agent: row.user_agent,
            metadata: row.metadata,
            created_at: row.created_at,
        })
    }
}

/// PostgreSQL repository for the audit trail.
pub struct PgActivityLogRepository {
    pool: Arc<PgPool>,
}

impl PgActivityLogRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ActivityLogRepository for PgActivityLogRepository {
    async fn find_all(&self, filter: ActivityLogFilter) -> Result<Vec<ActivityLog>, AppError> {
        let mut query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {ACTIVITY_COLUMNS} FROM activity_logs WHERE TRUE"
        ));

        if let Some(start) = filter.start_date {
            query.push(" AND timestamp >= ").push_bind(start);
        }
        if let Some(end) = filter.end_date {
            query.push(" AND timestamp <= ").push_bind(end);
        }
        if !filter.activity_types.is_empty() {
            let types: Vec<&'static str> =
                filter.activity_types.iter().map(|t| t.as_str()).collect();
            query.push(" AND activity_type = ANY(").push_bind(types).push(")");
        }
        if !filter.statuses.is_empty() {
            let statuses: Vec<&'static str> = filter.statuses.iter().map(|s| s.as_str()).collect();
            query.push(" AND status = ANY(").push_bind(statuses).push(")");
        }
        if let Some(user_id) = filter.user_id {
            query.push(" AND user_id = ").push_bind(user_id);
        }
        if let Some(station_id) = filter.station_id {
            query.push(" AND station_id = ").push_bind(station_id);
        }
        if let Some(search) = filter.search.filter(|s| !s.trim().is_empty()) {
            let pattern = format!("%{search}%");
            query
                .push(" AND (title ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR description ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR user_name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR station_name ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        query.push(" ORDER BY timestamp DESC, id DESC");

        let rows = query
            .build_query_as::<ActivityRow>()
            .fetch_all(self.pool.as_ref())
            .await?;

        rows.into_iter().map(ActivityLog::try_from).collect()
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<ActivityLog>, AppError> {
        let row = sqlx::query_as::<_, ActivityRow>(&format!(
            "SELECT {ACTIVITY_COLUMNS} FROM activity_logs WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        row.map(ActivityLog::try_from).transpose()
    }

    async fn create(&self, entry: NewActivityLog) -> Result<ActivityLog, AppError> {
        let row = sqlx::query_as::<_, ActivityRow>(&format!(
            r#"
            INSERT INTO activity_logs
                (timestamp, user_id, user_name, activity_type, title, description, status,
                 station_id, station_name, ip_address, user_agent, metadata)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {ACTIVITY_COLUMNS}
            "#
        ))
        .bind(entry.timestamp)
        .bind(entry.user_id)
        .bind(entry.user_name)
        .bind(entry.activity_type.as_str())
        .bind(entry.title)
        .bind(entry.description)
        .bind(entry.status.as_str())
        .bind(entry.station_id)
        .bind(entry.station_name)
        .bind(entry.ip_address)
        .bind(entry.user_agent)
        .bind(entry.metadata)
        .fetch_one(self.pool.as_ref())
        .await?;

        row.try_into()
    }

    async fn delete_by_id(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM activity_logs WHERE id = $1")
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM activity_logs WHERE timestamp < $1")
            .bind(cutoff)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected())
    }
}
