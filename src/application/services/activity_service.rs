//! Activity log service: audit trail queries, statistics and retention.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::json;

use crate::domain::entities::{
    ActivityLog, ActivityLogFilter, ActivityStats, ActivityType, NewActivityLog, User,
};
use crate::domain::repositories::ActivityLogRepository;
use crate::error::AppError;

/// Number of entries returned in [`ActivityStats::recent_activity`].
const RECENT_ACTIVITY: usize = 5;

/// Longest retention accepted by [`ActivityService::purge`].
pub const MAX_RETENTION_DAYS: i64 = 3650;

/// Stamps an entry with the acting user, when there is one.
pub fn attributed(entry: NewActivityLog, actor: Option<&User>) -> NewActivityLog {
    match actor {
        Some(user) => entry.with_user(user.id, user.full_name()),
        None => entry,
    }
}

/// Writes an audit entry without failing the calling operation.
///
/// Audit writes are best-effort: a failed write is logged and dropped.
pub async fn log_activity<A>(repository: &A, entry: NewActivityLog)
where
    A: ActivityLogRepository + ?Sized,
{
    let activity_type = entry.activity_type;
    if let Err(e) = repository.create(entry).await {
        tracing::warn!(
            activity_type = activity_type.as_str(),
            error = %e,
            "Failed to write activity log entry"
        );
    }
}

pub struct ActivityService<A: ActivityLogRepository + ?Sized> {
    repository: Arc<A>,
}

impl<A: ActivityLogRepository + ?Sized> ActivityService<A> {
    pub fn new(repository: Arc<A>) -> Self {
        Self { repository }
    }

    pub async fn record(&self, entry: NewActivityLog) -> Result<ActivityLog, AppError> {
        self.repository.create(entry).await
    }

    /// Lists entries matching `filter`, newest first.
    pub async fn list(&self, filter: ActivityLogFilter) -> Result<Vec<ActivityLog>, AppError> {
        if let (Some(from), Some(to)) = (filter.start_date, filter.end_date)
            && from > to
        {
            return Err(AppError::bad_request(
                "La fecha de inicio debe ser anterior a la fecha de fin",
                json!({ "start_date": from, "end_date": to }),
            ));
        }

        self.repository.find_all(filter).await
    }

    pub async fn get(&self, id: i64) -> Result<ActivityLog, AppError> {
        validate_id(id)?;
        self.repository.find_by_id(id).await?.ok_or_else(|| {
            AppError::not_found("Registro de actividad no encontrado", json!({ "id": id }))
        })
    }

    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        validate_id(id)?;
        if !self.repository.delete_by_id(id).await? {
            return Err(AppError::not_found(
                "Registro de actividad no encontrado",
                json!({ "id": id }),
            ));
        }
        Ok(())
    }

    /// Deletes entries older than `days_to_keep` days (1 to
    /// [`MAX_RETENTION_DAYS`]) and returns how many were removed.
    pub async fn purge(&self, days_to_keep: i64, actor: Option<&User>) -> Result<u64, AppError> {
        if !(1..=MAX_RETENTION_DAYS).contains(&days_to_keep) {
            return Err(AppError::bad_request(
                format!("Los días a conservar deben estar entre 1 y {MAX_RETENTION_DAYS}"),
                json!({ "days_to_keep": days_to_keep }),
            ));
        }

        let cutoff = Utc::now() - Duration::days(days_to_keep);
        let removed = self.repository.delete_older_than(cutoff).await?;

        tracing::info!(removed, days_to_keep, "Activity log purged");

        let entry = NewActivityLog::new(
            ActivityType::SystemMaintenance,
            "Limpieza del registro de actividad",
            format!("Se eliminaron {removed} registros con más de {days_to_keep} días"),
        )
        .with_metadata(json!({ "removed": removed, "days_to_keep": days_to_keep }));
        log_activity(self.repository.as_ref(), attributed(entry, actor)).await;

        Ok(removed)
    }

    /// Aggregates entries matching `filter` by type and status.
    pub async fn stats(&self, filter: ActivityLogFilter) -> Result<ActivityStats, AppError> {
        let entries = self.list(filter).await?;

        let mut by_type: BTreeMap<String, usize> = BTreeMap::new();
        let mut by_status: BTreeMap<String, usize> = BTreeMap::new();
        for entry in &entries {
            *by_type
                .entry(entry.activity_type.as_str().to_string())
                .or_default() += 1;
            *by_status.entry(entry.status.as_str().to_string()).or_default() += 1;
        }

        Ok(ActivityStats {
            total: entries.len(),
            by_type,
            by_status,
            recent_activity: entries.into_iter().take(RECENT_ACTIVITY).collect(),
        })
    }
}

fn validate_id(id: i64) -> Result<(), AppError> {
    if id <= 0 {
        return Err(AppError::bad_request(
            "ID de registro inválido",
            json!({ "id": id }),
        ));
    }
    Ok(())
}
