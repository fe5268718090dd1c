//! Repository trait for the activity log.

use crate::domain::entities::{ActivityLog, ActivityLogFilter, NewActivityLog};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ActivityLogRepository: Send + Sync {
    /// Lists matching entries, newest first.
    async fn find_all(&self, filter: ActivityLogFilter) -> Result<Vec<ActivityLog>, AppError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<ActivityLog>, AppError>;

    async fn create(&self, entry: NewActivityLog) -> Result<ActivityLog, AppError>;

    async fn delete_by_id(&self, id: i64) -> Result<bool, AppError>;

    /// Deletes entries older than `cutoff`, returning how many were removed.
    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, AppError>;
}
