//! Audit trail entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    UserLogin,
    UserLogout,
    StationCreated,
    StationUpdated,
    StationDeleted,
    MeasurementRecorded,
    AlertTriggered,
    AlertResolved,
    ReportGenerated,
    ReportDownloaded,
    SystemMaintenance,
    DataExport,
    ConfigurationChanged,
    BackupCreated,
    ThresholdUpdated,
}

impl ActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserLogin => "user_login",
            Self::UserLogout => "user_logout",
            Self::StationCreated => "station_created",
            Self::StationUpdated => "station_updated",
            Self::StationDeleted => "station_deleted",
            Self::MeasurementRecorded => "measurement_recorded",
            Self::AlertTriggered => "alert_triggered",
            Self::AlertResolved => "alert_resolved",
            Self::ReportGenerated => "report_generated",
            Self::ReportDownloaded => "report_downloaded",
            Self::SystemMaintenance => "system_maintenance",
            Self::DataExport => "data_export",
            Self::ConfigurationChanged => "configuration_changed",
            Self::BackupCreated => "backup_created",
            Self::ThresholdUpdated => "threshold_updated",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        serde_json::from_value(Value::String(s.to_string())).ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityStatus {
    Success,
    Warning,
    Error,
    Info,
}

impl ActivityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Info => "info",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        serde_json::from_value(Value::String(s.to_string())).ok()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityLog {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub user_id: Option<i64>,
    pub user_name: Option<String>,
    pub activity_type: ActivityType,
    pub title: String,
    pub description: String,
    pub status: ActivityStatus,
    pub station_id: Option<i64>,
    pub station_name: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub metadata: Option<Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewActivityLog {
    pub timestamp: DateTime<Utc>,
    pub user_id: Option<i64>,
    pub user_name: Option<String>,
    pub activity_type: ActivityType,
    pub title: String,
    pub description: String,
    pub status: ActivityStatus,
    pub station_id: Option<i64>,
    pub station_name: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub metadata: Option<Value>,
}

impl NewActivityLog {
    /// Creates a successful entry stamped with the current time.
    pub fn new(
        activity_type: ActivityType,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            user_id: None,
            user_name: None,
            activity_type,
            title: title.into(),
            description: description.into(),
            status: ActivityStatus::Success,
            station_id: None,
            station_name: None,
            ip_address: None,
            user_agent: None,
            metadata: None,
        }
    }

    pub fn with_status(mut self, status: ActivityStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_user(mut self, user_id: i64, user_name: impl Into<String>) -> Self {
        self.user_id = Some(user_id);
        self.user_name = Some(user_name.into());
        self
    }

    pub fn with_station(mut self, station_id: i64, station_name: impl Into<String>) -> Self {
        self.station_id = Some(station_id);
        self.station_name = Some(station_name.into());
        self
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Filter for activity log queries. Empty collections mean "any".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityLogFilter {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub activity_types: Vec<ActivityType>,
    pub statuses: Vec<ActivityStatus>,
    pub user_id: Option<i64>,
    pub station_id: Option<i64>,
    pub search: Option<String>,
}

impl ActivityLogFilter {
    pub fn matches(&self, log: &ActivityLog) -> bool {
        if self.start_date.is_some_and(|from| log.timestamp < from) {
            return false;
        }
        if self.end_date.is_some_and(|to| log.timestamp > to) {
            return false;
        }
        if !self.activity_types.is_empty() && !self.activity_types.contains(&log.activity_type) {
            return false;
        }
        if !self.statuses.is_empty() && !self.statuses.contains(&log.status) {
            return false;
        }
        if self.user_id.is_some_and(|id| log.user_id != Some(id)) {
            return false;
        }
        if self.station_id.is_some_and(|id| log.station_id != Some(id)) {
            return false;
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.trim().is_empty()) {
            let needle = search.to_lowercase();
            let hit = |s: &str| s.to_lowercase().contains(&needle);
            return hit(&log.title)
                || hit(&log.description)
                || log.user_name.as_deref().is_some_and(hit)
                || log.station_name.as_deref().is_some_and(hit);
        }
        true
    }
}

/// Aggregated view over a filtered slice of the activity log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityStats {
    pub total: usize,
    pub by_type: BTreeMap<String, usize>,
    pub by_status: BTreeMap<String, usize>,
    pub recent_activity: Vec<ActivityLog>,
}
