//! DTOs for the activity log endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use serde_with::{DisplayFromStr, serde_as};
use validator::Validate;

use super::pagination::split_list;
use crate::domain::entities::{ActivityLog, ActivityLogFilter, ActivityStatus, ActivityType};
use crate::error::AppError;

/// Query of `GET /api/activity` and `GET /api/activity/stats`.
///
/// `types` and `statuses` are comma-separated lists.
#[serde_as]
#[derive(Debug, Default, Deserialize)]
pub struct ActivityQuery {
    #[serde(default, with = "super::pagination::optional_date_start")]
    pub start_date: Option<DateTime<Utc>>,

    #[serde(default, with = "super::pagination::optional_date_end")]
    pub end_date: Option<DateTime<Utc>>,

    pub types: Option<String>,
    pub statuses: Option<String>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub user_id: Option<i64>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub station_id: Option<i64>,

    pub search: Option<String>,
}

impl ActivityQuery {
    pub fn into_filter(self) -> Result<ActivityLogFilter, AppError> {
        let activity_types = split_list(self.types.as_deref())
            .into_iter()
            .map(|t| {
                ActivityType::parse(t).ok_or_else(|| {
                    AppError::bad_request("Tipo de actividad inválido", json!({ "type": t }))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let statuses = split_list(self.statuses.as_deref())
            .into_iter()
            .map(|s| {
                ActivityStatus::parse(s).ok_or_else(|| {
                    AppError::bad_request("Estado de actividad inválido", json!({ "status": s }))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ActivityLogFilter {
            start_date: self.start_date,
            end_date: self.end_date,
            activity_types,
            statuses,
            user_id: self.user_id,
            station_id: self.station_id,
            search: self.search.filter(|s| !s.trim().is_empty()),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ActivityListResponse {
    pub total: usize,
    pub items: Vec<ActivityLog>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PurgeRequest {
    #[validate(range(min = 1, max = 3650, message = "Los días a conservar deben estar entre 1 y 3650"))]
    pub days_to_keep: i64,
}

#[derive(Debug, Serialize)]
pub struct PurgeResponse {
    pub removed: u64,
    pub days_to_keep: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_filter_parses_lists() {
        let query = ActivityQuery {
            types: Some("user_login, station_created".into()),
            statuses: Some("success".into()),
            search: Some("  ".into()),
            ..Default::default()
        };
        let filter = query.into_filter().unwrap();

        assert_eq!(
            filter.activity_types,
            vec![ActivityType::UserLogin, ActivityType::StationCreated]
        );
        assert_eq!(filter.statuses, vec![ActivityStatus::Success]);
        assert!(filter.search.is_none());
    }

    #[test]
    fn test_into_filter_rejects_unknown_type() {
        let query = ActivityQuery {
            types: Some("teleport".into()),
            ..Default::default()
        };
        assert!(query.into_filter().is_err());
    }

    #[test]
    fn test_purge_request_bounds() {
        assert!(PurgeRequest { days_to_keep: 0 }.validate().is_err());
        assert!(PurgeRequest { days_to_keep: 30 }.validate().is_ok());
    }
}
