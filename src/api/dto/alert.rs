//! DTOs for alerts and alert configurations.

use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};

use crate::application::services::alert_configuration_service::AlertConfigurationInput;
use crate::domain::entities::{Alert, AlertConfigurationPatch, ThresholdSpec};

#[serde_as]
#[derive(Debug, Default, Deserialize)]
pub struct AlertListQuery {
    /// Only unresolved alerts. Defaults to true.
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub active_only: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct AlertListResponse {
    pub total: usize,
    pub items: Vec<Alert>,
}

#[serde_as]
#[derive(Debug, Default, Deserialize)]
pub struct ConfigurationListQuery {
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub station_id: Option<i64>,

    pub sensor_type: Option<String>,
}

/// Body of `POST /api/alert-configurations`.
#[derive(Debug, Deserialize)]
pub struct CreateAlertConfigurationRequest {
    #[serde(default)]
    pub station_id: i64,
    #[serde(default)]
    pub sensor_type: String,
    pub sensor_unit: Option<String>,
    pub is_active: Option<bool>,
    #[serde(default)]
    pub thresholds: Vec<ThresholdSpec>,
}

impl From<CreateAlertConfigurationRequest> for AlertConfigurationInput {
    fn from(r: CreateAlertConfigurationRequest) -> Self {
        AlertConfigurationInput {
            station_id: r.station_id,
            sensor_type: r.sensor_type,
            sensor_unit: r.sensor_unit,
            is_active: r.is_active,
            thresholds: r.thresholds,
        }
    }
}

/// Body of `PATCH /api/alert-configurations/{id}`.
///
/// `thresholds`, when present, replaces the whole threshold set. Entries with
/// an `id` update that threshold in place.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateAlertConfigurationRequest {
    pub is_active: Option<bool>,
    pub thresholds: Option<Vec<ThresholdSpec>>,
}

impl From<UpdateAlertConfigurationRequest> for AlertConfigurationPatch {
    fn from(r: UpdateAlertConfigurationRequest) -> Self {
        AlertConfigurationPatch {
            is_active: r.is_active,
            thresholds: r.thresholds,
        }
    }
}
