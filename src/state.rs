//! Shared application state handed to every handler.

use chrono::Duration;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::application::services::{
    ActivityService, AlertConfigurationService, AlertService, AuthService, MeasurementService,
    ReportService, StationService, UserService,
};
use crate::domain::reading_event::ReadingEvent;
use crate::domain::repositories::{
    ActivityLogRepository, AlertConfigurationRepository, AlertRepository, MeasurementRepository,
    StationRepository, TokenRepository, UserRepository,
};
use crate::infrastructure::cache::CacheService;
use crate::infrastructure::container::Container;

pub type DynStationService = StationService<dyn StationRepository, dyn ActivityLogRepository>;
pub type DynMeasurementService =
    MeasurementService<dyn MeasurementRepository, dyn StationRepository, dyn ActivityLogRepository>;
pub type DynAlertService = AlertService<
    dyn AlertRepository,
    dyn AlertConfigurationRepository,
    dyn ActivityLogRepository,
>;
pub type DynAlertConfigurationService = AlertConfigurationService<
    dyn AlertConfigurationRepository,
    dyn StationRepository,
    dyn ActivityLogRepository,
>;
pub type DynUserService =
    UserService<dyn UserRepository, dyn StationRepository, dyn ActivityLogRepository>;
pub type DynAuthService =
    AuthService<dyn UserRepository, dyn TokenRepository, dyn ActivityLogRepository>;
pub type DynReportService =
    ReportService<dyn MeasurementRepository, dyn StationRepository, dyn ActivityLogRepository>;
pub type DynActivityService = ActivityService<dyn ActivityLogRepository>;

/// Service-level settings taken from the configuration.
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub token_signing_secret: String,
    pub token_ttl: Duration,
    pub critical_station_ids: Vec<i64>,
}

#[derive(Clone)]
pub struct AppState {
    pub repositories: Container,
    pub station_service: Arc<DynStationService>,
    pub measurement_service: Arc<DynMeasurementService>,
    pub alert_service: Arc<DynAlertService>,
    pub alert_configuration_service: Arc<DynAlertConfigurationService>,
    pub user_service: Arc<DynUserService>,
    pub auth_service: Arc<DynAuthService>,
    pub report_service: Arc<DynReportService>,
    pub activity_service: Arc<DynActivityService>,
    pub cache: Arc<dyn CacheService>,
    pub reading_sender: mpsc::Sender<ReadingEvent>,
}

impl AppState {
    /// Builds every service on top of the repositories in `container`.
    pub fn new(
        container: Container,
        settings: ServiceSettings,
        cache: Arc<dyn CacheService>,
        reading_sender: mpsc::Sender<ReadingEvent>,
    ) -> Self {
        let c = &container;

        Self {
            station_service: Arc::new(StationService::new(
                c.stations.clone(),
                c.activity.clone(),
                settings.critical_station_ids,
            )),
            measurement_service: Arc::new(MeasurementService::new(
                c.measurements.clone(),
                c.stations.clone(),
                c.activity.clone(),
            )),
            alert_service: Arc::new(AlertService::new(
                c.alerts.clone(),
                c.alert_configurations.clone(),
                c.activity.clone(),
            )),
            alert_configuration_service: Arc::new(AlertConfigurationService::new(
                c.alert_configurations.clone(),
                c.stations.clone(),
                c.activity.clone(),
            )),
            user_service: Arc::new(UserService::new(
                c.users.clone(),
                c.stations.clone(),
                c.activity.clone(),
            )),
            auth_service: Arc::new(AuthService::new(
                c.users.clone(),
                c.tokens.clone(),
                c.activity.clone(),
                settings.token_signing_secret,
                settings.token_ttl,
            )),
            report_service: Arc::new(ReportService::new(
                c.measurements.clone(),
                c.stations.clone(),
                c.activity.clone(),
            )),
            activity_service: Arc::new(ActivityService::new(c.activity.clone())),
            repositories: container,
            cache,
            reading_sender,
        }
    }
}
