//! Business logic services for the application layer.

pub mod activity_service;
pub mod alert_configuration_service;
pub mod alert_service;
pub mod auth_service;
pub mod measurement_service;
pub mod report_service;
pub mod station_service;
pub mod user_service;

pub use activity_service::ActivityService;
pub use alert_configuration_service::AlertConfigurationService;
pub use alert_service::AlertService;
pub use auth_service::AuthService;
pub use measurement_service::MeasurementService;
pub use report_service::ReportService;
pub use station_service::StationService;
pub use user_service::UserService;
