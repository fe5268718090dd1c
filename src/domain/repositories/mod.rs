//! Repository trait definitions for the domain layer.
//!
//! Traits define the contract for data operations. Two families of
//! implementations live in `crate::infrastructure::persistence`: in-memory
//! adapters (default, optionally seeded with demo data) and PostgreSQL
//! adapters. Mock implementations are generated via `mockall` for unit tests.
//!
//! # Available Repositories
//!
//! - [`StationRepository`] - Monitoring stations, paging and filtering
//! - [`MeasurementRepository`] - Sensor readings
//! - [`AlertRepository`] / [`AlertConfigurationRepository`] - Alerts and thresholds
//! - [`UserRepository`] - Accounts and station assignments
//! - [`TokenRepository`] - Session tokens
//! - [`ActivityLogRepository`] - Audit trail

pub mod activity_log_repository;
pub mod alert_repository;
pub mod measurement_repository;
pub mod station_repository;
pub mod token_repository;
pub mod user_repository;

pub use activity_log_repository::ActivityLogRepository;
pub use alert_repository::{AlertConfigurationRepository, AlertRepository};
pub use measurement_repository::MeasurementRepository;
pub use station_repository::StationRepository;
pub use token_repository::TokenRepository;
pub use user_repository::UserRepository;

#[cfg(test)]
pub use activity_log_repository::MockActivityLogRepository;
#[cfg(test)]
pub use alert_repository::{MockAlertConfigurationRepository, MockAlertRepository};
#[cfg(test)]
pub use measurement_repository::MockMeasurementRepository;
#[cfg(test)]
pub use station_repository::MockStationRepository;
#[cfg(test)]
pub use token_repository::MockTokenRepository;
#[cfg(test)]
pub use user_repository::MockUserRepository;
