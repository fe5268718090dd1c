//! Application layer services implementing business logic.
//!
//! This layer orchestrates domain operations by coordinating repository calls,
//! validation, and business rules. Services consume repository traits and provide
//! a clean API for HTTP handlers.
//!
//! # Available Services
//!
//! - [`services::station_service::StationService`] - Station catalogue and thresholds
//! - [`services::measurement_service::MeasurementService`] - Reading queries and persistence
//! - [`services::alert_service::AlertService`] - Alert lifecycle and threshold evaluation
//! - [`services::alert_configuration_service::AlertConfigurationService`] - Per-sensor thresholds
//! - [`services::user_service::UserService`] - Operator accounts and station assignments
//! - [`services::auth_service::AuthService`] - Login, sessions and bearer tokens
//! - [`services::report_service::ReportService`] - Aggregated reports and exports
//! - [`services::activity_service::ActivityService`] - Audit trail queries and maintenance
//!
//! [`export`] renders report tables as CSV, Excel or PDF files.
//! [`normalization`] turns heterogeneous reading payloads into chart series and
//! [`reading_worker`] drains the ingest queue.

pub mod export;
pub mod normalization;
pub mod reading_worker;
pub mod services;
