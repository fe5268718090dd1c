//! Repository implementations.
//!
//! Two backends implement every domain repository trait:
//!
//! - [`memory`] - Lock-protected in-process tables, optionally seeded with demo data
//! - PostgreSQL repositories built on SQLx runtime queries:
//!   [`PgStationRepository`], [`PgMeasurementRepository`], [`PgAlertRepository`],
//!   [`PgAlertConfigurationRepository`], [`PgUserRepository`], [`PgTokenRepository`]
//!   and [`PgActivityLogRepository`]
//!
//! The schema lives in `migrations/` and is applied at startup.

pub mod memory;
pub mod pg_activity_log_repository;
pub mod pg_alert_repository;
pub mod pg_measurement_repository;
pub mod pg_station_repository;
pub mod pg_token_repository;
pub mod pg_user_repository;

pub use pg_activity_log_repository::PgActivityLogRepository;
pub use pg_alert_repository::{PgAlertConfigurationRepository, PgAlertRepository};
pub use pg_measurement_repository::PgMeasurementRepository;
pub use pg_station_repository::PgStationRepository;
pub use pg_token_repository::PgTokenRepository;
pub use pg_user_repository::PgUserRepository;
