//! Core domain entities.
//!
//! Entities are plain records. Creation inputs use separate `New*` structs and
//! partial updates use `*Patch` structs where `None` means "leave unchanged".
//!
//! # Entity Types
//!
//! - [`Station`] - A monitoring site with coordinates and an alert threshold
//! - [`Measurement`] - A timestamped reading tied to a station
//! - [`Alert`] / [`AlertConfiguration`] - Raised alerts and the thresholds behind them
//! - [`User`] - An operator with a [`Role`] and assigned stations
//! - [`ActivityLog`] - Audit trail entry
//! - [`ApiToken`] - Session token issued at login
//! - Report filters and rows in [`report`]

pub mod activity_log;
pub mod alert;
pub mod measurement;
pub mod report;
pub mod station;
pub mod token;
pub mod user;

pub use activity_log::{
    ActivityLog, ActivityLogFilter, ActivityStats, ActivityStatus, ActivityType, NewActivityLog,
};
pub use alert::{
    Alert, AlertConfiguration, AlertConfigurationPatch, AlertThreshold, Breach,
    NewAlert, NewAlertConfiguration, Severity, ThresholdLevel, ThresholdSpec,
};
pub use measurement::{Measurement, MeasurementFilter, NewMeasurement, Quality, WATER_LEVEL};
pub use report::{
    CriticalEvent, DailyAverage, ExportFormat, ReportFile, ReportFilter, ReportType,
    StationComparison,
};
pub use station::{NewStation, Station, StationPatch, StationStatus};
pub use token::ApiToken;
pub use user::{NewUser, Role, UpdateUser, User};
