//! HTTP request handlers for API endpoints.
//!
//! Each handler module corresponds to a logical grouping of endpoints.

pub mod activity;
pub mod alerts;
pub mod auth;
pub mod health;
pub mod measurements;
pub mod normalize;
pub mod reports;
pub mod stations;
pub mod users;

pub use activity::{
    activity_stats_handler, delete_activity_handler, list_activity_handler,
    purge_activity_handler,
};
pub use alerts::{
    create_configuration_handler, delete_configuration_handler, get_configuration_handler,
    list_alerts_handler, list_configurations_handler, resolve_alert_handler,
    update_configuration_handler,
};
pub use auth::{login_handler, logout_handler, me_handler, refresh_handler, register_handler};
pub use health::health_handler;
pub use measurements::{historical_handler, latest_handler, record_measurement_handler};
pub use normalize::normalize_handler;
pub use reports::{
    comparative_handler, critical_events_handler, daily_average_handler, export_handler,
};
pub use stations::{
    create_station_handler, delete_station_handler, get_station_handler, list_stations_handler,
    station_series_handler, update_station_handler,
};
pub use users::{
    assign_stations_handler, create_user_handler, delete_user_handler, get_user_handler,
    list_users_handler, update_user_handler,
};
