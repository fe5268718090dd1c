//! API route configuration.
//!
//! Credential endpoints are public; everything else requires Bearer token
//! authentication via [`crate::api::middleware::auth`]. Role checks happen in
//! the handlers.

use crate::api::handlers::{
    activity_stats_handler, assign_stations_handler, comparative_handler,
    create_configuration_handler, create_station_handler, create_user_handler,
    critical_events_handler, daily_average_handler, delete_activity_handler,
    delete_configuration_handler, delete_station_handler, delete_user_handler, export_handler,
    get_configuration_handler, get_station_handler, get_user_handler, historical_handler,
    latest_handler, list_activity_handler, list_alerts_handler, list_configurations_handler,
    list_stations_handler, list_users_handler, login_handler, logout_handler, me_handler,
    normalize_handler, purge_activity_handler, record_measurement_handler, refresh_handler,
    register_handler, resolve_alert_handler, station_series_handler,
    update_configuration_handler, update_station_handler, update_user_handler,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{delete, get, post, put},
};

/// Login and registration. Served behind the strict rate limiter.
///
/// # Endpoints
///
/// - `POST /auth/login`    - Exchange credentials for a token
/// - `POST /auth/register` - Create an observer account
pub fn credential_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login_handler))
        .route("/auth/register", post(register_handler))
}

/// Public session endpoints that validate the token themselves.
///
/// - `POST /auth/refresh` - Swap a valid token for a new one
pub fn session_routes() -> Router<AppState> {
    Router::new().route("/auth/refresh", post(refresh_handler))
}

/// Routes protected by Bearer token authentication.
///
/// # Endpoints
///
/// - `POST   /auth/logout`, `GET /auth/me`
/// - `GET|POST /stations`, `GET|PATCH|DELETE /stations/{id}`, `GET /stations/{id}/series`
/// - `GET|POST /measurements`, `GET /measurements/latest`
/// - `GET /alerts`, `POST /alerts/{id}/resolve`
/// - `GET|POST /alert-configurations`, `GET|PATCH|DELETE /alert-configurations/{id}`
/// - `GET|POST /users`, `GET|PUT|DELETE /users/{id}`, `PUT /users/{id}/stations`
/// - `GET /reports/{daily-average,critical-events,comparative,export}`
/// - `GET /activity`, `GET /activity/stats`, `DELETE /activity/{id}`, `POST /activity/purge`
/// - `POST /normalize`
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/logout", post(logout_handler))
        .route("/auth/me", get(me_handler))
        .route(
            "/stations",
            get(list_stations_handler).post(create_station_handler),
        )
        .route(
            "/stations/{id}",
            get(get_station_handler)
                .patch(update_station_handler)
                .delete(delete_station_handler),
        )
        .route("/stations/{id}/series", get(station_series_handler))
        .route(
            "/measurements",
            get(historical_handler).post(record_measurement_handler),
        )
        .route("/measurements/latest", get(latest_handler))
        .route("/alerts", get(list_alerts_handler))
        .route("/alerts/{id}/resolve", post(resolve_alert_handler))
        .route(
            "/alert-configurations",
            get(list_configurations_handler).post(create_configuration_handler),
        )
        .route(
            "/alert-configurations/{id}",
            get(get_configuration_handler)
                .patch(update_configuration_handler)
                .delete(delete_configuration_handler),
        )
        .route("/users", get(list_users_handler).post(create_user_handler))
        .route(
            "/users/{id}",
            get(get_user_handler)
                .put(update_user_handler)
                .delete(delete_user_handler),
        )
        .route("/users/{id}/stations", put(assign_stations_handler))
        .route("/reports/daily-average", get(daily_average_handler))
        .route("/reports/critical-events", get(critical_events_handler))
        .route("/reports/comparative", get(comparative_handler))
        .route("/reports/export", get(export_handler))
        .route("/activity", get(list_activity_handler))
        .route("/activity/stats", get(activity_stats_handler))
        .route("/activity/purge", post(purge_activity_handler))
        .route("/activity/{id}", delete(delete_activity_handler))
        .route("/normalize", post(normalize_handler))
}
