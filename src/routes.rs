//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET  /health`              - Health check: storage, cache, ingest queue (public)
//! - `POST /api/auth/login|register` - Credentials (public, strict rate limit)
//! - `POST /api/auth/refresh`    - Token rotation (public)
//! - `/api/*`                    - REST API (Bearer token required)
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **Rate limiting** - Per-IP token bucket
//! - **Authentication** - Bearer token
//! - **Path normalization** - Trailing slash handling

use crate::api;
use crate::api::handlers::health_handler;
use crate::api::middleware::{auth, rate_limit, tracing};
use crate::state::AppState;
use axum::routing::get;
use axum::{Router, middleware};
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// Constructs the application router with all routes and middleware.
///
/// # Arguments
///
/// - `state` - shared application state injected into all handlers
/// - `with_rate_limit` - when `true`, per-IP rate limiting is applied. The limiter
///   keys on the peer address, so the router must then be served with
///   connect info; in-process test servers pass `false`.
pub fn router(state: AppState, with_rate_limit: bool) -> Router {
    let mut credentials = api::routes::credential_routes();
    let mut protected = api::routes::protected_routes()
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::layer));
    let mut sessions = api::routes::session_routes();

    if with_rate_limit {
        credentials = credentials.layer(rate_limit::secure_layer());
        protected = protected.layer(rate_limit::layer());
        sessions = sessions.layer(rate_limit::layer());
    }

    let api_router = Router::new()
        .merge(credentials)
        .merge(sessions)
        .merge(protected);

    Router::new()
        .route("/health", get(health_handler))
        .nest("/api", api_router)
        .with_state(state)
        .layer(tracing::layer())
}

/// Rate-limited [`router`] with trailing slashes trimmed before routing.
pub fn app_router(state: AppState) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(router(state, true))
}
