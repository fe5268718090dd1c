//! HTTP server initialization and runtime setup.
//!
//! Handles storage selection, cache setup, worker spawning, and Axum server lifecycle.

use crate::application::reading_worker::run_reading_worker;
use crate::config::Config;
use crate::infrastructure::cache::{CacheService, NullCache, RedisCache};
use crate::infrastructure::{Backend, Container};
use crate::routes::app_router;
use crate::state::{AppState, ServiceSettings};

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Opens a PostgreSQL pool with the configured limits and applies migrations.
///
/// # Errors
///
/// Returns an error if no database URL is configured, the connection fails
/// or a migration cannot be applied.
pub async fn connect_database(config: &Config) -> Result<PgPool> {
    let url = config
        .database_url
        .as_deref()
        .context("DATABASE_URL is required for the postgres backend")?;

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime))
        .connect(url)
        .await
        .context("Failed to connect to PostgreSQL")?;
    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to migrate")?;

    Ok(pool)
}

/// Builds the repositories for the configured backend.
pub async fn build_container(config: &Config) -> Result<Container> {
    match config.backend {
        Backend::Memory => {
            tracing::info!(seeded = config.seed_demo_data, "Using in-memory storage");
            Ok(Container::in_memory(config.seed_demo_data))
        }
        Backend::Postgres => {
            let pool = connect_database(config).await?;
            Ok(Container::postgres(Arc::new(pool)))
        }
    }
}

async fn build_cache(config: &Config) -> Arc<dyn CacheService> {
    if let Some(redis_url) = &config.redis_url {
        match RedisCache::connect(redis_url, config.cache_ttl_seconds).await {
            Ok(redis) => {
                tracing::info!("Cache enabled (Redis)");
                Arc::new(redis)
            }
            Err(e) => {
                tracing::warn!("Failed to connect to Redis: {}. Using NullCache.", e);
                Arc::new(NullCache::new())
            }
        }
    } else {
        tracing::info!("Cache disabled (NullCache)");
        Arc::new(NullCache::new())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - Storage backend (in-memory or PostgreSQL with migrations)
/// - Redis cache (or NullCache fallback)
/// - Background reading worker
/// - Axum HTTP server with graceful shutdown on Ctrl-C
///
/// Queued readings are drained before the function returns.
///
/// # Errors
///
/// Returns an error if:
/// - Database connection or migration fails
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let container = build_container(&config).await?;
    let cache = build_cache(&config).await;

    let (reading_tx, reading_rx) = mpsc::channel(config.ingest_queue_capacity);

    let settings = ServiceSettings {
        token_signing_secret: config.token_signing_secret.clone(),
        token_ttl: chrono::Duration::hours(config.token_ttl_hours),
        critical_station_ids: config.critical_station_ids.clone(),
    };
    let state = AppState::new(container, settings, cache.clone(), reading_tx);

    let worker = tokio::spawn(run_reading_worker(
        reading_rx,
        state.measurement_service.clone(),
        state.alert_service.clone(),
        cache,
        config.ingest_worker_concurrency,
    ));

    let app = app_router(state);

    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .with_context(|| format!("Invalid listen address '{}'", config.listen_addr))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    if let Err(e) = worker.await {
        tracing::error!("Reading worker terminated abnormally: {}", e);
    }

    Ok(())
}
