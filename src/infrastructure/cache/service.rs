//! Cache service trait and error types.

use async_trait::async_trait;
use std::fmt;

use crate::domain::entities::Measurement;

/// Errors that can occur during cache operations.
#[derive(Debug)]
pub enum CacheError {
    ConnectionError(String),
    OperationError(String),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::ConnectionError(e) => write!(f, "Cache connection error: {}", e),
            Self::OperationError(e) => write!(f, "Cache operation error: {}", e),
        }
    }
}

impl std::error::Error for CacheError {}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Cache key for the latest readings of one station, or of all stations.
pub fn latest_key(station_id: Option<i64>) -> String {
    match station_id {
        Some(id) => format!("latest:{id}"),
        None => "latest:all".to_string(),
    }
}

/// Trait for caching the latest-readings lists served by
/// `GET /api/measurements/latest`.
///
/// Implementations must be thread-safe and handle errors gracefully without
/// disrupting the application (cache failures should degrade to repository lookups).
///
/// # Implementations
///
/// - [`crate::infrastructure::cache::RedisCache`] - Redis-backed cache with TTL support
/// - [`crate::infrastructure::cache::NullCache`] - No-op implementation for disabled caching
#[async_trait]
pub trait CacheService: Send + Sync {
    /// Retrieves the cached latest readings for a station (`None` = all stations).
    ///
    /// # Returns
    ///
    /// - `Ok(Some(readings))` on cache hit
    /// - `Ok(None)` on cache miss or error (fail-open behavior)
    async fn get_latest(&self, station_id: Option<i64>) -> CacheResult<Option<Vec<Measurement>>>;

    /// Stores a latest-readings list with optional TTL.
    ///
    /// # Errors
    ///
    /// Should not propagate errors to callers. Implementations should log errors
    /// and return `Ok(())` to avoid disrupting the request flow.
    async fn set_latest(
        &self,
        station_id: Option<i64>,
        readings: &[Measurement],
        ttl_seconds: Option<usize>,
    ) -> CacheResult<()>;

    /// Drops the cached lists affected by a new reading at `station_id`:
    /// the station's own list and the all-stations list.
    async fn invalidate_latest(&self, station_id: i64) -> CacheResult<()>;

    /// Checks if the cache backend is healthy.
    ///
    /// Used by health check endpoints to report cache status.
    async fn health_check(&self) -> bool;
}
