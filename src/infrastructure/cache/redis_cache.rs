//! Redis-backed cache implementation.

use super::service::{CacheError, CacheResult, CacheService, latest_key};
use crate::domain::entities::Measurement;
use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use tracing::{debug, error, info, warn};

/// Redis cache for latest-reading lists, stored as JSON strings.
///
/// Uses connection pooling via `ConnectionManager` for efficient connection reuse.
/// All operations are fail-open: errors are logged but don't propagate to callers.
pub struct RedisCache {
    client: ConnectionManager,
    default_ttl: usize,
    key_prefix: String,
}

impl RedisCache {
    /// Connects to Redis, validates the connection with a PING, and configures the default TTL.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::ConnectionError`] if the URL is invalid, the connection cannot
    /// be established, or the PING health check fails.
    pub async fn connect(redis_url: &str, default_ttl_seconds: u64) -> CacheResult<Self> {
        info!("Connecting to Redis");

        let client = Client::open(redis_url).map_err(|e| {
            CacheError::ConnectionError(format!("Failed to create Redis client: {}", e))
        })?;

        let manager = ConnectionManager::new(client).await.map_err(|e| {
            CacheError::ConnectionError(format!("Failed to connect to Redis: {}", e))
        })?;

        let mut test_conn = manager.clone();
        test_conn
            .ping::<()>()
            .await
            .map_err(|e| CacheError::ConnectionError(format!("Redis PING failed: {}", e)))?;

        info!("✓ Connected to Redis");

        Ok(Self {
            client: manager,
            default_ttl: default_ttl_seconds as usize,
            key_prefix: "river:".to_string(),
        })
    }

    /// Constructs the full Redis key with namespace prefix.
    fn build_key(&self, station_id: Option<i64>) -> String {
        format!("{}{}", self.key_prefix, latest_key(station_id))
    }
}

#[async_trait]
impl CacheService for RedisCache {
    async fn get_latest(&self, station_id: Option<i64>) -> CacheResult<Option<Vec<Measurement>>> {
        let key = self.build_key(station_id);
        let mut conn = self.client.clone();

        match conn.get::<_, Option<String>>(&key).await {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<Measurement>>(&raw) {
                Ok(readings) => {
                    debug!("Cache HIT: {} ({} readings)", key, readings.len());
                    Ok(Some(readings))
                }
                Err(e) => {
                    warn!("Discarding undecodable cache entry {}: {}", key, e);
                    Ok(None)
                }
            },
            Ok(None) => {
                debug!("Cache MISS: {}", key);
                Ok(None)
            }
            Err(e) => {
                error!("Redis GET error for {}: {}", key, e);
                Ok(None)
            }
        }
    }

    async fn set_latest(
        &self,
        station_id: Option<i64>,
        readings: &[Measurement],
        ttl: Option<usize>,
    ) -> CacheResult<()> {
        let key = self.build_key(station_id);
        let mut conn = self.client.clone();
        let ttl_seconds = ttl.unwrap_or(self.default_ttl);

        let payload = serde_json::to_string(readings)
            .map_err(|e| CacheError::OperationError(format!("Serialization failed: {}", e)))?;

        match conn
            .set_ex::<_, _, ()>(&key, payload, ttl_seconds as u64)
            .await
        {
            Ok(_) => {
                debug!("Cache SET: {} (TTL: {}s)", key, ttl_seconds);
                Ok(())
            }
            Err(e) => {
                warn!("Redis SET error for {}: {}", key, e);
                Ok(())
            }
        }
    }

    async fn invalidate_latest(&self, station_id: i64) -> CacheResult<()> {
        let keys = [self.build_key(Some(station_id)), self.build_key(None)];
        let mut conn = self.client.clone();

        match conn.del::<_, i32>(&keys[..]).await {
            Ok(deleted) => {
                if deleted > 0 {
                    debug!("Cache INVALIDATE: station {}", station_id);
                }
                Ok(())
            }
            Err(e) => {
                warn!("Redis DEL error for station {}: {}", station_id, e);
                Ok(())
            }
        }
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.client.clone();
        conn.ping::<()>().await.is_ok()
    }
}
