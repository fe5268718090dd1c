//! Repository trait for station data access.

use crate::domain::entities::{NewStation, Station, StationPatch};
use chrono::{DateTime, Utc};
use crate::domain::pagination::{Page, PageRequest, StationFilter};
use crate::error::AppError;
use async_trait::async_trait;

/// Repository interface for monitoring stations.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::memory::InMemoryStationRepository`]
/// - [`crate::infrastructure::persistence::pg::PgStationRepository`]
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StationRepository: Send + Sync {
    /// Lists every station ordered by name.
    async fn find_all(&self) -> Result<Vec<Station>, AppError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Station>, AppError>;

    /// Looks a station up by its (already normalized) code.
    async fn find_by_code(&self, code: &str) -> Result<Option<Station>, AppError>;

    /// Returns one page of stations matching `filter`.
    ///
    /// `page.sort_by` must already be validated against
    /// [`crate::domain::pagination::STATION_SORT_FIELDS`].
    async fn find_page(
        &self,
        page: PageRequest,
        filter: StationFilter,
    ) -> Result<Page<Station>, AppError>;

    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the code is already taken.
    async fn create(&self, station: NewStation) -> Result<Station, AppError>;

    /// Applies a partial update. Returns `Ok(None)` when the station does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the new code belongs to another station.
    async fn update(&self, id: i64, patch: StationPatch) -> Result<Option<Station>, AppError>;

    /// Sets `current_level` and `last_measurement` unless the station already
    /// holds a newer reading. The comparison and the write are atomic.
    ///
    /// Returns the station as stored afterwards, or `Ok(None)` when it does not exist.
    async fn record_level(
        &self,
        id: i64,
        level: f64,
        timestamp: DateTime<Utc>,
    ) -> Result<Option<Station>, AppError>;

    /// Returns `Ok(false)` when nothing was deleted.
    async fn delete(&self, id: i64) -> Result<bool, AppError>;
}
