//! Repository wiring.
//!
//! A [`Container`] holds one trait object per repository so the rest of the
//! application never names a concrete adapter. The backend is picked once at
//! startup from `DATA_BACKEND`.

use sqlx::PgPool;
use std::sync::Arc;

use super::persistence::memory::{
    MemoryActivityLogRepository, MemoryAlertConfigurationRepository, MemoryAlertRepository,
    MemoryMeasurementRepository, MemoryStationRepository, MemoryTokenRepository,
    MemoryUserRepository, seed,
};
use super::persistence::{
    PgActivityLogRepository, PgAlertConfigurationRepository, PgAlertRepository,
    PgMeasurementRepository, PgStationRepository, PgTokenRepository, PgUserRepository,
};
use crate::domain::repositories::{
    ActivityLogRepository, AlertConfigurationRepository, AlertRepository, MeasurementRepository,
    StationRepository, TokenRepository, UserRepository,
};

/// Storage backend behind the repositories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Memory,
    Postgres,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Postgres => "postgres",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" | "mock" => Some(Self::Memory),
            "postgres" | "postgresql" => Some(Self::Postgres),
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct Container {
    pub backend: Backend,
    pub pool: Option<Arc<PgPool>>,
    pub stations: Arc<dyn StationRepository>,
    pub measurements: Arc<dyn MeasurementRepository>,
    pub alerts: Arc<dyn AlertRepository>,
    pub alert_configurations: Arc<dyn AlertConfigurationRepository>,
    pub users: Arc<dyn UserRepository>,
    pub tokens: Arc<dyn TokenRepository>,
    pub activity: Arc<dyn ActivityLogRepository>,
}

impl Container {
    /// In-process repositories, optionally loaded with the demo data set.
    pub fn in_memory(seed_demo_data: bool) -> Self {
        let data = if seed_demo_data {
            seed::demo_data()
        } else {
            seed::DemoData::default()
        };

        Self {
            backend: Backend::Memory,
            pool: None,
            stations: Arc::new(MemoryStationRepository::new(data.stations)),
            measurements: Arc::new(MemoryMeasurementRepository::new(data.measurements)),
            alerts: Arc::new(MemoryAlertRepository::new(data.alerts)),
            alert_configurations: Arc::new(MemoryAlertConfigurationRepository::new(
                data.alert_configurations,
            )),
            users: Arc::new(MemoryUserRepository::new(data.users)),
            tokens: Arc::new(MemoryTokenRepository::new()),
            activity: Arc::new(MemoryActivityLogRepository::default()),
        }
    }

    /// PostgreSQL repositories sharing one pool.
    pub fn postgres(pool: Arc<PgPool>) -> Self {
        Self {
            backend: Backend::Postgres,
            stations: Arc::new(PgStationRepository::new(pool.clone())),
            measurements: Arc::new(PgMeasurementRepository::new(pool.clone())),
            alerts: Arc::new(PgAlertRepository::new(pool.clone())),
            alert_configurations: Arc::new(PgAlertConfigurationRepository::new(pool.clone())),
            users: Arc::new(PgUserRepository::new(pool.clone())),
            tokens: Arc::new(PgTokenRepository::new(pool.clone())),
            activity: Arc::new(PgActivityLogRepository::new(pool.clone())),
            pool: Some(pool),
        }
    }

    /// Returns true when the backing store answers.
    pub async fn health_check(&self) -> bool {
        match &self.pool {
            Some(pool) => sqlx::query("SELECT 1")
                .execute(pool.as_ref())
                .await
                .is_ok(),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_parse() {
        assert_eq!(Backend::parse("memory"), Some(Backend::Memory));
        assert_eq!(Backend::parse(" PostgreSQL "), Some(Backend::Postgres));
        assert_eq!(Backend::parse("sqlite"), None);
    }

    #[tokio::test]
    async fn test_seeded_container_has_demo_rows() {
        let container = Container::in_memory(true);
        assert_eq!(container.stations.find_all().await.unwrap().len(), 3);
        assert_eq!(container.users.find_all().await.unwrap().len(), 3);
        assert!(container.health_check().await);
    }

    #[tokio::test]
    async fn test_empty_container() {
        let container = Container::in_memory(false);
        assert!(container.stations.find_all().await.unwrap().is_empty());
        assert!(
            container
                .measurements
                .find_latest(None, 10)
                .await
                .unwrap()
                .is_empty()
        );
    }
}
