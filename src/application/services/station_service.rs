//! Station management service.

use std::str::FromStr;
use std::sync::Arc;

use serde_json::json;

use crate::application::services::activity_service::{attributed, log_activity};
use crate::domain::entities::{
    ActivityType, NewActivityLog, NewStation, Station, StationPatch, StationStatus, User,
};
use crate::domain::pagination::{Page, PageRequest, StationFilter};
use crate::domain::repositories::{ActivityLogRepository, StationRepository};
use crate::error::AppError;

/// Station IDs that cannot be deleted unless configured otherwise.
pub const DEFAULT_CRITICAL_STATION_IDS: [i64; 2] = [1, 2];

/// Raw station input as received from clients.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StationInput {
    pub name: String,
    pub code: String,
    pub location: String,
    pub status: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub current_level: Option<f64>,
    pub threshold: f64,
}

/// Raw partial station update as received from clients.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StationUpdate {
    pub name: Option<String>,
    pub code: Option<String>,
    pub location: Option<String>,
    pub status: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub current_level: Option<f64>,
    pub threshold: Option<f64>,
}

/// Service for listing, creating, updating and deleting stations.
///
/// Codes are stored trimmed and uppercased, and uniqueness is checked on that
/// normalized form. Every mutation writes an activity log entry.
pub struct StationService<S, A>
where
    S: StationRepository + ?Sized,
    A: ActivityLogRepository + ?Sized,
{
    stations: Arc<S>,
    activity: Arc<A>,
    critical_ids: Vec<i64>,
}

impl<S, A> StationService<S, A>
where
    S: StationRepository + ?Sized,
    A: ActivityLogRepository + ?Sized,
{
    pub fn new(stations: Arc<S>, activity: Arc<A>, critical_ids: Vec<i64>) -> Self {
        Self {
            stations,
            activity,
            critical_ids,
        }
    }

    /// Lists all stations ordered by name.
    pub async fn list_stations(&self) -> Result<Vec<Station>, AppError> {
        self.stations.find_all().await
    }

    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for non-positive IDs and
    /// [`AppError::NotFound`] when the station does not exist.
    pub async fn get_station(&self, id: i64) -> Result<Station, AppError> {
        validate_id(id)?;
        self.stations
            .find_by_id(id)
            .await?
            .ok_or_else(|| station_not_found(id))
    }

    pub async fn list_stations_paginated(
        &self,
        page: PageRequest,
        filter: StationFilter,
    ) -> Result<Page<Station>, AppError> {
        page.validate_for_stations()?;
        filter.validate()?;
        self.stations.find_page(page, filter).await
    }

    /// Creates a station after validating every field.
    ///
    /// # Errors
    ///
    /// - [`AppError::Validation`] for missing or out-of-range fields
    /// - [`AppError::Conflict`] when the normalized code already exists
    pub async fn create_station(
        &self,
        input: StationInput,
        actor: Option<&User>,
    ) -> Result<Station, AppError> {
        let name = validate_name(&input.name, "El nombre de la estación es requerido")?;
        let code = validate_code(&input.code, "El código de la estación es requerido")?;
        let location = validate_location(&input.location, "La ubicación de la estación es requerida")?;
        let status = match input.status.as_deref() {
            Some(s) => parse_status(s)?,
            None => StationStatus::Active,
        };
        validate_latitude(input.latitude)?;
        validate_longitude(input.longitude)?;
        validate_threshold(input.threshold)?;
        let current_level = input.current_level.unwrap_or(0.0);
        validate_level(current_level)?;

        if self.stations.find_by_code(&code).await?.is_some() {
            return Err(duplicate_code(&code));
        }

        let station = self
            .stations
            .create(NewStation {
                name,
                code,
                location,
                status,
                latitude: input.latitude,
                longitude: input.longitude,
                current_level,
                threshold: input.threshold,
                last_measurement: None,
            })
            .await?;

        tracing::info!(station_id = station.id, code = %station.code, "Station created");

        let entry = NewActivityLog::new(
            ActivityType::StationCreated,
            "Estación creada",
            format!("Se creó la estación {} ({})", station.name, station.code),
        )
        .with_station(station.id, station.name.clone());
        log_activity(self.activity.as_ref(), attributed(entry, actor)).await;

        Ok(station)
    }

    /// Applies a partial update to an existing station.
    ///
    /// # Errors
    ///
    /// - [`AppError::NotFound`] when the station does not exist
    /// - [`AppError::Validation`] when no field is provided or a field is invalid
    /// - [`AppError::Conflict`] when the new code belongs to another station
    pub async fn update_station(
        &self,
        id: i64,
        update: StationUpdate,
        actor: Option<&User>,
    ) -> Result<Station, AppError> {
        validate_id(id)?;
        let existing = self
            .stations
            .find_by_id(id)
            .await?
            .ok_or_else(|| station_not_found(id))?;

        let patch = self.build_patch(&existing, update).await?;

        let station = self
            .stations
            .update(id, patch.clone())
            .await?
            .ok_or_else(|| station_not_found(id))?;

        let activity_type = if patch.threshold.is_some() {
            ActivityType::ThresholdUpdated
        } else {
            ActivityType::StationUpdated
        };
        let entry = NewActivityLog::new(
            activity_type,
            "Estación actualizada",
            format!("Se actualizó la estación {}", station.name),
        )
        .with_station(station.id, station.name.clone());
        log_activity(self.activity.as_ref(), attributed(entry, actor)).await;

        Ok(station)
    }

    async fn build_patch(
        &self,
        existing: &Station,
        update: StationUpdate,
    ) -> Result<StationPatch, AppError> {
        let mut patch = StationPatch::default();

        if let Some(name) = &update.name {
            patch.name = Some(validate_name(
                name,
                "El nombre de la estación no puede estar vacío",
            )?);
        }
        if let Some(code) = &update.code {
            let code = validate_code(code, "El código de la estación no puede estar vacío")?;
            if code != existing.code
                && let Some(other) = self.stations.find_by_code(&code).await?
                && other.id != existing.id
            {
                return Err(duplicate_code(&code));
            }
            patch.code = Some(code);
        }
        if let Some(location) = &update.location {
            patch.location = Some(validate_location(
                location,
                "La ubicación de la estación no puede estar vacía",
            )?);
        }
        if let Some(status) = &update.status {
            patch.status = Some(parse_status(status)?);
        }
        if let Some(latitude) = update.latitude {
            validate_latitude(latitude)?;
            patch.latitude = Some(latitude);
        }
        if let Some(longitude) = update.longitude {
            validate_longitude(longitude)?;
            patch.longitude = Some(longitude);
        }
        if let Some(threshold) = update.threshold {
            validate_threshold(threshold)?;
            patch.threshold = Some(threshold);
        }
        if let Some(level) = update.current_level {
            validate_level(level)?;
            patch.current_level = Some(level);
        }

        if patch.is_empty() {
            return Err(AppError::bad_request(
                "Debe proporcionar al menos un campo para actualizar",
                json!({}),
            ));
        }

        Ok(patch)
    }

    /// Deletes a station unless it is one of the critical stations.
    ///
    /// # Errors
    ///
    /// - [`AppError::Validation`] for non-positive IDs
    /// - [`AppError::NotFound`] when the station does not exist
    /// - [`AppError::BusinessRule`] for critical stations
    pub async fn delete_station(&self, id: i64, actor: Option<&User>) -> Result<(), AppError> {
        validate_id(id)?;
        let station = self
            .stations
            .find_by_id(id)
            .await?
            .ok_or_else(|| station_not_found(id))?;

        if self.critical_ids.contains(&id) {
            tracing::warn!(station_id = id, "Refused to delete critical station");
            return Err(AppError::business_rule(
                "No se puede eliminar una estación crítica del sistema",
                json!({ "id": id }),
            ));
        }

        if !self.stations.delete(id).await? {
            return Err(AppError::internal(
                "Error al eliminar la estación",
                json!({ "id": id }),
            ));
        }

        tracing::info!(station_id = id, "Station deleted");

        let entry = NewActivityLog::new(
            ActivityType::StationDeleted,
            "Estación eliminada",
            format!("Se eliminó la estación {} ({})", station.name, station.code),
        )
        .with_station(station.id, station.name);
        log_activity(self.activity.as_ref(), attributed(entry, actor)).await;

        Ok(())
    }
}

fn station_not_found(id: i64) -> AppError {
    AppError::not_found(
        format!("No se encontró la estación con ID: {id}"),
        json!({ "id": id }),
    )
}

fn duplicate_code(code: &str) -> AppError {
    AppError::conflict(
        format!("Ya existe una estación con el código: {code}"),
        json!({ "code": code }),
    )
}

fn validate_id(id: i64) -> Result<(), AppError> {
    if id <= 0 {
        return Err(AppError::bad_request(
            "ID de estación inválido",
            json!({ "id": id }),
        ));
    }
    Ok(())
}

fn validate_name(name: &str, empty_msg: &str) -> Result<String, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::bad_request(empty_msg, json!({ "field": "name" })));
    }
    if name.chars().count() < 3 {
        return Err(AppError::bad_request(
            "El nombre de la estación debe tener al menos 3 caracteres",
            json!({ "field": "name" }),
        ));
    }
    Ok(name.to_string())
}

/// Trims and uppercases a station code, then checks length and charset.
fn validate_code(code: &str, empty_msg: &str) -> Result<String, AppError> {
    let code = code.trim().to_uppercase();
    if code.is_empty() {
        return Err(AppError::bad_request(empty_msg, json!({ "field": "code" })));
    }
    if code.chars().count() < 2 {
        return Err(AppError::bad_request(
            "El código de la estación debe tener al menos 2 caracteres",
            json!({ "field": "code" }),
        ));
    }
    if !code
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_' || c == '-')
    {
        return Err(AppError::bad_request(
            "El código solo puede contener letras, números, guiones y guiones bajos",
            json!({ "field": "code", "code": code }),
        ));
    }
    Ok(code)
}

fn validate_location(location: &str, empty_msg: &str) -> Result<String, AppError> {
    let location = location.trim();
    if location.is_empty() {
        return Err(AppError::bad_request(
            empty_msg,
            json!({ "field": "location" }),
        ));
    }
    Ok(location.to_string())
}

fn parse_status(status: &str) -> Result<StationStatus, AppError> {
    StationStatus::from_str(status.trim()).map_err(|_| {
        AppError::bad_request(
            "El estado de la estación debe ser: active, inactive o maintenance",
            json!({ "status": status }),
        )
    })
}

fn validate_latitude(latitude: f64) -> Result<(), AppError> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(AppError::bad_request(
            "La latitud debe estar entre -90 y 90 grados",
            json!({ "latitude": latitude }),
        ));
    }
    Ok(())
}

fn validate_longitude(longitude: f64) -> Result<(), AppError> {
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(AppError::bad_request(
            "La longitud debe estar entre -180 y 180 grados",
            json!({ "longitude": longitude }),
        ));
    }
    Ok(())
}

fn validate_threshold(threshold: f64) -> Result<(), AppError> {
    if !threshold.is_finite() || threshold <= 0.0 {
        return Err(AppError::bad_request(
            "El umbral debe ser un valor positivo",
            json!({ "threshold": threshold }),
        ));
    }
    Ok(())
}

fn validate_level(level: f64) -> Result<(), AppError> {
    if !level.is_finite() || level < 0.0 {
        return Err(AppError::bad_request(
            "El nivel actual no puede ser negativo",
            json!({ "current_level": level }),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{ActivityLog, ActivityStatus};
    use crate::domain::repositories::{MockActivityLogRepository, MockStationRepository};
    use chrono::Utc;

    fn station(id: i64, code: &str) -> Station {
        Station {
            id,
            name: "Río Claro Norte".to_string(),
            code: code.to_string(),
            location: "Pucón".to_string(),
            status: StationStatus::Active,
            latitude: -39.28,
            longitude: -71.95,
            current_level: 1.2,
            threshold: 3.0,
            last_measurement: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn input() -> StationInput {
        StationInput {
            name: "  Río Claro Sur ".to_string(),
            code: " rcs-003 ".to_string(),
            location: "Villarrica".to_string(),
            status: Some("active".to_string()),
            latitude: -39.3,
            longitude: -72.2,
            current_level: None,
            threshold: 2.5,
        }
    }

    fn activity_repo() -> MockActivityLogRepository {
        let mut repo = MockActivityLogRepository::new();
        repo.expect_create().returning(|e| {
            Ok(ActivityLog {
                id: 1,
                timestamp: e.timestamp,
                user_id: e.user_id,
                user_name: e.user_name,
                activity_type: e.activity_type,
                title: e.title,
                description: e.description,
                status: ActivityStatus::Success,
                station_id: e.station_id,
                station_name: e.station_name,
                ip_address: None,
                user_agent: None,
                metadata: None,
                created_at: Utc::now(),
            })
        });
        repo
    }

    fn service(
        stations: MockStationRepository,
    ) -> StationService<MockStationRepository, MockActivityLogRepository> {
        StationService::new(
            Arc::new(stations),
            Arc::new(activity_repo()),
            DEFAULT_CRITICAL_STATION_IDS.to_vec(),
        )
    }

    #[tokio::test]
    async fn test_create_station_normalizes_fields() {
        let mut repo = MockStationRepository::new();
        repo.expect_find_by_code()
            .withf(|code| code == "RCS-003")
            .times(1)
            .returning(|_| Ok(None));
        repo.expect_create()
            .withf(|s| s.name == "Río Claro Sur" && s.code == "RCS-003" && s.current_level == 0.0)
            .times(1)
            .returning(|s| {
                let mut created = station(3, &s.code);
                created.name = s.name;
                Ok(created)
            });

        let created = service(repo).create_station(input(), None).await.unwrap();
        assert_eq!(created.code, "RCS-003");
    }

    #[tokio::test]
    async fn test_create_station_duplicate_code() {
        let mut repo = MockStationRepository::new();
        repo.expect_find_by_code()
            .returning(|code| Ok(Some(station(1, code))));

        let err = service(repo).create_station(input(), None).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict { .. }));
        assert_eq!(err.to_string(), "Ya existe una estación con el código: RCS-003");
    }

    #[tokio::test]
    async fn test_create_station_field_rules() {
        let cases: Vec<(StationInput, &str)> = vec![
            (
                StationInput {
                    name: "  ".to_string(),
                    ..input()
                },
                "El nombre de la estación es requerido",
            ),
            (
                StationInput {
                    name: "Rí".to_string(),
                    ..input()
                },
                "El nombre de la estación debe tener al menos 3 caracteres",
            ),
            (
                StationInput {
                    code: "X".to_string(),
                    ..input()
                },
                "El código de la estación debe tener al menos 2 caracteres",
            ),
            (
                StationInput {
                    status: Some("broken".to_string()),
                    ..input()
                },
                "El estado de la estación debe ser: active, inactive o maintenance",
            ),
            (
                StationInput {
                    latitude: 91.0,
                    ..input()
                },
                "La latitud debe estar entre -90 y 90 grados",
            ),
            (
                StationInput {
                    longitude: -181.0,
                    ..input()
                },
                "La longitud debe estar entre -180 y 180 grados",
            ),
            (
                StationInput {
                    threshold: 0.0,
                    ..input()
                },
                "El umbral debe ser un valor positivo",
            ),
        ];

        for (bad, message) in cases {
            let repo = MockStationRepository::new();
            let err = service(repo).create_station(bad, None).await.unwrap_err();
            assert!(matches!(err, AppError::Validation { .. }));
            assert_eq!(err.to_string(), message);
        }
    }

    #[tokio::test]
    async fn test_update_station_requires_a_field() {
        let mut repo = MockStationRepository::new();
        repo.expect_find_by_id()
            .returning(|id| Ok(Some(station(id, "RCN-001"))));

        let err = service(repo)
            .update_station(4, StationUpdate::default(), None)
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Debe proporcionar al menos un campo para actualizar"
        );
    }

    #[tokio::test]
    async fn test_update_station_code_taken_by_other() {
        let mut repo = MockStationRepository::new();
        repo.expect_find_by_id()
            .returning(|id| Ok(Some(station(id, "RCN-001"))));
        repo.expect_find_by_code()
            .returning(|code| Ok(Some(station(9, code))));

        let update = StationUpdate {
            code: Some("rcc-002".to_string()),
            ..Default::default()
        };
        let err = service(repo).update_station(4, update, None).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_update_station_missing() {
        let mut repo = MockStationRepository::new();
        repo.expect_find_by_id().returning(|_| Ok(None));

        let update = StationUpdate {
            threshold: Some(4.0),
            ..Default::default()
        };
        let err = service(repo).update_station(44, update, None).await.unwrap_err();
        assert_eq!(err.to_string(), "No se encontró la estación con ID: 44");
    }

    #[tokio::test]
    async fn test_update_station_applies_patch() {
        let mut repo = MockStationRepository::new();
        repo.expect_find_by_id()
            .returning(|id| Ok(Some(station(id, "RCN-001"))));
        repo.expect_update()
            .withf(|_, p| p.threshold == Some(4.0) && p.name.is_none())
            .times(1)
            .returning(|id, p| {
                let mut s = station(id, "RCN-001");
                p.apply(&mut s);
                Ok(Some(s))
            });

        let update = StationUpdate {
            threshold: Some(4.0),
            ..Default::default()
        };
        let updated = service(repo).update_station(4, update, None).await.unwrap();
        assert_eq!(updated.threshold, 4.0);
    }

    #[tokio::test]
    async fn test_delete_critical_station_is_refused() {
        let mut repo = MockStationRepository::new();
        repo.expect_find_by_id()
            .returning(|id| Ok(Some(station(id, "RCN-001"))));
        repo.expect_delete().never();

        let err = service(repo).delete_station(1, None).await.unwrap_err();
        assert!(matches!(err, AppError::BusinessRule { .. }));
        assert_eq!(
            err.to_string(),
            "No se puede eliminar una estación crítica del sistema"
        );
    }

    #[tokio::test]
    async fn test_delete_station_validations() {
        let repo = MockStationRepository::new();
        let err = service(repo).delete_station(0, None).await.unwrap_err();
        assert_eq!(err.to_string(), "ID de estación inválido");

        let mut repo = MockStationRepository::new();
        repo.expect_find_by_id().returning(|_| Ok(None));
        let err = service(repo).delete_station(7, None).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_regular_station() {
        let mut repo = MockStationRepository::new();
        repo.expect_find_by_id()
            .returning(|id| Ok(Some(station(id, "RCS-003"))));
        repo.expect_delete().times(1).returning(|_| Ok(true));

        assert!(service(repo).delete_station(3, None).await.is_ok());
    }

    #[tokio::test]
    async fn test_paginated_validates_before_querying() {
        let mut repo = MockStationRepository::new();
        repo.expect_find_page().never();

        let page = PageRequest {
            limit: 500,
            ..Default::default()
        };
        let err = service(repo)
            .list_stations_paginated(page, StationFilter::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "El límite no puede ser mayor a 100");
    }
}
