//! Fixed demo data set for the in-memory backend.
//!
//! Three stations on the Río Claro, one account per role and a day of hourly
//! water-level readings per station. Values follow a fixed curve so the data
//! set is identical on every start.
//!
//! | user          | password        | role          |
//! |---------------|-----------------|---------------|
//! | `admin`       | `admin123`      | Administrador |
//! | `tecnico`     | `tecnico123`    | Técnico       |
//! | `observador`  | `observador123` | Observador    |

use chrono::{DateTime, Duration, DurationRound, Utc};

use super::user::StoredUser;
use crate::domain::entities::{
    Alert, AlertConfiguration, AlertThreshold, Measurement, Quality, Role, Severity, Station,
    StationStatus, ThresholdLevel, User, WATER_LEVEL,
};
use crate::utils::secrets::hash_password;

/// Readings generated per station.
pub const READINGS_PER_STATION: usize = 24;

struct StationSeed {
    name: &'static str,
    code: &'static str,
    location: &'static str,
    status: StationStatus,
    latitude: f64,
    longitude: f64,
    threshold: f64,
    base_level: f64,
    /// (warning, critical, emergency) upper bounds.
    bands: (f64, f64, f64),
}

const STATIONS: [StationSeed; 3] = [
    StationSeed {
        name: "Estación Río Claro Norte",
        code: "RCN-001",
        location: "Pucón Norte, Región de La Araucanía",
        status: StationStatus::Active,
        latitude: -39.290745,
        longitude: -71.931994,
        threshold: 3.0,
        base_level: 2.3,
        bands: (2.8, 3.0, 4.0),
    },
    StationSeed {
        name: "Estación Río Claro Centro",
        code: "RCC-002",
        location: "Pucón Centro, Región de La Araucanía",
        status: StationStatus::Active,
        latitude: -39.283331,
        longitude: -71.938868,
        threshold: 2.5,
        base_level: 1.8,
        bands: (2.2, 2.5, 3.5),
    },
    StationSeed {
        name: "Estación Río Claro Sur",
        code: "RCS-003",
        location: "Pucón Sur, Región de La Araucanía",
        status: StationStatus::Maintenance,
        latitude: -39.281843,
        longitude: -71.940563,
        threshold: 3.5,
        base_level: 2.9,
        bands: (3.2, 3.5, 4.5),
    },
];

/// Demo rows for every in-memory repository.
#[derive(Default)]
pub struct DemoData {
    pub stations: Vec<Station>,
    pub measurements: Vec<Measurement>,
    pub alerts: Vec<Alert>,
    pub alert_configurations: Vec<AlertConfiguration>,
    pub users: Vec<StoredUser>,
}

fn level_at(base: f64, hour: usize) -> f64 {
    let raw = base + (hour as f64 * 0.5).sin() * 0.4;
    (raw * 100.0).round() / 100.0
}

fn threshold(id: i64, level: ThresholdLevel, max: f64, at: DateTime<Utc>) -> AlertThreshold {
    AlertThreshold {
        id,
        level,
        min_value: None,
        max_value: Some(max),
        tolerance: Some(0.0),
        persistence_time: Some(0),
        is_active: true,
        created_at: at,
        updated_at: at,
    }
}

fn user(
    id: i64,
    username: &str,
    first_name: &str,
    last_name: &str,
    role: Role,
    stations: Vec<i64>,
    at: DateTime<Utc>,
) -> StoredUser {
    StoredUser {
        user: User {
            id,
            username: username.to_string(),
            email: format!("{username}@rioclaro.gov.co"),
            first_name: Some(first_name.to_string()),
            last_name: Some(last_name.to_string()),
            role,
            is_staff: role != Role::Observador,
            is_superuser: role == Role::Administrador,
            assigned_stations: stations,
            created_at: at,
            updated_at: at,
        },
        password_hash: hash_password(&format!("{username}123")),
    }
}

/// Builds the demo data set relative to the current hour.
pub fn demo_data() -> DemoData {
    let now = Utc::now();
    let hour = now.duration_trunc(Duration::hours(1)).unwrap_or(now);
    let created = hour - Duration::days(30);

    let mut stations = Vec::new();
    let mut measurements = Vec::new();
    let mut alert_configurations = Vec::new();

    for (index, seed) in STATIONS.iter().enumerate() {
        let station_id = index as i64 + 1;

        for h in 0..READINGS_PER_STATION {
            let value = level_at(seed.base_level, h);
            measurements.push(Measurement {
                id: measurements.len() as i64 + 1,
                station_id,
                station_name: Some(seed.name.to_string()),
                variable_type: WATER_LEVEL.to_string(),
                value,
                unit: "m".to_string(),
                timestamp: hour - Duration::hours((READINGS_PER_STATION - 1 - h) as i64),
                is_critical: value >= seed.threshold,
                quality: Some(Quality::Good),
            });
        }

        let latest = level_at(seed.base_level, READINGS_PER_STATION - 1);
        stations.push(Station {
            id: station_id,
            name: seed.name.to_string(),
            code: seed.code.to_string(),
            location: seed.location.to_string(),
            status: seed.status,
            latitude: seed.latitude,
            longitude: seed.longitude,
            current_level: latest,
            threshold: seed.threshold,
            last_measurement: Some(hour),
            created_at: created,
            updated_at: hour,
        });

        let (warning, critical, emergency) = seed.bands;
        let first_threshold = station_id * 3 - 2;
        alert_configurations.push(AlertConfiguration {
            id: station_id,
            station_id,
            station_name: Some(seed.name.to_string()),
            sensor_type: WATER_LEVEL.to_string(),
            sensor_unit: "m".to_string(),
            is_active: true,
            thresholds: vec![
                threshold(first_threshold, ThresholdLevel::Warning, warning, created),
                threshold(first_threshold + 1, ThresholdLevel::Critical, critical, created),
                threshold(first_threshold + 2, ThresholdLevel::Emergency, emergency, created),
            ],
            created_at: created,
            updated_at: created,
        });
    }

    let alerts = vec![
        Alert {
            id: 1,
            station_id: 3,
            station_name: Some(STATIONS[2].name.to_string()),
            variable_type: WATER_LEVEL.to_string(),
            threshold_value: 3.2,
            current_value: 3.3,
            alert_type: ThresholdLevel::Warning.as_str().to_string(),
            message: format!(
                "{}: water_level 3.3 supera el umbral warning de 3.2 m",
                STATIONS[2].name
            ),
            severity: Severity::Low,
            is_active: true,
            created_at: hour - Duration::hours(2),
            resolved_at: None,
        },
        Alert {
            id: 2,
            station_id: 1,
            station_name: Some(STATIONS[0].name.to_string()),
            variable_type: WATER_LEVEL.to_string(),
            threshold_value: 2.8,
            current_value: 2.9,
            alert_type: ThresholdLevel::Warning.as_str().to_string(),
            message: format!(
                "{}: water_level 2.9 supera el umbral warning de 2.8 m",
                STATIONS[0].name
            ),
            severity: Severity::Low,
            is_active: false,
            created_at: hour - Duration::days(1),
            resolved_at: Some(hour - Duration::hours(20)),
        },
    ];

    let users = vec![
        user(1, "admin", "Administrador", "Sistema", Role::Administrador, vec![1, 2, 3], created),
        user(2, "tecnico", "Juan", "Técnico", Role::Tecnico, vec![1, 2], created),
        user(3, "observador", "María", "Observadora", Role::Observador, vec![1], created),
    ];

    DemoData {
        stations,
        measurements,
        alerts,
        alert_configurations,
        users,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::secrets::verify_password;

    #[test]
    fn test_demo_data_shape() {
        let data = demo_data();

        assert_eq!(data.stations.len(), 3);
        assert_eq!(data.measurements.len(), 3 * READINGS_PER_STATION);
        assert_eq!(data.alert_configurations.len(), 3);
        assert_eq!(data.users.len(), 3);
        assert_eq!(data.stations[0].code, "RCN-001");
    }

    #[test]
    fn test_demo_data_is_deterministic() {
        let a = demo_data();
        let b = demo_data();
        let values = |d: &DemoData| d.measurements.iter().map(|m| m.value).collect::<Vec<_>>();
        assert_eq!(values(&a), values(&b));
    }

    #[test]
    fn test_station_level_matches_latest_reading() {
        let data = demo_data();
        for station in &data.stations {
            let latest = data
                .measurements
                .iter()
                .filter(|m| m.station_id == station.id)
                .max_by_key(|m| m.timestamp)
                .unwrap();
            assert_eq!(station.current_level, latest.value);
            assert_eq!(station.last_measurement, Some(latest.timestamp));
        }
    }

    #[test]
    fn test_demo_passwords() {
        let data = demo_data();
        let admin = &data.users[0];
        assert_eq!(admin.user.role, Role::Administrador);
        assert!(verify_password("admin123", &admin.password_hash));
        assert!(!verify_password("admin", &admin.password_hash));
    }
}
