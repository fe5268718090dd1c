//! PostgreSQL implementation of station repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use std::sync::Arc;

use crate::domain::entities::{NewStation, Station, StationPatch, StationStatus};
use crate::domain::pagination::{Page, PageInfo, PageRequest, STATION_SORT_FIELDS, StationFilter};
use crate::domain::repositories::StationRepository;
use crate::error::AppError;

const STATION_COLUMNS: &str = "id, name, code, location, status, latitude, longitude, \
     current_level, threshold, last_measurement, created_at, updated_at";

#[derive(FromRow)]
struct StationRow {
    id: i64,
    name: String,
    code: String,
    location: String,
    status: String,
    latitude: f64,
    longitude: f64,
    current_level: f64,
    threshold: f64,
    last_measurement: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<StationRow> for Station {
    type Error = AppError;

    fn try_from(row: StationRow) -> Result<Self, Self::Error> {
        let status = row.status.parse::<StationStatus>().map_err(|e| {
            AppError::internal("Estado de estación corrupto", json!({ "reason": e }))
        })?;

        Ok(Station {
            id: row.id,
            name: row.name,
            code: row.code,
            location: row.location,
            status,
            latitude: row.latitude,
            longitude: row.longitude,
            current_level: row.current_level,
            threshold: row.threshold,
            last_measurement: row.last_measurement,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn push_range(
    qb: &mut QueryBuilder<'_, Postgres>,
    column: &str,
    range: Option<crate::domain::pagination::Range>,
) {
    let Some(range) = range else { return };
    if let Some(min) = range.min {
        qb.push(format!(" AND {column} >= ")).push_bind(min);
    }
    if let Some(max) = range.max {
        qb.push(format!(" AND {column} <= ")).push_bind(max);
    }
}

fn push_contains(qb: &mut QueryBuilder<'_, Postgres>, column: &str, needle: Option<String>) {
    if let Some(needle) = needle.filter(|n| !n.is_empty()) {
        qb.push(format!(" AND {column} ILIKE '%' || "))
            .push_bind(needle)
            .push(" || '%'");
    }
}

/// Appends the `WHERE` clause for a station filter.
fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: StationFilter) {
    qb.push(" WHERE TRUE");
    push_contains(qb, "name", filter.name);
    push_contains(qb, "code", filter.code);
    push_contains(qb, "location", filter.location);
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status.as_str());
    }
    push_range(qb, "latitude", filter.latitude);
    push_range(qb, "longitude", filter.longitude);
    push_range(qb, "threshold", filter.threshold);
    push_range(qb, "current_level", filter.current_level);
}

/// PostgreSQL repository for monitoring stations.
pub struct PgStationRepository {
    pool: Arc<PgPool>,
}

impl PgStationRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StationRepository for PgStationRepository {
    async fn find_all(&self) -> Result<Vec<Station>, AppError> {
        let rows = sqlx::query_as::<_, StationRow>(&format!(
            "SELECT {STATION_COLUMNS} FROM stations ORDER BY name"
        ))
        .fetch_all(self.pool.as_ref())
        .await?;

        rows.into_iter().map(Station::try_from).collect()
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Station>, AppError> {
        let row = sqlx::query_as::<_, StationRow>(&format!(
            "SELECT {STATION_COLUMNS} FROM stations WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        row.map(Station::try_from).transpose()
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Station>, AppError> {
        let row = sqlx::query_as::<_, StationRow>(&format!(
            "SELECT {STATION_COLUMNS} FROM stations WHERE UPPER(code) = UPPER($1)"
        ))
        .bind(code)
        .fetch_optional(self.pool.as_ref())
        .await?;

        row.map(Station::try_from).transpose()
    }

    async fn find_page(
        &self,
        page: PageRequest,
        filter: StationFilter,
    ) -> Result<Page<Station>, AppError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM stations");
        push_filter(&mut count, filter.clone());
        let total: i64 = count
            .build_query_scalar::<i64>()
            .fetch_one(self.pool.as_ref())
            .await?;

        // Only whitelisted column names are interpolated.
        let sort_column = page
            .sort_by
            .as_deref()
            .filter(|c| STATION_SORT_FIELDS.contains(c))
            .unwrap_or("id");

        let mut query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {STATION_COLUMNS} FROM stations"
        ));
        push_filter(&mut query, filter);
        query
            .push(format!(
                " ORDER BY {sort_column} {}, id ASC LIMIT ",
                page.sort_order.as_sql()
            ))
            .push_bind(page.limit as i64)
            .push(" OFFSET ")
            .push_bind(page.offset() as i64);

        let rows = query
            .build_query_as::<StationRow>()
            .fetch_all(self.pool.as_ref())
            .await?;

        let data = rows
            .into_iter()
            .map(Station::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page {
            data,
            pagination: PageInfo::new(page.page, page.limit, total as u64),
        })
    }

    async fn create(&self, station: NewStation) -> Result<Station, AppError> {
        let row = sqlx::query_as::<_, StationRow>(&format!(
            r#"
            INSERT INTO stations
                (name, code, location, status, latitude, longitude,
                 current_level, threshold, last_measurement)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {STATION_COLUMNS}
            "#
        ))
        .bind(station.name)
        .bind(station.code)
        .bind(station.location)
        .bind(station.status.as_str())
        .bind(station.latitude)
        .bind(station.longitude)
        .bind(station.current_level)
        .bind(station.threshold)
        .bind(station.last_measurement)
        .fetch_one(self.pool.as_ref())
        .await?;

        row.try_into()
    }

    async fn update(&self, id: i64, patch: StationPatch) -> Result<Option<Station>, AppError> {
        let row = sqlx::query_as::<_, StationRow>(&format!(
            r#"
            UPDATE stations SET
                name             = COALESCE($2, name),
                code             = COALESCE($3, code),
                location         = COALESCE($4, location),
                status           = COALESCE($5, status),
                latitude         = COALESCE($6, latitude),
                longitude        = COALESCE($7, longitude),
                current_level    = COALESCE($8, current_level),
                threshold        = COALESCE($9, threshold),
                last_measurement = COALESCE($10, last_measurement),
                updated_at       = NOW()
            WHERE id = $1
            RETURNING {STATION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(patch.name)
        .bind(patch.code)
        .bind(patch.location)
        .bind(patch.status.map(|s| s.as_str()))
        .bind(patch.latitude)
        .bind(patch.longitude)
        .bind(patch.current_level)
        .bind(patch.threshold)
        .bind(patch.last_measurement)
        .fetch_optional(self.pool.as_ref())
        .await?;

        row.map(Station::try_from).transpose()
    }

    async fn record_level(
        &self,
        id: i64,
        level: f64,
        timestamp: DateTime<Utc>,
    ) -> Result<Option<Station>, AppError> {
        let row = sqlx::query_as::<_, StationRow>(&format!(
            r#"
            UPDATE stations SET
                current_level    = $2,
                last_measurement = $3,
                updated_at       = NOW()
            WHERE id = $1
              AND (last_measurement IS NULL OR last_measurement <= $3)
            RETURNING {STATION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(level)
        .bind(timestamp)
        .fetch_optional(self.pool.as_ref())
        .await?;

        match row {
            Some(row) => row.try_into().map(Some),
            // Older reading or unknown station.
            None => self.find_by_id(id).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM stations WHERE id = $1")
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
