//! Pagination, sorting and station filtering primitives.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::entities::{Station, StationStatus};
use crate::error::AppError;

/// Largest page size a client may request.
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Columns a station page can be sorted by.
pub const STATION_SORT_FIELDS: &[&str] = &[
    "id",
    "name",
    "code",
    "location",
    "status",
    "latitude",
    "longitude",
    "current_level",
    "threshold",
    "last_measurement",
    "created_at",
    "updated_at",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn parse(s: &str) -> Result<Self, AppError> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(AppError::bad_request(
                "El orden debe ser \"asc\" o \"desc\"",
                json!({ "sort_order": s }),
            )),
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Requested page, 1-indexed.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
    pub sort_by: Option<String>,
    pub sort_order: SortOrder,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 10,
            sort_by: None,
            sort_order: SortOrder::Asc,
        }
    }
}

impl PageRequest {
    pub fn offset(&self) -> usize {
        (self.page.saturating_sub(1) as usize) * self.limit as usize
    }

    /// Checks page bounds and the sort column for a station listing.
    pub fn validate_for_stations(&self) -> Result<(), AppError> {
        if self.page < 1 {
            return Err(AppError::bad_request(
                "El número de página debe ser mayor a 0",
                json!({ "page": self.page }),
            ));
        }
        if self.limit < 1 {
            return Err(AppError::bad_request(
                "El límite debe ser mayor a 0",
                json!({ "limit": self.limit }),
            ));
        }
        if self.limit > MAX_PAGE_LIMIT {
            return Err(AppError::bad_request(
                "El límite no puede ser mayor a 100",
                json!({ "limit": self.limit, "max": MAX_PAGE_LIMIT }),
            ));
        }
        if let Some(sort_by) = &self.sort_by
            && !STATION_SORT_FIELDS.contains(&sort_by.as_str())
        {
            return Err(AppError::bad_request(
                format!("Campo de ordenamiento inválido: {sort_by}"),
                json!({ "sort_by": sort_by, "allowed": STATION_SORT_FIELDS }),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageInfo {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PageInfo {
    pub fn new(page: u32, limit: u32, total: u64) -> Self {
        let total_pages = if limit == 0 {
            0
        } else {
            total.div_ceil(limit as u64) as u32
        };

        Self {
            page,
            limit,
            total,
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub pagination: PageInfo,
}

/// Inclusive numeric bounds. Either side may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl Range {
    pub fn contains(&self, value: f64) -> bool {
        self.min.is_none_or(|min| value >= min) && self.max.is_none_or(|max| value <= max)
    }

    fn inverted(&self) -> bool {
        matches!((self.min, self.max), (Some(min), Some(max)) if min > max)
    }
}

fn check_bounds(
    range: &Option<Range>,
    ok: impl Fn(f64) -> bool,
    min_msg: &str,
    max_msg: &str,
    order_msg: &str,
) -> Result<(), AppError> {
    let Some(range) = range else {
        return Ok(());
    };
    if range.min.is_some_and(|v| !ok(v)) {
        return Err(AppError::bad_request(min_msg, json!({ "min": range.min })));
    }
    if range.max.is_some_and(|v| !ok(v)) {
        return Err(AppError::bad_request(max_msg, json!({ "max": range.max })));
    }
    if range.inverted() {
        return Err(AppError::bad_request(
            order_msg,
            json!({ "min": range.min, "max": range.max }),
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StationFilter {
    pub name: Option<String>,
    pub code: Option<String>,
    pub location: Option<String>,
    pub status: Option<StationStatus>,
    pub latitude: Option<Range>,
    pub longitude: Option<Range>,
    pub threshold: Option<Range>,
    pub current_level: Option<Range>,
}

fn contains_ci(haystack: &str, needle: &Option<String>) -> bool {
    needle
        .as_deref()
        .is_none_or(|n| haystack.to_lowercase().contains(&n.to_lowercase()))
}

impl StationFilter {
    /// Validates coordinate and level bounds.
    pub fn validate(&self) -> Result<(), AppError> {
        check_bounds(
            &self.latitude,
            |v| (-90.0..=90.0).contains(&v),
            "Latitud mínima debe estar entre -90 y 90",
            "Latitud máxima debe estar entre -90 y 90",
            "Latitud mínima no puede ser mayor que la máxima",
        )?;
        check_bounds(
            &self.longitude,
            |v| (-180.0..=180.0).contains(&v),
            "Longitud mínima debe estar entre -180 y 180",
            "Longitud máxima debe estar entre -180 y 180",
            "Longitud mínima no puede ser mayor que la máxima",
        )?;
        check_bounds(
            &self.threshold,
            |v| v >= 0.0,
            "Umbral mínimo debe ser positivo",
            "Umbral máximo debe ser positivo",
            "Umbral mínimo no puede ser mayor que el máximo",
        )?;
        check_bounds(
            &self.current_level,
            |v| v >= 0.0,
            "Nivel mínimo debe ser positivo",
            "Nivel máximo debe ser positivo",
            "Nivel mínimo no puede ser mayor que el máximo",
        )
    }

    pub fn matches(&self, s: &Station) -> bool {
        contains_ci(&s.name, &self.name)
            && contains_ci(&s.code, &self.code)
            && contains_ci(&s.location, &self.location)
            && self.status.is_none_or(|st| s.status == st)
            && self.latitude.is_none_or(|r| r.contains(s.latitude))
            && self.longitude.is_none_or(|r| r.contains(s.longitude))
            && self.threshold.is_none_or(|r| r.contains(s.threshold))
            && self.current_level.is_none_or(|r| r.contains(s.current_level))
    }
}

/// Sorts stations in place by a whitelisted column.
///
/// Unknown columns fall back to `id`.
pub fn sort_stations(stations: &mut [Station], sort_by: Option<&str>, order: SortOrder) {
    use std::cmp::Ordering;

    let cmp_f64 = |a: f64, b: f64| a.partial_cmp(&b).unwrap_or(Ordering::Equal);

    stations.sort_by(|a, b| {
        let ord = match sort_by.unwrap_or("id") {
            "name" => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            "code" => a.code.cmp(&b.code),
            "location" => a.location.to_lowercase().cmp(&b.location.to_lowercase()),
            "status" => a.status.as_str().cmp(b.status.as_str()),
            "latitude" => cmp_f64(a.latitude, b.latitude),
            "longitude" => cmp_f64(a.longitude, b.longitude),
            "current_level" => cmp_f64(a.current_level, b.current_level),
            "threshold" => cmp_f64(a.threshold, b.threshold),
            "last_measurement" => a.last_measurement.cmp(&b.last_measurement),
            "created_at" => a.created_at.cmp(&b.created_at),
            "updated_at" => a.updated_at.cmp(&b.updated_at),
            _ => a.id.cmp(&b.id),
        };
        match order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    });
}
