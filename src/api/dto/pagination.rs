//! Pagination, sorting and date query parameters.

use serde::Deserialize;
use serde_with::{DisplayFromStr, serde_as};

use crate::domain::pagination::{PageRequest, SortOrder};
use crate::error::AppError;

/// Pagination query parameters.
///
/// Uses `serde_with` to parse page numbers from query strings as integers.
#[serde_as]
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub page: Option<u32>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub limit: Option<u32>,

    #[serde(default)]
    pub sort_by: Option<String>,

    #[serde(default)]
    pub sort_order: Option<String>,
}

impl PaginationParams {
    /// Converts the query into a [`PageRequest`].
    ///
    /// # Defaults
    ///
    /// - `page`: 1
    /// - `limit`: 10
    /// - `sort_order`: `asc`
    ///
    /// Range checks happen in the service; only the sort order is parsed here.
    pub fn to_page_request(&self) -> Result<PageRequest, AppError> {
        let defaults = PageRequest::default();
        let sort_order = match self.sort_order.as_deref() {
            Some(order) => SortOrder::parse(order)?,
            None => defaults.sort_order,
        };

        Ok(PageRequest {
            page: self.page.unwrap_or(defaults.page),
            limit: self.limit.unwrap_or(defaults.limit),
            sort_by: self.sort_by.clone().filter(|s| !s.is_empty()),
            sort_order,
        })
    }
}

/// Splits a comma-separated query value into trimmed, non-empty items.
pub fn split_list(value: Option<&str>) -> Vec<&str> {
    value
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn parse_datetime(s: &str, end_of_day: bool) -> Result<chrono::DateTime<chrono::Utc>, String> {
    use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| format!("invalid date '{s}', expected RFC 3339 or YYYY-MM-DD"))?;
    let time = if end_of_day {
        NaiveTime::from_hms_milli_opt(23, 59, 59, 999)
    } else {
        NaiveTime::from_hms_opt(0, 0, 0)
    }
    .ok_or_else(|| "invalid time of day".to_string())?;

    Ok(date.and_time(time).and_utc())
}

/// Optional RFC 3339 datetime or bare date, read as the start of that day.
pub mod optional_date_start {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let opt: Option<String> = Option::deserialize(deserializer)?;
        match opt.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => super::parse_datetime(s, false)
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}

/// Optional RFC 3339 datetime or bare date, read as the end of that day.
pub mod optional_date_end {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let opt: Option<String> = Option::deserialize(deserializer)?;
        match opt.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => super::parse_datetime(s, true)
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    #[derive(Debug, Deserialize)]
    struct DateParams {
        #[serde(default, with = "optional_date_start")]
        from: Option<DateTime<Utc>>,
        #[serde(default, with = "optional_date_end")]
        to: Option<DateTime<Utc>>,
    }

    fn params(page: Option<u32>, limit: Option<u32>) -> PaginationParams {
        PaginationParams {
            page,
            limit,
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults() {
        let request = params(None, None).to_page_request().unwrap();
        assert_eq!(request.page, 1);
        assert_eq!(request.limit, 10);
        assert_eq!(request.sort_order, SortOrder::Asc);
        assert!(request.sort_by.is_none());
    }

    #[test]
    fn test_custom_page_and_limit() {
        let request = params(Some(3), Some(50)).to_page_request().unwrap();
        assert_eq!(request.page, 3);
        assert_eq!(request.limit, 50);
        assert_eq!(request.offset(), 100);
    }

    #[test]
    fn test_sort_order_parsed() {
        let p = PaginationParams {
            sort_by: Some("name".into()),
            sort_order: Some("DESC".into()),
            ..Default::default()
        };
        let request = p.to_page_request().unwrap();
        assert_eq!(request.sort_order, SortOrder::Desc);
        assert_eq!(request.sort_by.as_deref(), Some("name"));
    }

    #[test]
    fn test_invalid_sort_order_is_error() {
        let p = PaginationParams {
            sort_order: Some("sideways".into()),
            ..Default::default()
        };
        assert!(p.to_page_request().is_err());
    }

    #[test]
    fn test_split_list() {
        assert_eq!(split_list(Some("a, b,,c ")), vec!["a", "b", "c"]);
        assert!(split_list(None).is_empty());
    }

    #[test]
    fn test_rfc3339_dates() {
        let json = r#"{"from": "2026-01-01T00:00:00Z", "to": null}"#;
        let p: DateParams = serde_json::from_str(json).unwrap();
        assert!(p.from.is_some());
        assert!(p.to.is_none());
    }

    #[test]
    fn test_bare_dates_cover_whole_days() {
        let json = r#"{"from": "2026-03-01", "to": "2026-03-01"}"#;
        let p: DateParams = serde_json::from_str(json).unwrap();
        assert_eq!(p.from.unwrap().to_rfc3339(), "2026-03-01T00:00:00+00:00");
        assert_eq!(p.to.unwrap().to_rfc3339(), "2026-03-01T23:59:59.999+00:00");
    }

    #[test]
    fn test_dates_absent_or_blank() {
        let p: DateParams = serde_json::from_str(r#"{"from": ""}"#).unwrap();
        assert!(p.from.is_none());
        assert!(p.to.is_none());
    }

    #[test]
    fn test_invalid_date_is_error() {
        let json = r#"{"from": "not-a-date"}"#;
        assert!(serde_json::from_str::<DateParams>(json).is_err());
    }
}
