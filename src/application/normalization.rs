//! Normalization of heterogeneous reading payloads into chart series.
//!
//! Each [`SourceType`] has an ordered list of candidate field names for the
//! timestamp, value, label and station of a point. The first candidate that is
//! present and non-empty wins. Values may be numbers or strings that start
//! with a number (`"2.35 m"` reads as `2.35`); anything else becomes `0`.
//!
//! In `json` mode keys are discovered in the order they appear in the payload.

use std::sync::LazyLock;

use chrono::Utc;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::error::AppError;

static LEADING_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Measurement,
    Station,
    Alert,
    Report,
    ApiV1,
    ApiV2,
    Csv,
    Json,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Measurement => "measurement",
            Self::Station => "station",
            Self::Alert => "alert",
            Self::Report => "report",
            Self::ApiV1 => "api_v1",
            Self::ApiV2 => "api_v2",
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }

    /// Parses a source type name.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for unknown names.
    pub fn parse(s: &str) -> Result<Self, AppError> {
        serde_json::from_value(Value::String(s.to_string())).map_err(|_| {
            AppError::bad_request(
                format!("Tipo de fuente de datos no soportado: {s}"),
                json!({ "source_type": s }),
            )
        })
    }

    /// Name recorded in the dataset metadata.
    fn source_label(&self) -> &'static str {
        match self {
            Self::Measurement => "measurements",
            Self::Station => "stations",
            Self::Alert => "alerts",
            Self::Report => "reports",
            Self::ApiV1 => "external_api_v1",
            Self::ApiV2 => "external_api_v2",
            Self::Csv => "csv_import",
            Self::Json => "json_import",
        }
    }
}

/// Field fallbacks for one source type.
struct FieldMap {
    timestamp: &'static [&'static str],
    value: &'static [&'static str],
    label: &'static [&'static str],
    default_label: &'static str,
    station: &'static [&'static str],
    default_station: Option<&'static str>,
    timestamp_defaults_to_now: bool,
}

const MEASUREMENT_FIELDS: FieldMap = FieldMap {
    timestamp: &["timestamp", "created_at", "date"],
    value: &["value", "water_level", "level"],
    label: &["station_name", "station"],
    default_label: "Sin estación",
    station: &["station_id", "id"],
    default_station: None,
    timestamp_defaults_to_now: false,
};

const STATION_FIELDS: FieldMap = FieldMap {
    timestamp: &["last_measurement", "updated_at"],
    value: &["current_level", "level", "value"],
    label: &["name", "station_name"],
    default_label: "Sin nombre",
    station: &["id", "station_id"],
    default_station: None,
    timestamp_defaults_to_now: true,
};

const ALERT_FIELDS: FieldMap = FieldMap {
    timestamp: &["created_at", "timestamp", "date"],
    value: &["level", "value", "threshold"],
    label: &["message", "description"],
    default_label: "Alerta",
    station: &["station_id", "id"],
    default_station: None,
    timestamp_defaults_to_now: false,
};

const REPORT_FIELDS: FieldMap = FieldMap {
    timestamp: &["date", "timestamp", "created_at"],
    value: &["average_level", "max_level", "value"],
    label: &["period", "type"],
    default_label: "Reporte",
    station: &["station_id"],
    default_station: Some("all"),
    timestamp_defaults_to_now: false,
};

const API_V1_FIELDS: FieldMap = FieldMap {
    timestamp: &["time", "date", "timestamp"],
    value: &["level", "measurement", "data"],
    label: &["location", "name"],
    default_label: "API V1",
    station: &["sensor_id", "id"],
    default_station: None,
    timestamp_defaults_to_now: false,
};

const API_V2_FIELDS: FieldMap = FieldMap {
    timestamp: &["datetime", "timestamp", "recorded_at"],
    value: &["water_height", "height", "level"],
    label: &["sensor_name", "device"],
    default_label: "API V2",
    station: &["device_id", "sensor_id"],
    default_station: None,
    timestamp_defaults_to_now: false,
};

const CSV_FIELDS: FieldMap = FieldMap {
    timestamp: &["fecha", "timestamp", "date", "time"],
    value: &["nivel", "level", "value", "medicion"],
    label: &["estacion", "station", "nombre"],
    default_label: "CSV",
    station: &["id", "station_id"],
    default_station: Some("csv"),
    timestamp_defaults_to_now: false,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub timestamp: Option<String>,
    pub value: f64,
    pub label: String,
    pub station: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataSetMetadata {
    #[serde(rename = "type")]
    pub kind: SourceType,
    pub source: &'static str,
    pub unit: &'static str,
    pub range: ValueRange,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartDataSet {
    pub data: Vec<ChartPoint>,
    pub metadata: DataSetMetadata,
}

/// Rendering hints for a dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartConfig {
    pub x_axis_key: &'static str,
    pub y_axis_key: &'static str,
    pub unit: &'static str,
    pub color: &'static str,
    pub stroke_width: u8,
    pub dot_radius: u8,
}

/// Mirrors JavaScript truthiness, which the upstream payloads rely on.
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn first_present<'a>(item: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| item.get(*k))
        .find(|v| is_present(v))
}

fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn as_number(value: Option<&Value>) -> f64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => LEADING_NUMBER
            .find(s.trim_start())
            .and_then(|m| m.as_str().parse::<f64>().ok()),
        _ => None,
    };
    parsed.filter(|f| f.is_finite()).unwrap_or(0.0)
}

fn range_of(points: &[ChartPoint]) -> ValueRange {
    if points.is_empty() {
        return ValueRange { min: 0.0, max: 0.0 };
    }
    points.iter().fold(
        ValueRange {
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        },
        |r, p| ValueRange {
            min: r.min.min(p.value),
            max: r.max.max(p.value),
        },
    )
}

fn map_point(item: &Map<String, Value>, fields: &FieldMap) -> ChartPoint {
    let timestamp = first_present(item, fields.timestamp)
        .map(as_text)
        .or_else(|| {
            fields
                .timestamp_defaults_to_now
                .then(|| Utc::now().to_rfc3339())
        });

    ChartPoint {
        timestamp,
        value: as_number(first_present(item, fields.value)),
        label: first_present(item, fields.label)
            .map(as_text)
            .unwrap_or_else(|| fields.default_label.to_string()),
        station: fields
            .station
            .iter()
            .filter_map(|k| item.get(*k))
            .find(|v| !v.is_null())
            .map(as_text)
            .or_else(|| fields.default_station.map(str::to_string)),
    }
}

/// Maps an arbitrary JSON object by discovering keys by substring.
fn map_discovered(item: &Map<String, Value>, index: usize) -> ChartPoint {
    let find_key = |needles: &[&str]| {
        item.keys().find(|k| {
            let k = k.to_lowercase();
            needles.iter().any(|n| k.contains(n))
        })
    };

    let timestamp = find_key(&["time", "date", "fecha"])
        .map(|k| as_text(&item[k]))
        .unwrap_or_else(|| Utc::now().to_rfc3339());
    let value = match find_key(&["level", "value", "nivel", "medicion"]) {
        Some(k) => as_number(item.get(k)),
        None => as_number(item.values().next()),
    };
    let label = find_key(&["name", "station", "label"])
        .map(|k| as_text(&item[k]))
        .unwrap_or_else(|| format!("Item {}", index + 1));
    let station = item
        .get("id")
        .filter(|v| !v.is_null())
        .map(as_text)
        .unwrap_or_else(|| index.to_string());

    ChartPoint {
        timestamp: Some(timestamp),
        value,
        label,
        station: Some(station),
    }
}

/// Normalizes `raw` into a chart dataset.
///
/// Non-array input produces an empty dataset whose source is `"empty"`.
/// Array elements that are not objects are treated as empty objects.
pub fn normalize(raw: &Value, source_type: SourceType) -> ChartDataSet {
    let Some(items) = raw.as_array() else {
        return ChartDataSet {
            data: Vec::new(),
            metadata: DataSetMetadata {
                kind: source_type,
                source: "empty",
                unit: "m",
                range: ValueRange { min: 0.0, max: 0.0 },
            },
        };
    };

    let empty = Map::new();
    let objects = items.iter().map(|v| v.as_object().unwrap_or(&empty));

    let data: Vec<ChartPoint> = match source_type {
        SourceType::Json => objects
            .enumerate()
            .map(|(i, item)| map_discovered(item, i))
            .collect(),
        other => {
            let fields = match other {
                SourceType::Measurement => &MEASUREMENT_FIELDS,
                SourceType::Station => &STATION_FIELDS,
                SourceType::Alert => &ALERT_FIELDS,
                SourceType::Report => &REPORT_FIELDS,
                SourceType::ApiV1 => &API_V1_FIELDS,
                SourceType::ApiV2 => &API_V2_FIELDS,
                SourceType::Csv | SourceType::Json => &CSV_FIELDS,
            };
            objects.map(|item| map_point(item, fields)).collect()
        }
    };

    let range = range_of(&data);
    ChartDataSet {
        data,
        metadata: DataSetMetadata {
            kind: source_type,
            source: source_type.source_label(),
            unit: "m",
            range,
        },
    }
}

/// Rendering hints keyed by the dataset type.
pub fn chart_config(dataset: &ChartDataSet) -> ChartConfig {
    let (color, stroke_width, dot_radius) = match dataset.metadata.kind {
        SourceType::Measurement => ("var(--gov-primary)", 3, 4),
        SourceType::Station => ("var(--gov-green)", 2, 6),
        SourceType::Alert => ("var(--gov-secondary)", 4, 8),
        SourceType::Report => ("var(--gov-orange)", 2, 5),
        _ => ("var(--gov-gray-b)", 2, 4),
    };

    ChartConfig {
        x_axis_key: "timestamp",
        y_axis_key: "value",
        unit: dataset.metadata.unit,
        color,
        stroke_width,
        dot_radius,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_array_input_is_empty() {
        let ds = normalize(&json!({ "value": 1 }), SourceType::Measurement);
        assert!(ds.data.is_empty());
        assert_eq!(ds.metadata.source, "empty");
        assert_eq!(ds.metadata.range, ValueRange { min: 0.0, max: 0.0 });
    }

    #[test]
    fn test_report_values_and_fallbacks() {
        let raw = json!([
            { "timestamp": "2025-01-07T12:00:00Z", "value": 2.1, "date": "2025-01-07", "average_level": "2.1" },
            { "date": "2025-01-11", "value": null },
            { "date": "2025-01-12", "max_level": "n/a" }
        ]);

        let ds = normalize(&raw, SourceType::Report);

        assert_eq!(ds.metadata.source, "reports");
        assert_eq!(ds.data.len(), 3);
        assert!((ds.data[0].value - 2.1).abs() < 1e-9);
        assert_eq!(ds.data[0].timestamp.as_deref(), Some("2025-01-07"));
        assert_eq!(ds.data[1].value, 0.0);
        assert_eq!(ds.data[2].value, 0.0);
        assert_eq!(ds.data[1].label, "Reporte");
        assert_eq!(ds.data[1].station.as_deref(), Some("all"));
    }

    #[test]
    fn test_measurement_zero_value_falls_through() {
        let raw = json!([{ "timestamp": "t", "value": 0, "water_level": 1.4, "station_id": 3 }]);

        let ds = normalize(&raw, SourceType::Measurement);

        assert_eq!(ds.data[0].value, 1.4);
        assert_eq!(ds.data[0].station.as_deref(), Some("3"));
        assert_eq!(ds.data[0].label, "Sin estación");
    }

    #[test]
    fn test_station_timestamp_defaults_to_now() {
        let raw = json!([{ "name": "Río Claro Norte", "current_level": "2.75", "id": 1 }]);

        let ds = normalize(&raw, SourceType::Station);

        assert!(ds.data[0].timestamp.is_some());
        assert_eq!(ds.data[0].value, 2.75);
        assert_eq!(ds.data[0].label, "Río Claro Norte");
    }

    #[test]
    fn test_api_v2_mapping() {
        let raw = json!([
            { "datetime": "2025-03-01T10:00:00Z", "water_height": "1.7", "sensor_name": "S1" }
        ]);

        let ds = normalize(&raw, SourceType::ApiV2);

        assert_eq!(ds.metadata.source, "external_api_v2");
        assert!((ds.data[0].value - 1.7).abs() < 1e-9);
        assert_eq!(ds.data[0].label, "S1");
    }

    #[test]
    fn test_csv_spanish_headers() {
        let raw = json!([{ "fecha": "2025-02-01", "nivel": "2.5", "estacion": "A" }]);

        let ds = normalize(&raw, SourceType::Csv);

        assert_eq!(ds.data[0].value, 2.5);
        assert_eq!(ds.data[0].label, "A");
        assert_eq!(ds.data[0].station.as_deref(), Some("csv"));
    }

    #[test]
    fn test_json_discovers_keys() {
        let raw = json!([
            { "fecha": "2025-02-01T08:00:00Z", "nivel_rio": "2.5", "station_label": "A" },
            { "other": 7 }
        ]);

        let ds = normalize(&raw, SourceType::Json);

        assert_eq!(ds.metadata.source, "json_import");
        assert_eq!(ds.data[0].value, 2.5);
        assert_eq!(ds.data[0].label, "A");
        assert_eq!(ds.data[0].timestamp.as_deref(), Some("2025-02-01T08:00:00Z"));
        assert_eq!(ds.data[1].value, 7.0);
        assert_eq!(ds.data[1].label, "Item 2");
        assert_eq!(ds.data[1].station.as_deref(), Some("1"));
    }

    #[test]
    fn test_json_follows_payload_key_order() {
        let raw = json!([
            { "zeta": 5, "alpha": "x" },
            { "updated_time": "A", "date": "B" }
        ]);

        let ds = normalize(&raw, SourceType::Json);

        assert_eq!(ds.data[0].value, 5.0);
        assert_eq!(ds.data[1].timestamp.as_deref(), Some("A"));
    }

    #[test]
    fn test_numeric_prefix_of_strings() {
        assert_eq!(as_number(Some(&json!("2.35 m"))), 2.35);
        assert_eq!(as_number(Some(&json!("  -1.5e1cm"))), -15.0);
        assert_eq!(as_number(Some(&json!(".5"))), 0.5);
        assert_eq!(as_number(Some(&json!("m 2.35"))), 0.0);
        assert_eq!(as_number(Some(&json!("n/a"))), 0.0);
        assert_eq!(as_number(Some(&json!(true))), 0.0);
    }

    #[test]
    fn test_csv_values_with_units() {
        let raw = json!([{ "fecha": "2025-02-01", "nivel": "2.35 m", "estacion": "A" }]);

        let ds = normalize(&raw, SourceType::Csv);

        assert_eq!(ds.data[0].value, 2.35);
    }

    #[test]
    fn test_range_spans_values() {
        let raw = json!([{ "level": 1.5 }, { "level": "4" }, { "level": 2 }]);
        let ds = normalize(&raw, SourceType::ApiV1);
        assert_eq!(ds.metadata.range, ValueRange { min: 1.5, max: 4.0 });
    }

    #[test]
    fn test_chart_config_per_type() {
        let ds = normalize(&json!([]), SourceType::Alert);
        let config = chart_config(&ds);
        assert_eq!(config.color, "var(--gov-secondary)");
        assert_eq!((config.stroke_width, config.dot_radius), (4, 8));

        let ds = normalize(&json!([]), SourceType::Csv);
        assert_eq!(chart_config(&ds).color, "var(--gov-gray-b)");
    }

    #[test]
    fn test_source_type_parse() {
        assert_eq!(SourceType::parse("api_v1").unwrap(), SourceType::ApiV1);
        let err = SourceType::parse("xml").unwrap_err();
        assert_eq!(err.to_string(), "Tipo de fuente de datos no soportado: xml");
    }
}
