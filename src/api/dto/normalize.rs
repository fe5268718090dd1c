//! DTOs for the normalization endpoint.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::application::normalization::{ChartConfig, ChartDataSet};

/// Body of `POST /api/normalize`.
#[derive(Debug, Deserialize)]
pub struct NormalizeRequest {
    /// Raw payload, expected to be an array of objects.
    #[serde(default)]
    pub data: Value,

    #[serde(default = "default_source_type")]
    pub source_type: String,
}

fn default_source_type() -> String {
    "json".to_string()
}

#[derive(Debug, Serialize)]
pub struct NormalizeResponse {
    #[serde(flatten)]
    pub dataset: ChartDataSet,
    pub chart_config: ChartConfig,
}
