use axum::{extract::State, Json};
use serde::Serialize;

use crate::catalog::SeriesConfig;
use crate::handlers::AppState;

#[derive(Debug, Serialize)]
pub struct SeriesInfo {
    pub name: String,
    pub parameters: Parameters,
}

#[derive(Debug, Serialize)]
pub struct Parameters {
    pub changepoint_prior_scale: f64,
    pub interval_width: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seasonality_prior_scale: Option<f64>,
}

impl From<&SeriesConfig> for SeriesInfo {
    fn from(config: &SeriesConfig) -> Self {
        Self {
            name: config.id.clone(),
            parameters: Parameters {
                changepoint_prior_scale: config.changepoint_prior_scale,
                interval_width: config.interval_width,
                seasonality_prior_scale: config.seasonality_prior_scale,
            },
        }
    }
}

pub async fn list(State(state): State<AppState>) -> Json<serde_json::Value> {
    let series: Vec<SeriesInfo> = state.catalog.all_series().iter().map(SeriesInfo::from).collect();
    Json(serde_json::json!({ "series": series }))
}
