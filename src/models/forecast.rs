use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Point forecasts for one series. `dates` and `predictions` always have the
/// same length; `mse`/`mape` are present only when at least two
/// (prediction, actual) pairs were available, otherwise `note` explains why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    #[serde(skip)]
    pub series_id: String,
    pub dates: Vec<NaiveDate>,
    pub predictions: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mse: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mape: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl ForecastResult {
    pub fn has_metrics(&self) -> bool {
        self.mse.is_some() && self.mape.is_some()
    }

    /// Prediction for an exact date, if it was forecast.
    pub fn at(&self, date: NaiveDate) -> Option<f64> {
        self.dates
            .iter()
            .position(|d| *d == date)
            .and_then(|i| self.predictions.get(i).copied())
    }
}

pub type PredictionMap = BTreeMap<String, ForecastResult>;

#[derive(Debug, Clone, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Clone, Serialize)]
pub struct PredictMetadata {
    pub filename: Option<String>,
    pub data_rows: usize,
    pub date_range: Option<DateRange>,
    pub available_series: Vec<String>,
    pub missing_series: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PredictResponse {
    pub metadata: PredictMetadata,
    pub predictions: PredictionMap,
}

/// Body of `POST /forecast`.
#[derive(Debug, Clone, Deserialize)]
pub struct ForecastRequest {
    pub dates: Vec<NaiveDate>,
    #[serde(default)]
    pub series: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ForecastResponse {
    pub predictions: PredictionMap,
}
