//! Batch forecasting over persisted per-series models.
//!
//! Every series runs as its own blocking task; the batch waits for all of
//! them and keeps failures local to the series that produced them.
use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Datelike, Duration, NaiveDate};
use futures::future::join_all;
use tracing::{debug, warn};

use crate::catalog::SeriesConfig;
use crate::config::DashboardConfig;
use crate::data::{series_points, Observation};
use crate::errors::ForecastError;
use crate::ml::metrics::{accuracy, round2};
use crate::ml::model::SeriesModel;
use crate::models::{ForecastResult, PredictionMap};
use crate::store::ModelStore;

pub const NOTE_NO_EVALUATION: &str = "No evaluation data available";
pub const NOTE_INSUFFICIENT: &str = "Insufficient data for metrics";

const MIN_METRIC_PAIRS: usize = 2;

/// Which dates a series is forecast for.
#[derive(Debug, Clone, PartialEq)]
pub enum TargetMode {
    /// Every observed date of the series in caller-supplied data.
    Observed,
    /// Observed dates falling in `year` of the reference dataset.
    Evaluation { year: i32 },
    /// Caller-supplied dates; actuals are used only where they happen to exist.
    Explicit(Vec<NaiveDate>),
}

#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub forecasts: PredictionMap,
    pub skipped: Vec<(String, ForecastError)>,
}

/// Forecasts one series with an already loaded model. Predictions are
/// rounded to 2 decimals; metrics use the unrounded values.
pub fn forecast_series<M: SeriesModel>(
    series_id: &str,
    model: &M,
    observations: &[Observation],
    mode: &TargetMode,
) -> Result<ForecastResult, ForecastError> {
    let mut result = project(series_id, model, observations, mode)?;
    result.predictions.iter_mut().for_each(|p| *p = round2(*p));
    Ok(result)
}

fn project<M: SeriesModel>(
    series_id: &str,
    model: &M,
    observations: &[Observation],
    mode: &TargetMode,
) -> Result<ForecastResult, ForecastError> {
    let points = series_points(observations, series_id);

    let mut targets: Vec<NaiveDate> = match mode {
        TargetMode::Observed => points.iter().map(|(date, _)| *date).collect(),
        TargetMode::Evaluation { year } => points
            .iter()
            .map(|(date, _)| *date)
            .filter(|date| date.year() == *year)
            .collect(),
        TargetMode::Explicit(dates) => dates.clone(),
    };
    targets.sort();
    targets.dedup();

    if targets.is_empty() {
        return Err(ForecastError::NoTargetDates {
            series_id: series_id.into(),
        });
    }

    let predictions = model.predict(&targets)?;
    if predictions.len() != targets.len() {
        return Err(ForecastError::Fit {
            series_id: series_id.into(),
            reason: format!("{} predictions for {} dates", predictions.len(), targets.len()),
        });
    }
    // Actuals pair with predictions by date; targets without one are left out.
    // Pair on date, so targets without an actual never shift the alignment.
    let actual_at: BTreeMap<NaiveDate, f64> = points.into_iter().collect();
    let (actuals, paired): (Vec<f64>, Vec<f64>) = targets
        .iter()
        .zip(&predictions)
        .filter_map(|(date, p)| actual_at.get(date).map(|a| (*a, *p)))
        .unzip();
    debug!(
        series = %series_id,
        forecast_points = predictions.len(),
        actual_points = actuals.len(),
        "Generated forecast"
    );

    let mut result = ForecastResult {
        series_id: series_id.into(),
        dates: targets,
        predictions,
        mse: None,
        mape: None,
        note: None,
    };

    if actuals.is_empty() {
        result.note = Some(NOTE_NO_EVALUATION.into());
        return Ok(result);
    }
    if actuals.len() < MIN_METRIC_PAIRS {
        result.note = Some(NOTE_INSUFFICIENT.into());
        return Ok(result);
    }

    if let Some(metrics) = accuracy(&actuals, &paired) {
        debug!(series = %series_id, mse = metrics.mse, mape = metrics.mape, "Computed accuracy");
        result.mse = Some(metrics.mse);
        result.mape = Some(metrics.mape);
    }
    Ok(result)
}

/// Loads each series' model and forecasts it on a blocking worker, then joins.
pub async fn predict(
    store: Arc<ModelStore>,
    configs: &[SeriesConfig],
    observations: Arc<Vec<Observation>>,
    mode: TargetMode,
) -> BatchOutcome {
    let handles: Vec<_> = configs
        .iter()
        .map(|config| {
            let store = store.clone();
            let observations = observations.clone();
            let mode = mode.clone();
            let series_id = config.id.clone();
            tokio::task::spawn_blocking(move || {
                let model = store.load(&series_id)?;
                forecast_series(&series_id, &model, &observations, &mode)
            })
        })
        .collect();

    let joined = join_all(handles).await;

    let mut outcome = BatchOutcome::default();
    for (config, result) in configs.iter().zip(joined) {
        let result = result.unwrap_or_else(|e| {
            Err(ForecastError::Task {
                series_id: config.id.clone(),
                reason: e.to_string(),
            })
        });
        match result {
            Ok(forecast) => {
                outcome.forecasts.insert(config.id.clone(), forecast);
            }
            Err(e) => {
                warn!(series = %config.id, error = %e, "Skipping series");
                outcome.skipped.push((config.id.clone(), e));
            }
        }
    }
    outcome
}

/// Dashboard forecast: unrounded fitted values over the last `chart_points`
/// history dates followed by `forecast_points` future dates.
pub fn dashboard_forecast<M: SeriesModel>(
    series_id: &str,
    model: &M,
    settings: &DashboardConfig,
) -> Result<ForecastResult, ForecastError> {
    let history = model.history();
    let last = history
        .last()
        .map(|(date, _)| *date)
        .ok_or_else(|| ForecastError::NoTargetDates {
            series_id: series_id.into(),
        })?;

    let tail_start = history.len().saturating_sub(settings.chart_points);
    let mut dates: Vec<NaiveDate> = history[tail_start..].iter().map(|(d, _)| *d).collect();
    dates.extend(
        (1..=settings.forecast_points as i64).map(|i| last + Duration::days(i * settings.frequency_days)),
    );

    let observations: Vec<Observation> = history
        .iter()
        .map(|(date, value)| Observation {
            date: *date,
            series_id: series_id.into(),
            value: Some(*value),
        })
        .collect();

    project(series_id, model, &observations, &TargetMode::Explicit(dates))
}
