//! Per-series forecasting model backed by `augurs`.
//!
//! Training dates are mapped onto a regular step grid anchored at the first
//! date; steps without an observation are NaN and get filled by a linear
//! interpolator before fitting. Series with yearly seasonality and at least two
//! full years on the grid are decomposed with MSTL (AutoETS trend), everything
//! else uses plain AutoETS.

use augurs::ets::AutoETS;
use augurs::forecaster::{transforms::LinearInterpolator, Forecaster, Transformer};
use augurs::mstl::MSTLModel;
use augurs::{Fit, Predict};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::catalog::SeriesConfig;
use crate::errors::ForecastError;

/// Fewer distinct dates than this is not enough to select an ETS model.
pub const MIN_OBSERVATIONS: usize = 10;

const YEARLY_PERIOD_DAYS: f64 = 365.25;

/// Capability the forecaster needs from a fitted model.
pub trait SeriesModel: Sized {
    fn fit(series_id: &str, history: &[(NaiveDate, f64)], params: &ModelParams) -> Result<Self, ForecastError>;

    /// Central point estimate for each date, in input order.
    fn predict(&self, dates: &[NaiveDate]) -> Result<Vec<f64>, ForecastError>;

    /// Training points, sorted by date.
    fn history(&self) -> &[(NaiveDate, f64)];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelParams {
    pub changepoint_prior_scale: f64,
    pub interval_width: f64,
    /// `Some` enables the yearly seasonal component.
    pub seasonality_prior_scale: Option<f64>,
}

impl From<&SeriesConfig> for ModelParams {
    fn from(config: &SeriesConfig) -> Self {
        Self {
            changepoint_prior_scale: config.changepoint_prior_scale,
            interval_width: config.interval_width,
            seasonality_prior_scale: config.seasonality_prior_scale,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeasonalModel {
    pub series_id: String,
    pub params: ModelParams,
    start: NaiveDate,
    step_days: i64,
    /// Training values on the step grid, NaN where nothing was observed.
    grid: Vec<f64>,
    /// Seasonal period in steps when MSTL is used.
    period: Option<usize>,
    /// In-sample fit for every grid position.
    fitted: Vec<f64>,
    history: Vec<(NaiveDate, f64)>,
}

struct Projection {
    in_sample: Vec<f64>,
    ahead: Vec<f64>,
}

impl SeasonalModel {
    pub fn seasonal_period(&self) -> Option<usize> {
        self.period
    }

    pub fn step_days(&self) -> i64 {
        self.step_days
    }

    fn step_index(&self, date: NaiveDate) -> i64 {
        let days = (date - self.start).num_days() as f64;
        (days / self.step_days as f64).round() as i64
    }

    /// Fits the grid and projects `horizon` steps past its end. Fitting is
    /// deterministic, so a reloaded model reproduces its training fit.
    fn project(&self, horizon: usize) -> Result<Projection, ForecastError> {
        let projected = match self.period {
            Some(period) => {
                let trend = AutoETS::non_seasonal().into_trend_model();
                run_forecaster(MSTLModel::new(vec![period], trend), &self.grid, horizon)
            }
            None => run_forecaster(AutoETS::non_seasonal(), &self.grid, horizon),
        };
        projected.map_err(|reason| ForecastError::Fit {
            series_id: self.series_id.clone(),
            reason,
        })
    }
}

impl SeriesModel for SeasonalModel {
    fn fit(series_id: &str, history: &[(NaiveDate, f64)], params: &ModelParams) -> Result<Self, ForecastError> {
        let mut history: Vec<(NaiveDate, f64)> =
            history.iter().copied().filter(|(_, v)| v.is_finite()).collect();
        history.sort_by_key(|(d, _)| *d);
        history.dedup_by_key(|(d, _)| *d);

        let (Some(&(start, _)), Some(&(end, _))) = (history.first(), history.last()) else {
            return Err(insufficient(series_id, 0));
        };
        if history.len() < MIN_OBSERVATIONS {
            return Err(insufficient(series_id, history.len()));
        }

        let step_days = typical_step(&history);
        let to_step = |date: NaiveDate| ((date - start).num_days() as f64 / step_days as f64).round() as usize;

        let mut grid = vec![f64::NAN; to_step(end) + 1];
        for (date, value) in &history {
            grid[to_step(*date)] = *value;
        }

        let period = params
            .seasonality_prior_scale
            .map(|_| (YEARLY_PERIOD_DAYS / step_days as f64).round() as usize)
            .filter(|p| *p > 1 && *p < grid.len() / 2);

        let mut model = Self {
            series_id: series_id.into(),
            params: params.clone(),
            start,
            step_days,
            grid,
            period,
            fitted: Vec::new(),
            history,
        };
        model.fitted = model.project(0)?.in_sample;
        Ok(model)
    }

    /// Dates inside the training range read the in-sample fit; later dates
    /// are forecast ahead; earlier dates take the first fitted value.
    fn predict(&self, dates: &[NaiveDate]) -> Result<Vec<f64>, ForecastError> {
        let n = self.fitted.len() as i64;
        let horizon = dates
            .iter()
            .map(|d| self.step_index(*d) - (n - 1))
            .max()
            .unwrap_or(0)
            .max(0) as usize;
        let ahead = if horizon > 0 { self.project(horizon)?.ahead } else { Vec::new() };

        dates
            .iter()
            .map(|date| {
                let i = self.step_index(*date);
                let value = if i < n {
                    self.fitted.get(i.max(0) as usize)
                } else {
                    ahead.get((i - n) as usize)
                };
                value.copied().ok_or_else(|| ForecastError::Fit {
                    series_id: self.series_id.clone(),
                    reason: format!("no projection for {date}"),
                })
            })
            .collect()
    }

    fn history(&self) -> &[(NaiveDate, f64)] {
        &self.history
    }
}

fn run_forecaster<M>(model: M, values: &[f64], horizon: usize) -> Result<Projection, String>
where
    M: Fit,
    M::Fitted: Predict,
{
    let transformers: Vec<Box<dyn Transformer>> = vec![Box::new(LinearInterpolator::default())];
    let mut forecaster = Forecaster::new(model).with_transformers(transformers);
    forecaster.fit(values).map_err(|e| format!("fit failed: {e}"))?;

    let in_sample = forecaster
        .predict_in_sample(None)
        .map_err(|e| format!("in-sample prediction failed: {e}"))?
        .point;
    let ahead = if horizon == 0 {
        Vec::new()
    } else {
        forecaster
            .predict(horizon, None)
            .map_err(|e| format!("forecast failed: {e}"))?
            .point
    };
    Ok(Projection { in_sample, ahead })
}

/// Median gap between consecutive dates, in days.
fn typical_step(history: &[(NaiveDate, f64)]) -> i64 {
    let mut gaps: Vec<i64> = history
        .windows(2)
        .map(|w| (w[1].0 - w[0].0).num_days())
        .filter(|g| *g > 0)
        .collect();
    gaps.sort_unstable();
    gaps.get(gaps.len() / 2).copied().unwrap_or(1).max(1)
}

fn insufficient(series_id: &str, got: usize) -> ForecastError {
    ForecastError::InsufficientData {
        series_id: series_id.into(),
        needed: MIN_OBSERVATIONS,
        got,
    }
}
