use chrono::NaiveDate;
use tracing::info;

use crate::catalog::SeriesConfig;
use crate::data::{series_points, Observation};
use crate::errors::ForecastError;
use crate::ml::model::{ModelParams, SeasonalModel, SeriesModel};
use crate::store::ModelStore;

/// Fits one series on every observation strictly before `cutoff` and persists it.
pub fn train(
    config: &SeriesConfig,
    observations: &[Observation],
    cutoff: NaiveDate,
    store: &ModelStore,
) -> Result<SeasonalModel, ForecastError> {
    let training: Vec<(NaiveDate, f64)> = series_points(observations, &config.id)
        .into_iter()
        .filter(|(date, _)| *date < cutoff)
        .collect();

    let params = ModelParams::from(config);
    let model = SeasonalModel::fit(&config.id, &training, &params)?;
    info!(
        series = %config.id,
        points = training.len(),
        step_days = model.step_days(),
        seasonal_period = ?model.seasonal_period(),
        "Fitted model"
    );

    store.save(&config.id, &model)?;
    Ok(model)
}
