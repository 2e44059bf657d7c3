use chrono::NaiveDate;
use tracing::{error, info};

use crate::catalog::SeriesCatalog;
use crate::data::Observation;
use crate::ml::trainer;
use crate::store::ModelStore;

#[derive(Debug, Default)]
pub struct TrainingReport {
    pub trained: Vec<String>,
    pub failed: Vec<(String, String)>,
}

/// Trains every catalog series independently; a failing series is logged
/// and recorded, the rest of the batch continues.
pub fn run_training(
    catalog: &SeriesCatalog,
    observations: &[Observation],
    cutoff: NaiveDate,
    store: &ModelStore,
) -> TrainingReport {
    info!(series = catalog.all_series().len(), cutoff = %cutoff, "Running training job");

    let mut report = TrainingReport::default();
    for config in catalog.all_series() {
        match trainer::train(config, observations, cutoff, store) {
            Ok(_) => report.trained.push(config.id.clone()),
            Err(e) => {
                error!(series = %config.id, error = %e, "Training failed");
                report.failed.push((config.id.clone(), e.to_string()));
            }
        }
    }

    info!(
        trained = report.trained.len(),
        failed = report.failed.len(),
        "Training job finished"
    );
    report
}
