use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::StoreConfig;
use crate::errors::ForecastError;
use crate::ml::model::SeasonalModel;

const EXTENSION: &str = "bin";

/// One bincode file per series: `<dir>/<series_id>_<suffix>.bin`.
#[derive(Debug, Clone)]
pub struct ModelStore {
    dir: PathBuf,
    suffix: String,
}

impl ModelStore {
    pub fn new(dir: impl Into<PathBuf>, suffix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            suffix: suffix.into(),
        }
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(&config.model_dir, config.suffix.clone())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, series_id: &str) -> PathBuf {
        self.dir
            .join(format!("{series_id}_{}.{EXTENSION}", self.suffix))
    }

    /// Writes (or overwrites) the model for `series_id`.
    pub fn save(&self, series_id: &str, model: &SeasonalModel) -> Result<PathBuf, ForecastError> {
        std::fs::create_dir_all(&self.dir)?;
        let bytes = bincode::serialize(model).map_err(|e| ForecastError::CorruptModel {
            series_id: series_id.into(),
            reason: e.to_string(),
        })?;

        let path = self.path_for(series_id);
        std::fs::write(&path, bytes)?;
        info!(series = %series_id, path = %path.display(), "Saved model");
        Ok(path)
    }

    pub fn load(&self, series_id: &str) -> Result<SeasonalModel, ForecastError> {
        let path = self.path_for(series_id);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ForecastError::NotFound {
                    series_id: series_id.into(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        let model: SeasonalModel =
            bincode::deserialize(&bytes).map_err(|e| ForecastError::CorruptModel {
                series_id: series_id.into(),
                reason: e.to_string(),
            })?;

        if model.series_id != series_id {
            return Err(ForecastError::CorruptModel {
                series_id: series_id.into(),
                reason: format!("file holds a model for '{}'", model.series_id),
            });
        }

        debug!(series = %series_id, "Loaded model");
        Ok(model)
    }

    /// Series ids that currently have a persisted model.
    pub fn list_available(&self) -> Result<BTreeSet<String>, ForecastError> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeSet::new()),
            Err(e) => return Err(e.into()),
        };

        let tail = format!("_{}.{EXTENSION}", self.suffix);
        let mut ids = BTreeSet::new();
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            if let Some(id) = name.to_str().and_then(|n| n.strip_suffix(&tail)) {
                if !id.is_empty() {
                    ids.insert(id.to_string());
                }
            }
        }
        Ok(ids)
    }
}
