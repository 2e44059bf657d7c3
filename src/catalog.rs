use serde::Serialize;

/// Hyper-parameters for one tracked product series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesConfig {
    pub id: String,
    pub changepoint_prior_scale: f64,
    pub interval_width: f64,
    /// Present only for series that get an explicit yearly seasonality term.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seasonality_prior_scale: Option<f64>,
}

impl SeriesConfig {
    pub fn new(id: &str, changepoint_prior_scale: f64, interval_width: f64) -> Self {
        Self {
            id: id.into(),
            changepoint_prior_scale,
            interval_width,
            seasonality_prior_scale: None,
        }
    }

    pub fn with_yearly_seasonality(mut self, prior_scale: f64) -> Self {
        self.seasonality_prior_scale = Some(prior_scale);
        self
    }
}

/// Immutable table of tracked series, built once at startup and passed
/// explicitly to the trainer, forecaster and handlers.
#[derive(Debug, Clone)]
pub struct SeriesCatalog {
    series: Vec<SeriesConfig>,
}

impl SeriesCatalog {
    pub fn new(series: Vec<SeriesConfig>) -> Self {
        Self { series }
    }

    /// The eight ATC drug categories of the weekly sales dataset.
    pub fn reference() -> Self {
        Self::new(vec![
            SeriesConfig::new("M01AB", 30.0, 0.0005),
            SeriesConfig::new("M01AE", 0.05, 0.0005),
            SeriesConfig::new("N02BA", 0.005, 0.0005),
            SeriesConfig::new("N02BE", 10.0, 0.0005).with_yearly_seasonality(170.0),
            SeriesConfig::new("N05B", 5.0, 0.0005),
            SeriesConfig::new("N05C", 0.5, 0.005),
            SeriesConfig::new("R03", 0.05, 0.0005).with_yearly_seasonality(160.0),
            SeriesConfig::new("R06", 0.05, 0.0005).with_yearly_seasonality(120.0),
        ])
    }

    pub fn all_series(&self) -> &[SeriesConfig] {
        &self.series
    }

    pub fn ids(&self) -> Vec<String> {
        self.series.iter().map(|s| s.id.clone()).collect()
    }

    pub fn get(&self, id: &str) -> Option<&SeriesConfig> {
        self.series.iter().find(|s| s.id == id)
    }

    /// Position of `id` in catalog order, used to sort store listings.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.series.iter().position(|s| s.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_catalog() {
        let catalog = SeriesCatalog::reference();
        assert_eq!(catalog.all_series().len(), 8);
        assert_eq!(catalog.ids()[0], "M01AB");

        let seasonal: Vec<&str> = catalog
            .all_series()
            .iter()
            .filter(|s| s.seasonality_prior_scale.is_some())
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(seasonal, vec!["N02BE", "R03", "R06"]);
    }

    #[test]
    fn test_lookup() {
        let catalog = SeriesCatalog::reference();
        assert_eq!(catalog.get("N05C").unwrap().interval_width, 0.005);
        assert_eq!(catalog.position("R06"), Some(7));
        assert!(catalog.get("XYZ").is_none());
    }
}
