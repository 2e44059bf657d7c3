use chrono::NaiveDate;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_api_port")]
    pub api_port: u16,
    #[serde(default = "default_dashboard_port")]
    pub dashboard_port: u16,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_api_port() -> u16 {
    8000
}
fn default_dashboard_port() -> u16 {
    5000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            api_port: default_api_port(),
            dashboard_port: default_dashboard_port(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    #[serde(default = "default_model_dir")]
    pub model_dir: String,
    #[serde(default = "default_suffix")]
    pub suffix: String,
}

fn default_model_dir() -> String {
    "model_store".into()
}
fn default_suffix() -> String {
    "model".into()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            model_dir: default_model_dir(),
            suffix: default_suffix(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DataConfig {
    #[serde(default = "default_data_path")]
    pub path: String,
    /// Training uses every point strictly before this date.
    #[serde(default = "default_train_cutoff")]
    pub train_cutoff: NaiveDate,
    #[serde(default = "default_evaluation_year")]
    pub evaluation_year: i32,
}

fn default_data_path() -> String {
    "salesweekly.csv".into()
}
fn default_train_cutoff() -> NaiveDate {
    NaiveDate::from_ymd_opt(2019, 1, 1).unwrap_or_default()
}
fn default_evaluation_year() -> i32 {
    2019
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: default_data_path(),
            train_cutoff: default_train_cutoff(),
            evaluation_year: default_evaluation_year(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    #[serde(default = "default_chart_points")]
    pub chart_points: usize,
    #[serde(default = "default_forecast_points")]
    pub forecast_points: usize,
    #[serde(default = "default_predict_next")]
    pub predict_next: usize,
    #[serde(default = "default_growth_threshold")]
    pub growth_threshold_pct: f64,
    /// Spacing of the generated future dates.
    #[serde(default = "default_frequency_days")]
    pub frequency_days: i64,
}

fn default_chart_points() -> usize {
    10
}
fn default_forecast_points() -> usize {
    10
}
fn default_predict_next() -> usize {
    7
}
fn default_growth_threshold() -> f64 {
    8.0
}
fn default_frequency_days() -> i64 {
    7
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            chart_points: default_chart_points(),
            forecast_points: default_forecast_points(),
            predict_next: default_predict_next(),
            growth_threshold_pct: default_growth_threshold(),
            frequency_days: default_frequency_days(),
        }
    }
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from("config")
    }

    /// Reads `<name>.{toml,yaml,json}` if present, then `DRUGCAST__*` overrides.
    pub fn load_from(name: &str) -> anyhow::Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(name).required(false))
            .add_source(config::Environment::with_prefix("DRUGCAST").separator("__"))
            .build()?;

        let app_config: AppConfig = config.try_deserialize()?;
        Ok(app_config)
    }
}
