pub mod dashboard;
pub mod health;
pub mod predict;
pub mod series;

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::catalog::SeriesCatalog;
use crate::config::{AppConfig, DashboardConfig};
use crate::store::ModelStore;

/// Shared application state available to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<SeriesCatalog>,
    pub store: Arc<ModelStore>,
    pub dataset_path: PathBuf,
    pub evaluation_year: i32,
    pub dashboard: Arc<DashboardConfig>,
}

impl AppState {
    pub fn new(config: &AppConfig, catalog: SeriesCatalog) -> Self {
        Self {
            catalog: Arc::new(catalog),
            store: Arc::new(ModelStore::from_config(&config.store)),
            dataset_path: PathBuf::from(&config.data.path),
            evaluation_year: config.data.evaluation_year,
            dashboard: Arc::new(config.dashboard.clone()),
        }
    }
}

fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Forecast API: health, catalog listing, CSV prediction and explicit-date forecasts.
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health::api_root))
        .route("/health", get(health::api_health))
        .route("/series", get(series::list))
        .route("/predict", post(predict::predict))
        .route("/forecast", post(predict::forecast))
        .layer(cors())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Dashboard backend: KPI rollups over every persisted model.
pub fn dashboard_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health::dashboard_index))
        .route("/favicon.ico", get(health::favicon))
        .route("/api/health", get(health::dashboard_health))
        .route("/api/dashboard", get(dashboard::dashboard))
        .layer(cors())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
