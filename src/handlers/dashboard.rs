use std::sync::Arc;

use axum::{extract::State, Json};
use futures::future::join_all;
use tracing::{info, warn};

use crate::errors::{AppError, ForecastError};
use crate::handlers::AppState;
use crate::ml::forecast::dashboard_forecast;
use crate::ml::kpi::{self, DashboardPayload};
use crate::ml::model::SeriesModel;
use crate::models::{DashboardResponse, OverallView, ProductView};

/// `GET /api/dashboard`: per-product KPIs for every persisted model plus an
/// overall rollup. Series whose model fails to load or forecast are left out.
pub async fn dashboard(State(state): State<AppState>) -> Result<Json<DashboardResponse>, AppError> {
    let mut ids: Vec<String> = state.store.list_available()?.into_iter().collect();
    ids.sort_by_key(|id| (state.catalog.position(id).unwrap_or(usize::MAX), id.clone()));

    let handles: Vec<_> = ids
        .iter()
        .map(|id| {
            let store = state.store.clone();
            let settings = Arc::clone(&state.dashboard);
            let series_id = id.clone();
            tokio::task::spawn_blocking(move || -> Result<DashboardPayload, ForecastError> {
                let model = store.load(&series_id)?;
                let forecast = dashboard_forecast(&series_id, &model, &settings)?;
                Ok(kpi::aggregate(&series_id, model.history(), &forecast, &settings))
            })
        })
        .collect();

    let mut payloads = Vec::with_capacity(ids.len());
    for (id, joined) in ids.iter().zip(join_all(handles).await) {
        match joined {
            Ok(Ok(payload)) => payloads.push(payload),
            Ok(Err(e)) => warn!(series = %id, error = %e, "Skipping product on dashboard"),
            Err(e) => warn!(series = %id, error = %e, "Dashboard task panicked"),
        }
    }

    info!(products = payloads.len(), "Dashboard assembled");

    let overall = kpi::overall(&payloads);
    Ok(Json(DashboardResponse {
        overall: OverallView::from(&overall),
        products: payloads.iter().map(ProductView::from).collect(),
    }))
}
