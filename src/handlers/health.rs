use axum::{extract::State, http::StatusCode, Json};

use crate::errors::AppError;
use crate::handlers::AppState;

pub async fn api_root(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Sales Forecasting API is running",
        "version": env!("CARGO_PKG_VERSION"),
        "available_series": state.catalog.ids(),
    }))
}

pub async fn api_health(State(state): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    let models = state.store.list_available()?;
    Ok(Json(serde_json::json!({
        "status": "ok",
        "models": models,
    })))
}

pub async fn dashboard_index() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Drug-sales backend is running",
        "endpoints": ["/api/health", "/api/dashboard"],
    }))
}

pub async fn dashboard_health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

pub async fn favicon() -> StatusCode {
    StatusCode::NO_CONTENT
}
