use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::{header, HeaderMap},
    Json,
};
use tracing::{info, warn};

use crate::catalog::SeriesConfig;
use crate::data::SalesFrame;
use crate::errors::AppError;
use crate::handlers::AppState;
use crate::ml::forecast::{self, TargetMode};
use crate::models::{DateRange, ForecastRequest, ForecastResponse, PredictMetadata, PredictResponse};

struct Upload {
    filename: String,
    bytes: Vec<u8>,
}

/// `POST /predict`: forecasts the uploaded CSV, or evaluates the reference
/// dataset when the request is not multipart at all.
pub async fn predict(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<PredictResponse>, AppError> {
    let upload = match (is_multipart(&headers), multipart) {
        (false, _) => None,
        (true, Ok(multipart)) => Some(read_upload(multipart).await?),
        (true, Err(rejection)) => {
            return Err(AppError::bad_request(format!("Malformed multipart request: {rejection}")));
        }
    };

    let (filename, frame, mode) = match upload {
        Some(upload) => {
            if !upload.filename.to_lowercase().ends_with(".csv") {
                return Err(AppError::bad_request("Only CSV files are supported"));
            }
            let frame = SalesFrame::from_bytes(&upload.bytes)?;
            (upload.filename, frame, TargetMode::Observed)
        }
        None => {
            let frame = load_dataset(&state.dataset_path).await?;
            let filename = state
                .dataset_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            (filename, frame, TargetMode::Evaluation { year: state.evaluation_year })
        }
    };

    let (available, missing): (Vec<SeriesConfig>, Vec<SeriesConfig>) = state
        .catalog
        .all_series()
        .iter()
        .cloned()
        .partition(|config| frame.has_series(&config.id));

    for config in &missing {
        warn!(series = %config.id, "Series not found in uploaded data");
    }
    if available.is_empty() {
        return Err(AppError::bad_request("No valid series found in data")
            .with_details(serde_json::json!({ "available_series": state.catalog.ids() })));
    }

    info!(
        filename = %filename,
        rows = frame.len(),
        series = available.len(),
        "Generating predictions"
    );

    let outcome = forecast::predict(
        state.store.clone(),
        &available,
        Arc::new(frame.observations()),
        mode,
    )
    .await;

    Ok(Json(PredictResponse {
        metadata: PredictMetadata {
            filename: Some(filename),
            data_rows: frame.len(),
            date_range: frame.date_range().map(|(start, end)| DateRange { start, end }),
            available_series: available.into_iter().map(|c| c.id).collect(),
            missing_series: missing.into_iter().map(|c| c.id).collect(),
        },
        predictions: outcome.forecasts,
    }))
}

/// `POST /forecast`: point forecasts for caller-supplied dates.
pub async fn forecast(
    State(state): State<AppState>,
    Json(req): Json<ForecastRequest>,
) -> Result<Json<ForecastResponse>, AppError> {
    if req.dates.is_empty() {
        return Err(AppError::bad_request("'dates' must contain at least one date"));
    }

    let configs: Vec<SeriesConfig> = match &req.series {
        None => state.catalog.all_series().to_vec(),
        Some(ids) => ids
            .iter()
            .map(|id| {
                state
                    .catalog
                    .get(id)
                    .cloned()
                    .ok_or_else(|| AppError::bad_request(format!("Unknown series '{id}'")))
            })
            .collect::<Result<_, _>>()?,
    };

    let outcome = forecast::predict(
        state.store.clone(),
        &configs,
        Arc::new(Vec::new()),
        TargetMode::Explicit(req.dates),
    )
    .await;

    Ok(Json(ForecastResponse {
        predictions: outcome.forecasts,
    }))
}

fn is_multipart(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map_or(false, |ct| ct.trim_start().to_ascii_lowercase().starts_with("multipart/"))
}

async fn read_upload(mut multipart: Multipart) -> Result<Upload, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(format!("Malformed multipart body: {e}")))?
    {
        let is_file = field.name() == Some("file") || field.file_name().is_some();
        if !is_file {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::bad_request(format!("Failed to read upload: {e}")))?;
        return Ok(Upload {
            filename,
            bytes: bytes.to_vec(),
        });
    }
    Err(AppError::bad_request("Multipart body has no 'file' field"))
}

async fn load_dataset(path: &Path) -> Result<SalesFrame, AppError> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || SalesFrame::from_path(&path))
        .await
        .map_err(|e| AppError::internal(format!("Dataset loader failed: {e}")))?
        .map_err(|e| AppError::internal(format!("Failed to load dataset: {e}")))
}
