use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Failures raised by the forecasting core.
///
/// Only `Validation` aborts a whole request. The other variants are
/// recovered per series: the series is skipped and its siblings continue.
#[derive(Debug, thiserror::Error)]
pub enum ForecastError {
    #[error("{0}")]
    Validation(String),

    #[error("no persisted model for series '{series_id}'")]
    NotFound { series_id: String },

    #[error("model for series '{series_id}' is unreadable: {reason}")]
    CorruptModel { series_id: String, reason: String },

    #[error("series '{series_id}' has {got} usable points, need at least {needed}")]
    InsufficientData {
        series_id: String,
        needed: usize,
        got: usize,
    },

    #[error("fitting series '{series_id}' failed: {reason}")]
    Fit { series_id: String, reason: String },

    #[error("no target dates to forecast for series '{series_id}'")]
    NoTargetDates { series_id: String },

    #[error("forecast task for series '{series_id}' failed: {reason}")]
    Task { series_id: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub body: ApiError,
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: ApiError {
                code: "BAD_REQUEST".into(),
                message: msg.into(),
                details: None,
            },
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            body: ApiError {
                code: "NOT_FOUND".into(),
                message: format!("{resource} with id '{id}' not found"),
                details: None,
            },
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: ApiError {
                code: "INTERNAL_ERROR".into(),
                message: msg.into(),
                details: None,
            },
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.body.details = Some(details);
        self
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<ForecastError> for AppError {
    fn from(err: ForecastError) -> Self {
        match err {
            ForecastError::Validation(msg) => Self::bad_request(msg),
            ForecastError::NotFound { series_id } => Self::not_found("Model", &series_id),
            other => {
                tracing::error!("Forecast error: {other}");
                Self::internal(other.to_string())
            }
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        tracing::error!("Internal error: {:?}", err);
        Self::internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_maps_to_bad_request() {
        let err: AppError = ForecastError::Validation("missing datum".into()).into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.body.message, "missing datum");
    }

    #[test]
    fn test_corrupt_model_maps_to_internal() {
        let err: AppError = ForecastError::CorruptModel {
            series_id: "R03".into(),
            reason: "truncated".into(),
        }
        .into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.body.code, "INTERNAL_ERROR");
    }
}
