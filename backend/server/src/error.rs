use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use ledger::StoreError;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::analytics::cards::ForecastError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("No JSON data provided")]
    MissingPayload,

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Prompt is required")]
    MissingPrompt,

    #[error("Invalid search pattern: {0}")]
    InvalidPattern(String),

    #[error("Store error: {0}")]
    Store(StoreError),

    #[error("Forecast error: {0}")]
    Forecast(#[from] ForecastError),
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::InvalidPattern(e) => AppError::InvalidPattern(e.to_string()),
            StoreError::NotAnObject => AppError::MalformedPayload(e.to_string()),
            e => AppError::Store(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::MissingPayload
            | AppError::MalformedPayload { .. }
            | AppError::MissingPrompt
            | AppError::InvalidPattern { .. } => StatusCode::BAD_REQUEST,
            AppError::Store { .. } | AppError::Forecast { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!(error = ?self, "Request failed: {self}");
        } else {
            warn!("Rejected request: {self}");
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
