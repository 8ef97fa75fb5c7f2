//! Error envelope for the HTTP surface
//!
//! Success bodies are endpoint-specific JSON; failures share one envelope
//! carrying a stable machine-readable code so clients can branch without
//! parsing prose.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, warn};

use crate::errors::AppError;

/// Envelope for every failed request
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub timestamp: DateTime<Utc>,
}

impl ErrorResponse {
    pub fn new(code: &str) -> Self {
        Self {
            success: false,
            error: code.to_string(),
            timestamp: Utc::now(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::UpstreamUnavailable { .. } => StatusCode::BAD_GATEWAY,
            AppError::Database(_)
            | AppError::Token(_)
            | AppError::Configuration { .. }
            | AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status == StatusCode::BAD_GATEWAY {
            warn!("Upstream failure: {}", self);
        } else if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        (status, Json(ErrorResponse::new(self.wire_code()))).into_response()
    }
}
