use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

use super::ErrorBody;
use crate::services::AnalysisError;

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),

    ValidationError(String),

    UpstreamError(String),

    ExtractionFormatError(String),

    DatabaseError(String),

    InternalError(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            ApiError::UpstreamError(msg) => write!(f, "Upstream error: {}", msg),
            ApiError::ExtractionFormatError(msg) => write!(f, "Extraction format error: {}", msg),
            ApiError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::UpstreamError(msg) => {
                tracing::warn!("Upstream error: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    "An upstream service failed; the analysis was not saved".to_string(),
                )
            }
            ApiError::ExtractionFormatError(msg) => {
                tracing::warn!("Extraction format error: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    "The extraction service returned an unusable answer".to_string(),
                )
            }
            ApiError::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database error occurred".to_string(),
                )
            }
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ErrorBody {
            error: error_message,
        };
        (status, Json(body)).into_response()
    }
}

impl From<AnalysisError> for ApiError {
    fn from(err: AnalysisError) -> Self {
        match err {
            AnalysisError::Upstream(e) => ApiError::UpstreamError(e.to_string()),
            AnalysisError::ExtractionFormat(msg) => ApiError::ExtractionFormatError(msg),
            AnalysisError::NotFound(id) => ApiError::analysis_not_found(id),
            AnalysisError::Database(msg) => ApiError::DatabaseError(msg),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::InternalError(err.to_string())
    }
}

impl ApiError {
    pub fn analysis_not_found(id: i32) -> Self {
        ApiError::NotFound(format!("Analysis {} not found", id))
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::ValidationError(msg.into())
    }
}
