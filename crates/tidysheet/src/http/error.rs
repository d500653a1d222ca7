//! HTTP error handling and response types.

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tidysheet_core::error::PipelineError;

/// API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

#[derive(Debug)]
pub enum AppError {
    UnsupportedFormat(String),
    Decode(String),
    Encode(String),
    /// Malformed multipart body or query
    BadRequest(String),
    PayloadTooLarge(String),
    /// Unclassified fault outside the pipeline taxonomy; its cause is logged, never returned
    Internal,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::UnsupportedFormat(details) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                ApiError::new(
                    "UNSUPPORTED_FORMAT",
                    "Upload a .csv, .xlsx or .xls file.",
                )
                .with_details(details),
            ),
            AppError::Decode(details) => (
                StatusCode::BAD_REQUEST,
                ApiError::new("DECODE_ERROR", "The file could not be read.")
                    .with_details(details),
            ),
            AppError::Encode(details) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ApiError::new("ENCODE_ERROR", "The cleaned file could not be written.")
                    .with_details(details),
            ),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ApiError::new("BAD_REQUEST", msg))
            }
            AppError::PayloadTooLarge(msg) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                ApiError::new("PAYLOAD_TOO_LARGE", msg),
            ),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::new("INTERNAL_ERROR", "Unexpected failure while cleaning the file."),
            ),
        };

        (status, Json(error)).into_response()
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::UnsupportedFormat(details) => AppError::UnsupportedFormat(details),
            PipelineError::Decode(details) => AppError::Decode(details),
            PipelineError::Encode(details) => AppError::Encode(details),
        }
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge(err.body_text())
        } else {
            AppError::BadRequest(format!("Multipart error: {}", err.body_text()))
        }
    }
}
