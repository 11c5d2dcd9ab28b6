//! Error types for keyshift-tp
//!
//! API errors render as plain-text bodies; client mistakes map to 400,
//! oversized uploads to 413, processing and I/O failures to 500.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{error, warn};

use crate::processing::ShiftError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("{0}")]
    BadRequest(String),

    /// Upload media type not in the allow-list (400)
    #[error("Only .mp3 and .wav files are allowed! (got {0})")]
    UnsupportedMediaType(String),

    /// External pitch shifter failed (500)
    #[error("Error processing audio: {0}")]
    Processing(#[from] ShiftError),

    /// Request body exceeded `max_upload_bytes` (413)
    #[error("Upload exceeds the maximum size of {0} bytes")]
    UploadTooLarge(usize),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// keyshift-common error
    #[error("{0}")]
    Common(#[from] keyshift_common::Error),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::UnsupportedMediaType(_) => StatusCode::BAD_REQUEST,
            ApiError::UploadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Common(err) if err.is_client_error() => StatusCode::BAD_REQUEST,
            ApiError::Processing(_)
            | ApiError::Io(_)
            | ApiError::Common(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.to_string();

        if status.is_server_error() {
            error!(status = status.as_u16(), "{}", message);
        } else {
            warn!(status = status.as_u16(), "{}", message);
        }

        (
            status,
            [("content-type", "text/plain; charset=utf-8")],
            message,
        )
            .into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
