//! Error types at the generation and HTTP boundaries.
//!
//! `GenerationError` messages are the sanitized, user-facing texts. Raw
//! transport/decoding detail is logged where it happens and never carried here.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::domain::RequestError;
use crate::protocol::{ErrorBody, ErrorOut};

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum GenerationError {
    /// The model call could not complete (network, auth, quota, deadline).
    #[error("Failed to generate content from the AI. Please check your API key and try again later.")]
    RequestFailed,

    /// The model answered, but not with a usable exam package.
    #[error("The AI returned an invalid format. Please try again.")]
    InvalidResponseFormat,
}

impl GenerationError {
    pub fn code(self) -> &'static str {
        match self {
            GenerationError::RequestFailed => "REQUEST_FAILED",
            GenerationError::InvalidResponseFormat => "INVALID_RESPONSE_FORMAT",
        }
    }
}

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(#[from] RequestError),

    #[error(transparent)]
    Generation(#[from] GenerationError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            AppError::Generation(e) => (StatusCode::BAD_GATEWAY, e.code()),
        };
        let message = match &self {
            AppError::Validation(e) => e.to_string(),
            AppError::Generation(e) => e.to_string(),
        };

        let body = Json(ErrorOut {
            error: ErrorBody { code: code.to_string(), message },
        });
        (status, body).into_response()
    }
}
