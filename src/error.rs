use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Failures of a single normalization run. None of them are retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Canvas contains no foreground pixels")]
    EmptyCanvas,

    #[error("Invalid target dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error(
        "Expected a {expected_width}x{expected_height} single-channel image, \
         got {width}x{height} with {channels} channel(s)"
    )]
    DimensionMismatch {
        expected_width: u32,
        expected_height: u32,
        width: u32,
        height: u32,
        channels: u8,
    },
}

impl PipelineError {
    /// Stable machine-readable code for the error kind
    pub fn code(&self) -> &'static str {
        match self {
            PipelineError::InvalidImage(_) => "INVALID_IMAGE",
            PipelineError::EmptyCanvas => "EMPTY_CANVAS",
            PipelineError::InvalidDimensions { .. } => "INVALID_DIMENSIONS",
            PipelineError::DimensionMismatch { .. } => "DIMENSION_MISMATCH",
        }
    }
}

/// Errors surfaced by the HTTP layer
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Image too large: {size} bytes (max: {max} bytes)")]
    ImageTooLarge { size: usize, max: usize },

    #[error("Missing file in request")]
    MissingFile,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::Pipeline(e) => {
                let status = match e {
                    PipelineError::EmptyCanvas => StatusCode::UNPROCESSABLE_ENTITY,
                    PipelineError::InvalidImage(_) | PipelineError::InvalidDimensions { .. } => {
                        StatusCode::BAD_REQUEST
                    }
                    PipelineError::DimensionMismatch { .. } => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, e.code())
            }
            ApiError::Decode(_) => (StatusCode::BAD_REQUEST, "DECODE_ERROR"),
            ApiError::ImageTooLarge { .. } => (StatusCode::PAYLOAD_TOO_LARGE, "IMAGE_TOO_LARGE"),
            ApiError::MissingFile => (StatusCode::BAD_REQUEST, "MISSING_FILE"),
            ApiError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        });

        (status, body).into_response()
    }
}
