//! Request-level error taxonomy and its HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::transcribe::RecognitionError;

/// Failure of a single mirror request.
///
/// # Details
/// The display text doubles as the `error` field of the JSON body.
#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("Missing 'message'")]
    MissingMessage,
    #[error("'message' must be a string")]
    InvalidMessage,
    #[error("Could not understand audio")]
    UnrecognizedSpeech,
    #[error("Speech recognition error: {0}")]
    Recognition(String),
    #[error("Server error: {0:#}")]
    Internal(#[from] anyhow::Error),
    /// Capture, completion or storage failure behind the voice route.
    #[error("Unexpected error: {0:#}")]
    Unexpected(anyhow::Error),
}

impl MirrorError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingMessage | Self::InvalidMessage | Self::UnrecognizedSpeech => {
                StatusCode::BAD_REQUEST
            }
            Self::Recognition(_) | Self::Internal(_) | Self::Unexpected(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<RecognitionError> for MirrorError {
    fn from(err: RecognitionError) -> Self {
        match err {
            RecognitionError::Unrecognized => Self::UnrecognizedSpeech,
            RecognitionError::Service(message) => Self::Recognition(message),
        }
    }
}

impl IntoResponse for MirrorError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{}", self);
        } else {
            tracing::debug!("rejected request: {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
