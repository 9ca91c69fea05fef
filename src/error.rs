use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::error;

use crate::bria::BriaError;
use crate::storage::StorageError;

pub const CONTENT_MODERATION_FAILED: &str =
    "Content moderation failed. Please ensure the image is appropriate.";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("API key not set. Please set it in the sidebar.")]
    MissingApiKey,

    #[error("{0}")]
    Validation(String),

    #[error("{}", remote_message(.0))]
    Remote(#[from] BriaError),

    // Bria answered, but in no shape we know how to read
    #[error("{0}")]
    NoResult(&'static str),

    #[error("Failed to store the resulting image.")]
    Storage(#[from] StorageError),
}

fn remote_message(err: &BriaError) -> String {
    if err.is_content_moderation() {
        CONTENT_MODERATION_FAILED.to_string()
    } else {
        err.to_string()
    }
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MissingApiKey | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Remote(_) | AppError::NoResult(_) | AppError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn envelope(&self) -> Json<Value> {
        match self {
            AppError::Remote(e) => error!(error = %e, "Bria request failed"),
            AppError::Storage(e) => error!(error = %e, "storing artifact failed"),
            AppError::NoResult(m) => error!(message = %m, "unrecognised Bria response"),
            AppError::MissingApiKey | AppError::Validation(_) => {}
        }
        Json(json!({ "success": false, "error": self.to_string() }))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status(), self.envelope()).into_response()
    }
}

// Error of a route that reports every failure inside a `200 OK` envelope.
// Only the shadow, fill and erase routes answer with 400 / 500.
#[derive(Debug)]
pub struct Reported(pub AppError);

impl From<AppError> for Reported {
    fn from(err: AppError) -> Self {
        Reported(err)
    }
}

impl From<BriaError> for Reported {
    fn from(err: BriaError) -> Self {
        Reported(err.into())
    }
}

impl From<StorageError> for Reported {
    fn from(err: StorageError) -> Self {
        Reported(err.into())
    }
}

impl IntoResponse for Reported {
    fn into_response(self) -> Response {
        (StatusCode::OK, self.0.envelope()).into_response()
    }
}
