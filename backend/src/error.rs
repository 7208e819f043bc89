//! Error types shared across the backend.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde_json::json;

/// Domain and request errors.
///
/// Every variant maps to a fixed HTTP status; the response body carries a
/// timestamp, an error label and a message, never a backtrace.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Duplicate(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    PayrollProcessing(String),

    #[error("{0}")]
    Internal(String),
}

impl Error {
    fn status(&self) -> StatusCode {
        match self {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Duplicate(_) => StatusCode::CONFLICT,
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Error::Forbidden(_) => StatusCode::FORBIDDEN,
            Error::PayrollProcessing(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Error::NotFound(_) => "Not Found",
            Error::Duplicate(_) => "Conflict",
            Error::Validation(_) => "Validation Failed",
            Error::Unauthorized(_) => "Authentication Failed",
            Error::Forbidden(_) => "Access Denied",
            Error::PayrollProcessing(_) => "Payroll Processing Error",
            Error::Internal(_) => "Internal Server Error",
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = Json(json!({
            "timestamp": Utc::now().to_rfc3339(),
            "error": self.label(),
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}

impl From<rusqlite::Error> for Error {
    fn from(e: rusqlite::Error) -> Self {
        Error::Internal(format!("Database error: {}", e))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
