//! API error type mapped to HTTP status codes.
//!
//! Every error leaves the server as `{"error": "message"}` with either 400
//! (caller mistake: malformed JSON, bad parameters, dimension mismatch,
//! duplicate id) or 500 (snapshot I/O, format, or CRC failures).

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use vecvault_core::VaultError;

/// Application-level error that implements `IntoResponse`.
#[derive(Debug)]
pub enum ApiError {
    /// Invalid request shape or parameters (400).
    BadRequest(String),
    /// Engine or I/O failure (500).
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, axum::Json(json!({ "error": message }))).into_response()
    }
}

impl From<VaultError> for ApiError {
    fn from(err: VaultError) -> Self {
        match err {
            VaultError::InvalidParameter(_)
            | VaultError::DimensionMismatch { .. }
            | VaultError::DuplicateId(_) => ApiError::BadRequest(err.to_string()),
            VaultError::Io(_) | VaultError::Format(_) | VaultError::CrcMismatch { .. } => {
                ApiError::Internal(err.to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}
