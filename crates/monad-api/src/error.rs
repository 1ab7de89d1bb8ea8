//! API error handling.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};

/// API error type.
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Internal(String),
}

/// Gateway-style envelope: `{"statusCode": N, "body": ...}`.
///
/// The HTTP status mirrors `statusCode`.
pub fn envelope(status: StatusCode, body: Value) -> Response {
    let payload = Json(json!({
        "statusCode": status.as_u16(),
        "body": body,
    }));
    (status, payload).into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        envelope(status, json!({ "error": message }))
    }
}

impl From<monad_core::Error> for ApiError {
    fn from(err: monad_core::Error) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<monad_config::ConfigError> for ApiError {
    fn from(err: monad_config::ConfigError) -> Self {
        ApiError::Internal(err.to_string())
    }
}
