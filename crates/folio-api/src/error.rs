//! API error types and JSON error response formatting.
//!
//! Every non-2xx response carries `{error, message}` where `error` is a
//! machine-readable code.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use folio_chat::ChatError;
use serde::{Deserialize, Serialize};

/// JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable error code (e.g., "bad_request", "rate_limited").
    pub error: String,
    /// Human-readable error message.
    pub message: String,
}

/// API error type that maps to HTTP status codes and JSON responses.
#[derive(Debug)]
pub enum ApiError {
    /// 400 Bad Request - missing or invalid input.
    BadRequest(String),
    /// 400 Bad Request - a model switch whose validation call failed.
    ModelRejected { code: &'static str, message: String },
    /// 404 Not Found - conversation does not exist.
    NotFound(String),
    /// 413 Payload Too Large - body over the configured limit.
    PayloadTooLarge(String),
    /// 502 Bad Gateway - the completion API failed.
    Upstream { code: &'static str, message: String },
    /// 500 Internal Server Error - unexpected server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::ModelRejected { code, message } => (StatusCode::BAD_REQUEST, code, message),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::PayloadTooLarge(msg) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large", msg)
            }
            ApiError::Upstream { code, message } => (StatusCode::BAD_GATEWAY, code, message),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg)
            }
        };

        let body = ErrorBody {
            error: error_code.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::Validation(msg) => ApiError::BadRequest(msg),
            ChatError::NotFound(_) => ApiError::NotFound("Conversation not found".to_string()),
            ChatError::Completion(e) => ApiError::Upstream {
                code: e.code(),
                message: e.to_string(),
            },
            ChatError::Notification(msg) | ChatError::Storage(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(rejection.body_text())
        } else {
            ApiError::BadRequest(rejection.body_text())
        }
    }
}
