//! JSON error responses shared by all handlers.
//!
//! Body shape: `{"statusCode", "message", "error", "timestamp", "path"}`. `message` is a
//! string for business errors and a list of strings for request validation failures.

use axum::{
    extract::rejection::JsonRejection,
    http::{StatusCode, Uri},
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use serde_json::{json, Value};

use crate::error::LedgerError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: &'static str,
    pub message: Value,
    pub path: Option<String>,
}

impl ApiError {
    pub fn validation(messages: Vec<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: "Bad Request",
            message: json!(messages),
            path: None,
        }
    }

    pub fn too_many_requests() -> Self {
        Self {
            status: StatusCode::TOO_MANY_REQUESTS,
            error: "Too Many Requests",
            message: json!("Rate limit exceeded, try again later"),
            path: None,
        }
    }

    /// Attach the request path to the response body.
    pub fn at(mut self, uri: &Uri) -> Self {
        self.path = Some(uri.path().to_string());
        self
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        let status = match &err {
            LedgerError::WalletNotFound(_) => StatusCode::NOT_FOUND,
            LedgerError::DuplicateTransaction(_) => StatusCode::CONFLICT,
            LedgerError::InsufficientBalance { .. }
            | LedgerError::InvalidTransfer(_)
            | LedgerError::InvalidAmount(_) => StatusCode::BAD_REQUEST,
            LedgerError::Storage(e) => {
                tracing::error!("Storage failure: {:?}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let message = match &err {
            LedgerError::Storage(_) => json!("Internal server error"),
            other => json!(other.to_string()),
        };
        Self {
            status,
            error: err.title(),
            message,
            path: None,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let status = match rejection {
            JsonRejection::MissingJsonContentType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            _ => StatusCode::BAD_REQUEST,
        };
        Self {
            status,
            error: "Bad Request",
            message: json!([rejection.body_text()]),
            path: None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "statusCode": self.status.as_u16(),
            "message": self.message,
            "error": self.error,
            "timestamp": Utc::now().to_rfc3339(),
            "path": self.path,
        });
        (self.status, Json(body)).into_response()
    }
}
