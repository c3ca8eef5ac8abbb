/// Unified error types for the onboarding verification service
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Main error type for the service
#[derive(Error, Debug)]
pub enum OnboardError {
    /// More than one directory account carries the same correlation attribute
    #[error("Ambiguous user: {0}")]
    AmbiguousUser(String),

    /// No directory account could be established
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// Unsupported verb for a directory passthrough call
    #[error("Invalid method '{method}', must be one of: get, post, patch")]
    InvalidMethod { method: String },

    /// Token exchange against an identity provider failed
    #[error("Upstream authentication failed ({service}): {message}")]
    UpstreamAuth {
        service: String,
        message: String,
        body: Option<Value>,
    },

    /// Non-2xx answer from the directory or registry API
    #[error("{service} returned {status}")]
    UpstreamApi {
        service: String,
        status: u16,
        body: Value,
    },

    /// Outbound call exceeded the configured timeout
    #[error("Timeout calling {0}")]
    Timeout(String),

    /// Transport-level HTTP failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Missing or wrong function key
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl OnboardError {
    /// Classify a reqwest transport error for the named upstream
    pub fn from_transport(service: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            OnboardError::Timeout(service.to_string())
        } else {
            OnboardError::Http(err)
        }
    }

    /// HTTP status this error maps to at the service edge
    pub fn status_code(&self) -> StatusCode {
        match self {
            OnboardError::Validation(_) | OnboardError::InvalidMethod { .. } => {
                StatusCode::BAD_REQUEST
            }
            OnboardError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            OnboardError::UserNotFound(_) => StatusCode::NOT_FOUND,
            OnboardError::AmbiguousUser(_) => StatusCode::CONFLICT,
            OnboardError::UpstreamAuth { .. }
            | OnboardError::UpstreamApi { .. }
            | OnboardError::Http(_) => StatusCode::BAD_GATEWAY,
            OnboardError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            OnboardError::Config(_) | OnboardError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Upstream detail surfaced to callers in the `data` field
    pub fn detail(&self) -> Value {
        match self {
            OnboardError::UpstreamApi { body, .. } => body.clone(),
            OnboardError::UpstreamAuth { body, message, .. } => {
                body.clone().unwrap_or_else(|| Value::String(message.clone()))
            }
            OnboardError::Http(e) => Value::String(e.to_string()),
            _ => Value::Null,
        }
    }
}

/// Error response body: `{message, data}`
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
    pub data: Value,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>, data: Value) -> Self {
        Self {
            message: message.into(),
            data,
        }
    }
}

/// Convert OnboardError to HTTP response
impl IntoResponse for OnboardError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match self {
            OnboardError::Config(_) | OnboardError::Internal(_) => {
                "Internal server error".to_string() // Don't leak details
            }
            _ => self.to_string(),
        };
        let body = Json(ErrorResponse::new(message, self.detail()));

        (status, body).into_response()
    }
}

/// Result type alias for service operations
pub type OnboardResult<T> = Result<T, OnboardError>;
