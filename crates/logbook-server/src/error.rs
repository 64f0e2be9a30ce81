//! Error types for the HTTP server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use logbook_core::LogError;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

/// Result type alias for server lifecycle operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors raised while configuring or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind to the specified address.
    #[error("failed to bind to {0}: {1}")]
    BindFailed(std::net::SocketAddr, std::io::Error),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// The storage backend could not be opened.
    #[error("storage error: {0}")]
    Storage(#[from] LogError),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Errors returned to HTTP clients.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request body was not valid JSON for a log entry.
    #[error("Invalid JSON format")]
    InvalidJson,

    /// The `level` field named no known level.
    #[error("Invalid log level")]
    InvalidLevel,

    /// A query parameter could not be parsed.
    #[error("Invalid {0} parameter")]
    InvalidParameter(String),

    /// Same as [`ApiError::InvalidParameter`] for timestamps.
    #[error("Invalid {0} parameter (use RFC3339 format)")]
    InvalidTimestamp(String),

    /// The request did not finish within the configured deadline.
    #[error("Request timeout")]
    Timeout,

    /// A use case failed.
    #[error(transparent)]
    Log(#[from] LogError),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse<'a> {
    error: &'a str,
    success: bool,
}

impl ApiError {
    /// Returns the HTTP status and the public message for this error.
    #[must_use]
    pub fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            Self::InvalidJson | Self::InvalidLevel => (StatusCode::BAD_REQUEST, self.to_string()),
            Self::InvalidParameter(_) | Self::InvalidTimestamp(_) => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            Self::Timeout => (StatusCode::REQUEST_TIMEOUT, self.to_string()),
            Self::Log(err) => {
                let (status, message) = match err {
                    LogError::NotFound(_) => (StatusCode::NOT_FOUND, "Log entry not found"),
                    LogError::InvalidEntry(_) => (StatusCode::BAD_REQUEST, "Invalid log entry"),
                    LogError::InvalidLevel(_) => (StatusCode::BAD_REQUEST, "Invalid log level"),
                    LogError::InvalidFilter(_) => {
                        (StatusCode::BAD_REQUEST, "Invalid filter parameters")
                    }
                    LogError::StorageUnavailable(_) => {
                        (StatusCode::SERVICE_UNAVAILABLE, "Storage unavailable")
                    }
                    LogError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized access"),
                    LogError::RateLimitExceeded => {
                        (StatusCode::TOO_MANY_REQUESTS, "Rate limit exceeded")
                    }
                    LogError::AlertServiceUnavailable(_)
                    | LogError::IdGenerationFailed(_)
                    | LogError::Serialization(_)
                    | LogError::Io(_) => {
                        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
                    }
                };
                (status, message.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        if status.is_server_error() {
            error!(error = %self, status = status.as_u16(), "request failed");
        } else if let Self::Log(err) = &self {
            warn!(kind = err.kind(), error = %err, status = status.as_u16(), "request rejected");
        }

        let body = ErrorResponse {
            error: &message,
            success: false,
        };

        let json = serde_json::to_string(&body).unwrap_or_else(|_| {
            r#"{"error":"Internal server error","success":false}"#.to_string()
        });

        (status, [("content-type", "application/json")], json).into_response()
    }
}

/// Gives the timeout layer's empty 408 the standard error body.
pub async fn timeout_as_json(response: Response) -> Response {
    if response.status() == StatusCode::REQUEST_TIMEOUT {
        ApiError::Timeout.into_response()
    } else {
        response
    }
}
