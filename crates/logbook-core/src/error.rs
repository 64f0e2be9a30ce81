//! Error types for the logging pipeline.

use thiserror::Error;

/// Errors that can occur while ingesting, storing, querying or alerting on logs.
#[derive(Debug, Error)]
pub enum LogError {
    /// No entry exists with the given ID.
    #[error("log entry not found: {0}")]
    NotFound(String),

    /// The entry (or the request it was built from) failed validation.
    #[error("invalid log entry: {0}")]
    InvalidEntry(String),

    /// A level name or priority outside the known set.
    #[error("invalid log level: {0}")]
    InvalidLevel(String),

    /// Invalid filter configuration.
    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    /// The storage backend could not serve the request.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// The alert backend could not deliver a notification.
    #[error("alert service unavailable: {0}")]
    AlertServiceUnavailable(String),

    /// The ID generator could not produce an identifier.
    #[error("ID generation failed: {0}")]
    IdGenerationFailed(String),

    /// The caller is not allowed to perform the operation.
    #[error("unauthorized access")]
    Unauthorized,

    /// The caller exceeded its request budget.
    #[error("rate limit exceeded")]
    RateLimitExceeded,

    /// Serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LogError {
    /// Returns a short, stable name for the error kind.
    ///
    /// Used as a structured field in log output.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "log_not_found",
            Self::InvalidEntry(_) => "invalid_log_entry",
            Self::InvalidLevel(_) => "invalid_log_level",
            Self::InvalidFilter(_) => "invalid_filter",
            Self::StorageUnavailable(_) => "storage_unavailable",
            Self::AlertServiceUnavailable(_) => "alert_service_unavailable",
            Self::IdGenerationFailed(_) => "id_generation_failed",
            Self::Unauthorized => "unauthorized",
            Self::RateLimitExceeded => "rate_limit_exceeded",
            Self::Serialization(_) => "serialization",
            Self::Io(_) => "io",
        }
    }
}

/// Result type alias for log operations.
pub type Result<T> = std::result::Result<T, LogError>;
