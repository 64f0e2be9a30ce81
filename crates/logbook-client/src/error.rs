//! Error types for the logbook-client crate.

use thiserror::Error;

/// Errors returned by [`LogbookClient`](crate::LogbookClient).
#[derive(Debug, Error)]
pub enum ClientError {
    /// The client was created without a base URL.
    #[error("logbook client base URL is empty")]
    MissingBaseUrl,

    /// The server answered with a non-success status.
    #[error("logbook server returned HTTP {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Error message from the response body, or the status reason.
        message: String,
    },

    /// The request could not be sent or the response not read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A body could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ClientError {
    /// Returns the HTTP status, if the server answered.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
