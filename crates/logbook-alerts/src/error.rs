//! Error types for the logbook-alerts crate.

use logbook_core::LogError;
use thiserror::Error;

/// Errors raised while configuring or using an alert channel.
#[derive(Debug, Error)]
pub enum AlertError {
    /// Invalid channel configuration.
    #[error("invalid alert channel config: {reason}")]
    InvalidConfig {
        /// The reason the configuration is invalid.
        reason: String,
    },

    /// The request could not be delivered.
    #[error("alert delivery via {channel} failed: {reason}")]
    DeliveryFailed {
        /// Channel name.
        channel: String,
        /// The reason delivery failed.
        reason: String,
    },

    /// The receiver answered with a non-success status.
    #[error("alert receiver for {channel} returned HTTP {status}")]
    Rejected {
        /// Channel name.
        channel: String,
        /// HTTP status code.
        status: u16,
    },

    /// No channel accepted the alert.
    #[error("no alert channel delivered the alert")]
    NoChannelDelivered,

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<AlertError> for LogError {
    fn from(err: AlertError) -> Self {
        Self::AlertServiceUnavailable(err.to_string())
    }
}

/// Result type alias for alert operations.
pub type Result<T> = std::result::Result<T, AlertError>;
