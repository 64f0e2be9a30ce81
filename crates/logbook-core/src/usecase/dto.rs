//! Request and response shapes for the use cases.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::filter::LogStats;
use crate::types::{LogEntry, LogLevel, Metadata};

/// Input of the create-log use case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateLogRequest {
    /// Severity level
    pub level: LogLevel,
    /// Emitting service
    pub service: String,
    /// Event name
    pub event: String,
    /// Human-readable message
    pub message: String,
    /// Optional end-user identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    /// Optional chat identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<i64>,
    /// Additional structured fields
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
}

impl CreateLogRequest {
    /// Creates a request without optional fields.
    #[must_use]
    pub fn new(
        level: LogLevel,
        service: impl Into<String>,
        event: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            level,
            service: service.into(),
            event: event.into(),
            message: message.into(),
            user_id: None,
            chat_id: None,
            metadata: Metadata::new(),
        }
    }

    /// Sets the user ID.
    #[must_use]
    pub const fn with_user_id(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Sets the chat ID.
    #[must_use]
    pub const fn with_chat_id(mut self, chat_id: i64) -> Self {
        self.chat_id = Some(chat_id);
        self
    }

    /// Adds a metadata field.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// Outcome of the create-log use case.
///
/// `success` and `alert_sent` are independent: a stored entry whose alert
/// could not be delivered reports `success = true, alert_sent = false`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateLogResponse {
    /// Generated entry ID
    pub id: String,
    /// Timestamp assigned to the entry
    pub timestamp: DateTime<Utc>,
    /// The entry was durably stored
    pub success: bool,
    /// An alert was delivered for the entry
    pub alert_sent: bool,
}

/// One page of query results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryLogsResponse {
    /// Entries on this page
    pub logs: Vec<LogEntry>,
    /// Number of entries matching the filter across all pages
    pub total_count: u64,
    /// More matching entries exist after this page
    pub has_more: bool,
}

/// Aggregated statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetLogStatsResponse {
    /// Counts for the matching entries
    pub stats: LogStats,
}
