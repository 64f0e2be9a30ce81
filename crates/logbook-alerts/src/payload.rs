//! JSON bodies posted to alert receivers.

use chrono::{DateTime, Utc};
use logbook_core::{LogEntry, LogLevel, Metadata};
use serde::{Deserialize, Serialize};

/// One alert, as sent to a webhook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertPayload {
    /// Emitting service
    pub service: String,
    /// Event name
    pub event: String,
    /// Severity level
    pub level: LogLevel,
    /// Log message
    pub message: String,
    /// Entry timestamp
    pub timestamp: DateTime<Utc>,
    /// Entry ID
    pub id: String,
    /// End-user identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    /// Chat identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<i64>,
    /// Structured fields of the entry
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
}

impl From<&LogEntry> for AlertPayload {
    fn from(entry: &LogEntry) -> Self {
        Self {
            service: entry.service.clone(),
            event: entry.event.clone(),
            level: entry.level,
            message: entry.message.clone(),
            timestamp: entry.timestamp,
            id: entry.id.clone(),
            user_id: entry.user_id,
            chat_id: entry.chat_id,
            metadata: entry.metadata.clone(),
        }
    }
}

/// Digest of several alerts sent in one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchAlertPayload {
    /// The alerts
    pub alerts: Vec<AlertPayload>,
    /// Number of alerts
    pub count: usize,
}

impl BatchAlertPayload {
    /// Builds a digest from entries.
    #[must_use]
    pub fn from_entries(entries: &[LogEntry]) -> Self {
        let alerts: Vec<AlertPayload> = entries.iter().map(AlertPayload::from).collect();
        Self {
            count: alerts.len(),
            alerts,
        }
    }
}
