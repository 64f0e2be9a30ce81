//! Core types for the structured logging pipeline.
//!
//! This module provides:
//! - [`LogLevel`]: Ordered severity levels
//! - [`LogEntry`]: Immutable structured log record
//! - [`Metadata`]: Free-form JSON fields attached to an entry
//! - [`TimeRange`]: Closed time window

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{LogError, Result};

/// Free-form structured fields attached to a log entry.
pub type Metadata = HashMap<String, serde_json::Value>;

/// Log severity levels, ordered from least to most severe.
///
/// The discriminant is the level's priority: `Debug` is 1, `Critical` is 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
#[repr(u8)]
pub enum LogLevel {
    /// Debugging information
    Debug = 1,
    /// General information
    Info = 2,
    /// Warning conditions
    Warning = 3,
    /// Error conditions, triggers an alert
    Error = 4,
    /// Critical failures, triggers an alert
    Critical = 5,
}

impl LogLevel {
    /// All levels in ascending order of severity.
    pub const ALL: [Self; 5] = [
        Self::Debug,
        Self::Info,
        Self::Warning,
        Self::Error,
        Self::Critical,
    ];

    /// Returns the canonical uppercase name of this level.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
        }
    }

    /// Returns the numeric priority (1 for `Debug` through 5 for `Critical`).
    #[must_use]
    pub const fn priority(&self) -> u8 {
        *self as u8
    }

    /// Always true: an out-of-range level cannot be constructed.
    ///
    /// Raw priorities are checked by [`LogLevel::try_from`] instead.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        true
    }

    /// Returns true if entries at this level should raise an alert.
    #[must_use]
    pub const fn is_alerting(&self) -> bool {
        matches!(self, Self::Error | Self::Critical)
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DEBUG" => Ok(Self::Debug),
            "INFO" => Ok(Self::Info),
            "WARNING" | "WARN" => Ok(Self::Warning),
            "ERROR" => Ok(Self::Error),
            "CRITICAL" | "CRIT" => Ok(Self::Critical),
            _ => Err(LogError::InvalidLevel(s.to_string())),
        }
    }
}

impl TryFrom<u8> for LogLevel {
    type Error = LogError;

    fn try_from(priority: u8) -> Result<Self> {
        match priority {
            1 => Ok(Self::Debug),
            2 => Ok(Self::Info),
            3 => Ok(Self::Warning),
            4 => Ok(Self::Error),
            5 => Ok(Self::Critical),
            other => Err(LogError::InvalidLevel(other.to_string())),
        }
    }
}

impl TryFrom<String> for LogLevel {
    type Error = LogError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<LogLevel> for &'static str {
    fn from(level: LogLevel) -> Self {
        level.as_str()
    }
}

/// A structured log record.
///
/// Entries are created once by the ingestion path and never mutated; read
/// paths hand out clones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Unique identifier for this entry
    pub id: String,
    /// Severity level
    pub level: LogLevel,
    /// Name of the emitting service
    pub service: String,
    /// Machine-friendly event name (e.g. `service_start`)
    pub event: String,
    /// When the entry was created
    pub timestamp: DateTime<Utc>,
    /// Optional end-user identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    /// Optional chat identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<i64>,
    /// Human-readable message
    pub message: String,
    /// Additional structured fields
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: Metadata,
}

impl LogEntry {
    /// Creates a new log entry builder.
    #[must_use]
    pub fn builder() -> LogEntryBuilder {
        LogEntryBuilder::default()
    }

    /// Returns true if every required field is present.
    ///
    /// An entry is valid iff its id, service, event and message are not blank
    /// and its timestamp is set.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !is_blank(&self.id)
            && self.level.is_valid()
            && !is_blank(&self.service)
            && !is_blank(&self.event)
            && is_set(self.timestamp)
            && !is_blank(&self.message)
    }

    /// Returns true if this entry should trigger an alert.
    #[must_use]
    pub const fn should_alert(&self) -> bool {
        self.level.is_alerting()
    }

    /// Returns the numeric priority of this entry's level.
    #[must_use]
    pub const fn priority(&self) -> u8 {
        self.level.priority()
    }
}

/// Returns true if the string is empty or only whitespace.
#[must_use]
pub fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

/// Unix seconds of `0001-01-01T00:00:00Z`, the zero timestamp.
const ZERO_TIMESTAMP_SECS: i64 = -62_135_596_800;

/// Returns true if the timestamp is not the zero value
/// `0001-01-01T00:00:00Z`. The Unix epoch is a real timestamp.
#[must_use]
pub fn is_set(timestamp: DateTime<Utc>) -> bool {
    timestamp.timestamp() != ZERO_TIMESTAMP_SECS || timestamp.timestamp_subsec_nanos() != 0
}

/// Closed time window; either bound may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    /// Start of the range (inclusive)
    pub from: Option<DateTime<Utc>>,
    /// End of the range (inclusive)
    pub to: Option<DateTime<Utc>>,
}

impl TimeRange {
    /// Creates a new time range with the given bounds.
    #[must_use]
    pub const fn new(from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Self {
        Self { from, to }
    }

    /// Creates a range with both bounds set.
    #[must_use]
    pub const fn between(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
        }
    }

    /// Returns false if both bounds are set and `to` precedes `from`.
    #[must_use]
    pub fn is_ordered(&self) -> bool {
        match (self.from, self.to) {
            (Some(from), Some(to)) => to >= from,
            _ => true,
        }
    }

    /// Checks if a timestamp falls within this range.
    #[must_use]
    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        if self.from.is_some_and(|from| timestamp < from) {
            return false;
        }
        if self.to.is_some_and(|to| timestamp > to) {
            return false;
        }
        true
    }
}

/// Builder for constructing log entries.
#[derive(Debug, Default)]
pub struct LogEntryBuilder {
    id: Option<String>,
    level: Option<LogLevel>,
    service: Option<String>,
    event: Option<String>,
    timestamp: Option<DateTime<Utc>>,
    user_id: Option<i64>,
    chat_id: Option<i64>,
    message: Option<String>,
    metadata: Metadata,
}

impl LogEntryBuilder {
    /// Sets the entry ID.
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets the log level.
    #[must_use]
    pub const fn level(mut self, level: LogLevel) -> Self {
        self.level = Some(level);
        self
    }

    /// Sets the service name.
    #[must_use]
    pub fn service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    /// Sets the event name.
    #[must_use]
    pub fn event(mut self, event: impl Into<String>) -> Self {
        self.event = Some(event.into());
        self
    }

    /// Sets the timestamp.
    #[must_use]
    pub const fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Sets the user ID.
    #[must_use]
    pub const fn user_id(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Sets the chat ID.
    #[must_use]
    pub const fn chat_id(mut self, chat_id: i64) -> Self {
        self.chat_id = Some(chat_id);
        self
    }

    /// Sets the message.
    #[must_use]
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Adds a metadata field.
    #[must_use]
    pub fn field(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Builds the entry.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::InvalidEntry`] if a field is missing or the
    /// resulting entry is not valid.
    pub fn build(self) -> Result<LogEntry> {
        let missing = |field: &str| LogError::InvalidEntry(format!("missing field: {field}"));

        let entry = LogEntry {
            id: self.id.ok_or_else(|| missing("id"))?,
            level: self.level.ok_or_else(|| missing("level"))?,
            service: self.service.ok_or_else(|| missing("service"))?,
            event: self.event.ok_or_else(|| missing("event"))?,
            timestamp: self.timestamp.ok_or_else(|| missing("timestamp"))?,
            user_id: self.user_id,
            chat_id: self.chat_id,
            message: self.message.ok_or_else(|| missing("message"))?,
            metadata: self.metadata,
        };

        if !entry.is_valid() {
            return Err(LogError::InvalidEntry(format!(
                "entry {:?} has blank required fields",
                entry.id
            )));
        }
        Ok(entry)
    }
}
