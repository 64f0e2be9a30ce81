//! Query filters and aggregation results.
//!
//! This module provides:
//! - [`LogFilter`]: Query specification with pagination and sorting
//! - [`SortField`] / [`SortOrder`]: Ordering of query results
//! - [`LogStats`]: Aggregated counts over matching entries

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{LogError, Result};
use crate::types::{LogEntry, LogLevel, TimeRange};

/// Field used to order query results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    /// Entry creation time
    #[default]
    Timestamp,
    /// Level priority
    Level,
    /// Service name
    Service,
    /// Event name
    Event,
}

impl SortField {
    /// Returns the query-string name of this field.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Timestamp => "timestamp",
            Self::Level => "level",
            Self::Service => "service",
            Self::Event => "event",
        }
    }

    fn compare(self, a: &LogEntry, b: &LogEntry) -> Ordering {
        match self {
            Self::Timestamp => a.timestamp.cmp(&b.timestamp),
            Self::Level => a.level.cmp(&b.level),
            Self::Service => a.service.cmp(&b.service),
            Self::Event => a.event.cmp(&b.event),
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortField {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "timestamp" => Ok(Self::Timestamp),
            "level" => Ok(Self::Level),
            "service" => Ok(Self::Service),
            "event" => Ok(Self::Event),
            _ => Err(LogError::InvalidFilter(format!("unknown sort field: {s}"))),
        }
    }
}

/// Direction of the ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Oldest / smallest first
    Asc,
    /// Newest / largest first
    #[default]
    Desc,
}

impl SortOrder {
    /// Returns the query-string name of this order.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(LogError::InvalidFilter(format!("unknown sort order: {s}"))),
        }
    }
}

/// Filter criteria for querying, counting, aggregating and deleting logs.
///
/// Empty sets place no restriction on their dimension. `limit` and `offset`
/// are signed so that out-of-range input reaches validation instead of
/// failing to parse; a `limit` of zero means "unset".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogFilter {
    /// Lower time bound (inclusive)
    pub time_from: Option<DateTime<Utc>>,
    /// Upper time bound (inclusive)
    pub time_to: Option<DateTime<Utc>>,
    /// Match any of these services
    #[serde(default)]
    pub services: Vec<String>,
    /// Match any of these events
    #[serde(default)]
    pub events: Vec<String>,
    /// Match any of these levels
    #[serde(default)]
    pub levels: Vec<LogLevel>,
    /// Exact user ID
    pub user_id: Option<i64>,
    /// Exact chat ID
    pub chat_id: Option<i64>,
    /// Case-insensitive substring of the message
    pub message_contains: Option<String>,
    /// Page size
    #[serde(default)]
    pub limit: i64,
    /// Number of matching entries to skip
    #[serde(default)]
    pub offset: i64,
    /// Ordering field
    pub sort_by: Option<SortField>,
    /// Ordering direction
    pub sort_order: Option<SortOrder>,
}

impl LogFilter {
    /// Creates a new empty filter that matches all logs.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a service to match.
    #[must_use]
    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.services.push(service.into());
        self
    }

    /// Adds an event to match.
    #[must_use]
    pub fn with_event(mut self, event: impl Into<String>) -> Self {
        self.events.push(event.into());
        self
    }

    /// Adds a level to match.
    #[must_use]
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.levels.push(level);
        self
    }

    /// Restricts to a user ID.
    #[must_use]
    pub const fn with_user_id(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Restricts to a chat ID.
    #[must_use]
    pub const fn with_chat_id(mut self, chat_id: i64) -> Self {
        self.chat_id = Some(chat_id);
        self
    }

    /// Adds a text search filter.
    #[must_use]
    pub fn with_contains(mut self, text: impl Into<String>) -> Self {
        self.message_contains = Some(text.into());
        self
    }

    /// Sets the time window.
    #[must_use]
    pub const fn with_time_range(mut self, range: TimeRange) -> Self {
        self.time_from = range.from;
        self.time_to = range.to;
        self
    }

    /// Sets the page size and offset.
    #[must_use]
    pub const fn with_page(mut self, limit: i64, offset: i64) -> Self {
        self.limit = limit;
        self.offset = offset;
        self
    }

    /// Sets the ordering.
    #[must_use]
    pub const fn with_sort(mut self, field: SortField, order: SortOrder) -> Self {
        self.sort_by = Some(field);
        self.sort_order = Some(order);
        self
    }

    /// Returns the time window of this filter.
    #[must_use]
    pub const fn time_range(&self) -> TimeRange {
        TimeRange::new(self.time_from, self.time_to)
    }

    /// Checks if an entry matches every dimension of this filter.
    ///
    /// Pagination and sorting are ignored.
    #[must_use]
    pub fn matches(&self, entry: &LogEntry) -> bool {
        if !self.services.is_empty() && !self.services.contains(&entry.service) {
            return false;
        }

        if !self.events.is_empty() && !self.events.contains(&entry.event) {
            return false;
        }

        if !self.levels.is_empty() && !self.levels.contains(&entry.level) {
            return false;
        }

        if self.user_id.is_some() && entry.user_id != self.user_id {
            return false;
        }

        if self.chat_id.is_some() && entry.chat_id != self.chat_id {
            return false;
        }

        if let Some(ref search) = self.message_contains {
            let search_lower = search.to_lowercase();
            if !entry.message.to_lowercase().contains(&search_lower) {
                return false;
            }
        }

        self.time_range().contains(entry.timestamp)
    }

    /// Orders two entries according to the filter's sort settings.
    ///
    /// Unset settings fall back to newest-first by timestamp. Ties are broken
    /// by ID so that paging is stable.
    #[must_use]
    pub fn compare(&self, a: &LogEntry, b: &LogEntry) -> Ordering {
        let field = self.sort_by.unwrap_or_default();
        let ordering = field.compare(a, b).then_with(|| a.id.cmp(&b.id));
        match self.sort_order.unwrap_or_default() {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }
}

/// Aggregated counts over the entries matching a filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogStats {
    /// Number of matching entries
    pub total_count: u64,
    /// Matching entries per level
    pub count_by_level: BTreeMap<LogLevel, u64>,
    /// Matching entries per service
    pub count_by_service: HashMap<String, u64>,
    /// Matching entries per event
    pub count_by_event: HashMap<String, u64>,
    /// Time window the counts cover
    pub time_range: TimeRange,
}

impl LogStats {
    /// Creates an all-zero stats object covering the given range.
    #[must_use]
    pub fn empty(time_range: TimeRange) -> Self {
        Self {
            time_range,
            ..Self::default()
        }
    }

    /// Counts one entry in every breakdown.
    pub fn record(&mut self, entry: &LogEntry) {
        self.total_count += 1;
        *self.count_by_level.entry(entry.level).or_insert(0) += 1;
        *self
            .count_by_service
            .entry(entry.service.clone())
            .or_insert(0) += 1;
        *self.count_by_event.entry(entry.event.clone()).or_insert(0) += 1;
    }

    /// Aggregates the entries matching `filter`.
    ///
    /// Filter bounds define the covered range where set; open bounds are
    /// narrowed to the oldest/newest matching timestamp.
    pub fn collect<'a>(filter: &LogFilter, entries: impl IntoIterator<Item = &'a LogEntry>) -> Self {
        let mut stats = Self::empty(filter.time_range());
        let mut oldest: Option<DateTime<Utc>> = None;
        let mut newest: Option<DateTime<Utc>> = None;

        for entry in entries.into_iter().filter(|e| filter.matches(e)) {
            stats.record(entry);
            oldest = Some(oldest.map_or(entry.timestamp, |t| t.min(entry.timestamp)));
            newest = Some(newest.map_or(entry.timestamp, |t| t.max(entry.timestamp)));
        }

        stats.time_range.from = stats.time_range.from.or(oldest);
        stats.time_range.to = stats.time_range.to.or(newest);
        stats
    }
}
