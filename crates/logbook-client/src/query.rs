//! Query-string builder for `GET /log` and `GET /log/stats`.

use chrono::{DateTime, SecondsFormat, Utc};
use logbook_core::{LogFilter, LogLevel, SortField, SortOrder, TimeRange};

/// Search criteria sent as query parameters.
///
/// Thin wrapper over [`LogFilter`] that knows the wire names of every
/// parameter. Unset criteria are omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    filter: LogFilter,
}

impl QueryParams {
    /// Creates empty criteria matching every entry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a service to match.
    #[must_use]
    pub fn service(mut self, service: impl Into<String>) -> Self {
        self.filter = self.filter.with_service(service);
        self
    }

    /// Adds an event to match.
    #[must_use]
    pub fn event(mut self, event: impl Into<String>) -> Self {
        self.filter = self.filter.with_event(event);
        self
    }

    /// Adds a level to match.
    #[must_use]
    pub fn level(mut self, level: LogLevel) -> Self {
        self.filter = self.filter.with_level(level);
        self
    }

    /// Restricts to a user ID.
    #[must_use]
    pub fn user_id(mut self, user_id: i64) -> Self {
        self.filter = self.filter.with_user_id(user_id);
        self
    }

    /// Restricts to a chat ID.
    #[must_use]
    pub fn chat_id(mut self, chat_id: i64) -> Self {
        self.filter = self.filter.with_chat_id(chat_id);
        self
    }

    /// Restricts to messages containing `text`, ignoring case.
    #[must_use]
    pub fn message_contains(mut self, text: impl Into<String>) -> Self {
        self.filter = self.filter.with_contains(text);
        self
    }

    /// Restricts to a closed time window.
    #[must_use]
    pub fn between(mut self, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Self {
        self.filter = self.filter.with_time_range(TimeRange::new(from, to));
        self
    }

    /// Sets the page.
    #[must_use]
    pub fn page(mut self, limit: i64, offset: i64) -> Self {
        self.filter = self.filter.with_page(limit, offset);
        self
    }

    /// Sets the ordering.
    #[must_use]
    pub fn sort(mut self, field: SortField, order: SortOrder) -> Self {
        self.filter = self.filter.with_sort(field, order);
        self
    }

    /// Returns the underlying filter.
    #[must_use]
    pub const fn filter(&self) -> &LogFilter {
        &self.filter
    }

    /// Renders the criteria as query-string pairs.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let f = &self.filter;
        let mut pairs = Vec::new();

        pairs.extend(f.services.iter().map(|s| ("service", s.clone())));
        pairs.extend(f.events.iter().map(|e| ("event", e.clone())));
        pairs.extend(f.levels.iter().map(|l| ("level", l.as_str().to_string())));

        if let Some(user_id) = f.user_id {
            pairs.push(("user_id", user_id.to_string()));
        }
        if let Some(chat_id) = f.chat_id {
            pairs.push(("chat_id", chat_id.to_string()));
        }
        if let Some(text) = &f.message_contains {
            pairs.push(("message_contains", text.clone()));
        }
        if let Some(from) = f.time_from {
            pairs.push(("time_from", rfc3339(from)));
        }
        if let Some(to) = f.time_to {
            pairs.push(("time_to", rfc3339(to)));
        }
        if f.limit != 0 {
            pairs.push(("limit", f.limit.to_string()));
        }
        if f.offset != 0 {
            pairs.push(("offset", f.offset.to_string()));
        }
        if let Some(field) = f.sort_by {
            pairs.push(("sort_by", field.as_str().to_string()));
        }
        if let Some(order) = f.sort_order {
            pairs.push(("sort_order", order.as_str().to_string()));
        }

        pairs
    }
}

impl From<LogFilter> for QueryParams {
    fn from(filter: LogFilter) -> Self {
        Self { filter }
    }
}

fn rfc3339(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}
