//! Age-based retention.

use std::time::Duration;

use chrono::{DateTime, Utc};
use logbook_core::{LogFilter, LogRepository, Result, TimeRange};
use tracing::info;

/// Deletes entries older than `max_age`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Maximum age of a kept entry.
    pub max_age: Duration,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            max_age: Duration::from_secs(7 * 24 * 60 * 60), // 7 days
        }
    }
}

impl RetentionPolicy {
    /// Creates a policy keeping entries for `max_age`.
    #[must_use]
    pub const fn new(max_age: Duration) -> Self {
        Self { max_age }
    }

    /// Returns the oldest timestamp still retained at `now`, or `None` if the
    /// age reaches past the representable range.
    #[must_use]
    pub fn cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let age = chrono::Duration::from_std(self.max_age).ok()?;
        now.checked_sub_signed(age)
    }

    /// Returns true if an entry stamped `timestamp` has expired at `now`.
    #[must_use]
    pub fn is_expired(&self, timestamp: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        self.cutoff(now).is_some_and(|cutoff| timestamp < cutoff)
    }

    /// Builds the delete filter for `now`.
    ///
    /// The bound is moved back one nanosecond so an entry exactly at the
    /// cutoff is kept.
    #[must_use]
    pub fn expired_filter(&self, now: DateTime<Utc>) -> Option<LogFilter> {
        let cutoff = self.cutoff(now)?;
        let to = cutoff.checked_sub_signed(chrono::Duration::nanoseconds(1))?;
        Some(LogFilter::new().with_time_range(TimeRange::new(None, Some(to))))
    }

    /// Deletes expired entries from `repository`.
    ///
    /// Returns the number of entries removed.
    pub async fn sweep(&self, repository: &dyn LogRepository, now: DateTime<Utc>) -> Result<u64> {
        let Some(filter) = self.expired_filter(now) else {
            return Ok(0);
        };

        let removed = repository.delete(&filter).await?;
        if removed > 0 {
            info!(
                removed,
                max_age_secs = self.max_age.as_secs(),
                "expired log entries removed"
            );
        }
        Ok(removed)
    }
}
