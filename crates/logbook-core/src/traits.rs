//! Collaborator contracts for the ingestion and query pipeline.
//!
//! The use cases never touch storage, alerting, identifiers or the clock
//! directly; each is injected behind one of these traits so hosts can swap
//! backends and tests can substitute deterministic fakes.
//!
//! Async methods return [`BoxFuture`] so the traits stay object safe and can
//! be shared as `Arc<dyn LogRepository>`. Dropping a returned future cancels
//! the call; callers bound it with `tokio::time::timeout` where a deadline is
//! needed.

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use uuid::Uuid;

use crate::error::Result;
use crate::filter::{LogFilter, LogStats};
use crate::types::LogEntry;

/// Storage backend for log entries.
///
/// Implementations must be safe to share between concurrently handled
/// requests. Each call is expected to be atomic on its own; `query` and
/// `count` for the same filter are separate calls and may observe different
/// snapshots under concurrent writes.
pub trait LogRepository: Send + Sync {
    /// Persists a new entry.
    ///
    /// Implementations re-validate the entry and reject malformed ones with
    /// `LogError::InvalidEntry`.
    fn store<'a>(&'a self, entry: &'a LogEntry) -> BoxFuture<'a, Result<()>>;

    /// Fetches one entry by ID, or `LogError::NotFound`.
    fn get_by_id<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<LogEntry>>;

    /// Returns one page of matching entries, ordered per the filter.
    ///
    /// A `limit` of zero returns every match after `offset`.
    fn query<'a>(&'a self, filter: &'a LogFilter) -> BoxFuture<'a, Result<Vec<LogEntry>>>;

    /// Counts all matching entries, ignoring pagination.
    fn count<'a>(&'a self, filter: &'a LogFilter) -> BoxFuture<'a, Result<u64>>;

    /// Aggregates matching entries by level, service and event.
    fn get_stats<'a>(&'a self, filter: &'a LogFilter) -> BoxFuture<'a, Result<LogStats>>;

    /// Removes every matching entry and returns how many were removed.
    fn delete<'a>(&'a self, filter: &'a LogFilter) -> BoxFuture<'a, Result<u64>>;
}

/// Out-of-band notifier for severe entries.
pub trait AlertService: Send + Sync {
    /// Returns the name of this alert backend.
    fn name(&self) -> &str;

    /// Sends an alert for a single entry.
    fn send_alert<'a>(&'a self, entry: &'a LogEntry) -> BoxFuture<'a, Result<()>>;

    /// Sends one digest alert covering several entries.
    fn send_batch_alert<'a>(&'a self, entries: &'a [LogEntry]) -> BoxFuture<'a, Result<()>>;

    /// Probes whether the backend is currently able to deliver.
    fn is_healthy(&self) -> BoxFuture<'_, bool>;
}

/// Source of unique entry identifiers.
pub trait IdGenerator: Send + Sync {
    /// Produces a new identifier.
    fn generate(&self) -> Result<String>;
}

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Random UUID v4 identifiers.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn generate(&self) -> Result<String> {
        Ok(Uuid::new_v4().to_string())
    }
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
