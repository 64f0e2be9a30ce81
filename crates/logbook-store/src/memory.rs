//! Thread-safe in-memory repository.
//!
//! This module provides:
//! - [`MemoryStoreConfig`]: Capacity settings
//! - [`MemoryLogRepository`]: `RwLock`-guarded entry list with an ID index
//! - Implementation of [`LogRepository`] for use by the core use cases

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};

use futures::future::BoxFuture;
use logbook_core::{LogEntry, LogError, LogFilter, LogRepository, LogStats, Result};
use parking_lot::RwLock;
use tracing::debug;

/// Configuration for the in-memory repository.
#[derive(Debug, Clone)]
pub struct MemoryStoreConfig {
    /// Maximum number of entries to keep; the oldest are evicted first.
    /// Zero means unbounded.
    pub max_entries: usize,
}

impl Default for MemoryStoreConfig {
    fn default() -> Self {
        Self {
            max_entries: 100_000,
        }
    }
}

#[derive(Default)]
struct Inner {
    /// Entries in insertion order
    entries: VecDeque<LogEntry>,
    /// Fast lookup by ID
    by_id: HashMap<String, LogEntry>,
}

/// In-process log repository.
///
/// Every operation takes the lock once, so each call observes a single
/// consistent snapshot.
pub struct MemoryLogRepository {
    config: MemoryStoreConfig,
    inner: RwLock<Inner>,
    available: AtomicBool,
}

impl Default for MemoryLogRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryLogRepository {
    /// Creates an empty repository with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(MemoryStoreConfig::default())
    }

    /// Creates an empty repository with the given configuration.
    #[must_use]
    pub fn with_config(config: MemoryStoreConfig) -> Self {
        Self {
            config,
            inner: RwLock::new(Inner::default()),
            available: AtomicBool::new(true),
        }
    }

    /// Creates an empty repository holding at most `max_entries`.
    #[must_use]
    pub fn with_capacity(max_entries: usize) -> Self {
        Self::with_config(MemoryStoreConfig { max_entries })
    }

    /// Switches the repository on or off.
    ///
    /// While unavailable every operation fails with
    /// `LogError::StorageUnavailable`.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::Release);
    }

    /// Returns whether the repository is serving requests.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::Acquire)
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &MemoryStoreConfig {
        &self.config
    }

    /// Returns the number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().entries.is_empty()
    }

    /// Removes every entry.
    pub fn clear(&self) {
        let mut inner = self.inner.write();
        inner.entries.clear();
        inner.by_id.clear();
    }

    /// Returns all entries in insertion order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.inner.read().entries.iter().cloned().collect()
    }

    /// Validates and inserts an entry.
    ///
    /// Returns the entry evicted to make room, if any.
    ///
    /// # Errors
    ///
    /// `StorageUnavailable` when switched off, `InvalidEntry` for a malformed
    /// entry or an ID that is already stored.
    #[allow(clippy::significant_drop_tightening)]
    pub fn insert(&self, entry: LogEntry) -> Result<Option<LogEntry>> {
        self.ensure_available()?;

        if !entry.is_valid() {
            return Err(LogError::InvalidEntry(format!(
                "entry {:?} has blank required fields",
                entry.id
            )));
        }

        let mut inner = self.inner.write();
        if inner.by_id.contains_key(&entry.id) {
            return Err(LogError::InvalidEntry(format!(
                "duplicate log ID: {}",
                entry.id
            )));
        }

        inner.by_id.insert(entry.id.clone(), entry.clone());
        inner.entries.push_back(entry);

        let mut evicted = None;
        if self.config.max_entries > 0 {
            while inner.entries.len() > self.config.max_entries {
                if let Some(removed) = inner.entries.pop_front() {
                    inner.by_id.remove(&removed.id);
                    debug!(id = %removed.id, "evicted oldest log entry");
                    evicted = Some(removed);
                }
            }
        }

        Ok(evicted)
    }

    /// Fetches an entry by ID.
    pub fn get(&self, id: &str) -> Result<LogEntry> {
        self.ensure_available()?;
        self.inner
            .read()
            .by_id
            .get(id)
            .cloned()
            .ok_or_else(|| LogError::NotFound(id.to_string()))
    }

    /// Returns one sorted page of matching entries.
    ///
    /// A zero `limit` returns everything after `offset`.
    pub fn find(&self, filter: &LogFilter) -> Result<Vec<LogEntry>> {
        self.ensure_available()?;

        let mut matched: Vec<LogEntry> = self
            .inner
            .read()
            .entries
            .iter()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        matched.sort_by(|a, b| filter.compare(a, b));

        let offset = usize::try_from(filter.offset).unwrap_or(0);
        let limit = match usize::try_from(filter.limit) {
            Ok(0) | Err(_) => usize::MAX,
            Ok(n) => n,
        };

        Ok(matched.into_iter().skip(offset).take(limit).collect())
    }

    /// Counts matching entries, ignoring pagination.
    pub fn count_matching(&self, filter: &LogFilter) -> Result<u64> {
        self.ensure_available()?;
        let inner = self.inner.read();
        Ok(inner.entries.iter().filter(|e| filter.matches(e)).count() as u64)
    }

    /// Aggregates matching entries.
    pub fn stats(&self, filter: &LogFilter) -> Result<LogStats> {
        self.ensure_available()?;
        Ok(LogStats::collect(filter, self.inner.read().entries.iter()))
    }

    /// Removes one entry by ID, returning it if it was present.
    pub fn remove(&self, id: &str) -> Option<LogEntry> {
        let mut inner = self.inner.write();
        let removed = inner.by_id.remove(id)?;
        inner.entries.retain(|e| e.id != id);
        Some(removed)
    }

    /// Removes matching entries and returns how many were removed.
    #[allow(clippy::significant_drop_tightening)]
    pub fn remove_matching(&self, filter: &LogFilter) -> Result<u64> {
        self.ensure_available()?;

        let mut inner = self.inner.write();
        let before = inner.entries.len();
        let Inner { entries, by_id } = &mut *inner;
        entries.retain(|e| {
            let keep = !filter.matches(e);
            if !keep {
                by_id.remove(&e.id);
            }
            keep
        });

        Ok((before - entries.len()) as u64)
    }

    fn ensure_available(&self) -> Result<()> {
        if self.is_available() {
            Ok(())
        } else {
            Err(LogError::StorageUnavailable(
                "in-memory store is switched off".to_string(),
            ))
        }
    }
}

// ============================================================================
// Trait Implementations
// ============================================================================

impl LogRepository for MemoryLogRepository {
    fn store<'a>(&'a self, entry: &'a LogEntry) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move { self.insert(entry.clone()).map(|_| ()) })
    }

    fn get_by_id<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<LogEntry>> {
        Box::pin(async move { self.get(id) })
    }

    fn query<'a>(&'a self, filter: &'a LogFilter) -> BoxFuture<'a, Result<Vec<LogEntry>>> {
        Box::pin(async move { self.find(filter) })
    }

    fn count<'a>(&'a self, filter: &'a LogFilter) -> BoxFuture<'a, Result<u64>> {
        Box::pin(async move { self.count_matching(filter) })
    }

    fn get_stats<'a>(&'a self, filter: &'a LogFilter) -> BoxFuture<'a, Result<LogStats>> {
        Box::pin(async move { self.stats(filter) })
    }

    fn delete<'a>(&'a self, filter: &'a LogFilter) -> BoxFuture<'a, Result<u64>> {
        Box::pin(async move { self.remove_matching(filter) })
    }
}
