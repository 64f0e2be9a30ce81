//! Durable JSON-lines repository.
//!
//! Every stored entry is appended to a single file as one JSON object per
//! line. On open the file is replayed into a [`MemoryLogRepository`] which
//! serves all reads. Deletions rewrite the file from the surviving entries.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use futures::future::BoxFuture;
use logbook_core::{LogEntry, LogFilter, LogRepository, LogStats, Result};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::memory::{MemoryLogRepository, MemoryStoreConfig};

/// Configuration for [`FileLogRepository`].
#[derive(Debug, Clone)]
pub struct FileStoreConfig {
    /// Path of the JSON-lines file.
    pub path: PathBuf,
    /// Capacity of the in-memory view; zero means unbounded.
    pub max_entries: usize,
}

impl FileStoreConfig {
    /// Creates a config for the given file path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_entries: MemoryStoreConfig::default().max_entries,
        }
    }

    /// Sets the in-memory capacity.
    #[must_use]
    pub const fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }
}

/// File-backed log repository.
pub struct FileLogRepository {
    config: FileStoreConfig,
    memory: MemoryLogRepository,
    /// Serializes writers so file order matches insertion order.
    file: Mutex<File>,
}

impl FileLogRepository {
    /// Opens (or creates) the log file and replays its contents.
    ///
    /// Lines that fail to parse or validate are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the parent directory or the file cannot be
    /// created or read.
    pub fn open(config: FileStoreConfig) -> Result<Self> {
        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let memory = MemoryLogRepository::with_config(MemoryStoreConfig {
            max_entries: config.max_entries,
        });

        let replayed = if config.path.exists() {
            Self::replay(&config.path, &memory)?
        } else {
            0
        };

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.path)?;

        info!(
            path = %config.path.display(),
            replayed,
            "opened log file"
        );

        Ok(Self {
            config,
            memory,
            file: Mutex::new(file),
        })
    }

    /// Opens the repository at `path` with default capacity.
    pub fn at(path: impl Into<PathBuf>) -> Result<Self> {
        Self::open(FileStoreConfig::new(path))
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &FileStoreConfig {
        &self.config
    }

    /// Returns the in-memory view.
    #[must_use]
    pub const fn memory(&self) -> &MemoryLogRepository {
        &self.memory
    }

    /// Validates, indexes and appends an entry.
    ///
    /// If the write fails the entry is removed from the in-memory view again
    /// so readers never see an entry that is not on disk.
    #[allow(clippy::significant_drop_tightening)]
    pub fn append(&self, entry: &LogEntry) -> Result<()> {
        let line = serde_json::to_string(entry)?;

        let mut file = self.file.lock();
        self.memory.insert(entry.clone())?;

        if let Err(e) = writeln!(file, "{line}").and_then(|()| file.flush()) {
            self.memory.remove(&entry.id);
            return Err(e.into());
        }

        Ok(())
    }

    /// Removes matching entries and rewrites the file.
    ///
    /// The file is rewritten from the surviving entries first; memory only
    /// changes once the new file is in place.
    #[allow(clippy::significant_drop_tightening)]
    pub fn remove_matching(&self, filter: &LogFilter) -> Result<u64> {
        let mut file = self.file.lock();
        if self.memory.count_matching(filter)? == 0 {
            return Ok(0);
        }

        let survivors: Vec<LogEntry> = self
            .memory
            .snapshot()
            .into_iter()
            .filter(|e| !filter.matches(e))
            .collect();
        *file = self.rewrite(&survivors)?;

        let removed = self.memory.remove_matching(filter)?;
        debug!(removed, "compacted log file");
        Ok(removed)
    }

    /// Rewrites the file so it holds exactly the entries in memory.
    ///
    /// Entries evicted by the capacity limit are dropped from disk as well.
    pub fn compact(&self) -> Result<()> {
        let mut file = self.file.lock();
        *file = self.rewrite(&self.memory.snapshot())?;
        Ok(())
    }

    /// Writes `entries` to a temporary file, swaps it in and returns a fresh
    /// append handle. Must be called with the file lock held.
    fn rewrite(&self, entries: &[LogEntry]) -> Result<File> {
        let tmp = self.config.path.with_extension("jsonl.tmp");
        {
            let mut writer = BufWriter::new(File::create(&tmp)?);
            for entry in entries {
                serde_json::to_writer(&mut writer, entry)?;
                writer.write_all(b"\n")?;
            }
            writer.flush()?;
        }
        fs::rename(&tmp, &self.config.path)?;

        Ok(OpenOptions::new().append(true).open(&self.config.path)?)
    }

    fn replay(path: &Path, memory: &MemoryLogRepository) -> Result<usize> {
        let reader = BufReader::new(File::open(path)?);
        let mut replayed = 0;

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let entry = match serde_json::from_str::<LogEntry>(&line) {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(line = index + 1, error = %e, "skipping corrupt log line");
                    continue;
                }
            };

            match memory.insert(entry) {
                Ok(_) => replayed += 1,
                Err(e) => warn!(line = index + 1, error = %e, "skipping rejected log line"),
            }
        }

        Ok(replayed)
    }
}

// ============================================================================
// Trait Implementations
// ============================================================================

impl LogRepository for FileLogRepository {
    fn store<'a>(&'a self, entry: &'a LogEntry) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move { self.append(entry) })
    }

    fn get_by_id<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<LogEntry>> {
        Box::pin(async move { self.memory.get(id) })
    }

    fn query<'a>(&'a self, filter: &'a LogFilter) -> BoxFuture<'a, Result<Vec<LogEntry>>> {
        Box::pin(async move { self.memory.find(filter) })
    }

    fn count<'a>(&'a self, filter: &'a LogFilter) -> BoxFuture<'a, Result<u64>> {
        Box::pin(async move { self.memory.count_matching(filter) })
    }

    fn get_stats<'a>(&'a self, filter: &'a LogFilter) -> BoxFuture<'a, Result<LogStats>> {
        Box::pin(async move { self.memory.stats(filter) })
    }

    fn delete<'a>(&'a self, filter: &'a LogFilter) -> BoxFuture<'a, Result<u64>> {
        Box::pin(async move { self.remove_matching(filter) })
    }
}
