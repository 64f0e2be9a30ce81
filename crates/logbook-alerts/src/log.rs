//! Tracing-backed alert channel.

use futures::future::BoxFuture;
use logbook_core::{AlertService, LogEntry, LogLevel, Result};
use tracing::{error, warn};

/// Writes alerts to the process's own log output.
///
/// Useful in development and as a last-resort channel behind a fan-out.
#[derive(Debug, Clone)]
pub struct LogAlertService {
    name: String,
}

impl LogAlertService {
    /// Creates a new log channel.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for LogAlertService {
    fn default() -> Self {
        Self::new("log")
    }
}

fn emit(entry: &LogEntry) {
    if entry.level == LogLevel::Critical {
        error!(
            id = %entry.id,
            service = %entry.service,
            event = %entry.event,
            level = %entry.level,
            message = %entry.message,
            "ALERT"
        );
    } else {
        warn!(
            id = %entry.id,
            service = %entry.service,
            event = %entry.event,
            level = %entry.level,
            message = %entry.message,
            "ALERT"
        );
    }
}

impl AlertService for LogAlertService {
    fn name(&self) -> &str {
        &self.name
    }

    fn send_alert<'a>(&'a self, entry: &'a LogEntry) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            emit(entry);
            Ok(())
        })
    }

    fn send_batch_alert<'a>(&'a self, entries: &'a [LogEntry]) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            warn!(channel = %self.name, count = entries.len(), "ALERT digest");
            entries.iter().for_each(emit);
            Ok(())
        })
    }

    fn is_healthy(&self) -> BoxFuture<'_, bool> {
        Box::pin(async { true })
    }
}
