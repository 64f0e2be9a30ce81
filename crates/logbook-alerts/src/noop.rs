//! Alert channel that discards everything.

use futures::future::BoxFuture;
use logbook_core::{AlertService, LogEntry, Result};
use tracing::trace;

/// Accepts every alert without sending it anywhere.
///
/// The default channel when nothing else is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAlertService;

impl AlertService for NoopAlertService {
    fn name(&self) -> &str {
        "noop"
    }

    fn send_alert<'a>(&'a self, entry: &'a LogEntry) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            trace!(id = %entry.id, "alert discarded");
            Ok(())
        })
    }

    fn send_batch_alert<'a>(&'a self, _entries: &'a [LogEntry]) -> BoxFuture<'a, Result<()>> {
        Box::pin(async { Ok(()) })
    }

    fn is_healthy(&self) -> BoxFuture<'_, bool> {
        Box::pin(async { true })
    }
}
