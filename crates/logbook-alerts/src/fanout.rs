//! Delivery to several channels at once.

use std::sync::Arc;

use futures::future::{BoxFuture, join_all};
use logbook_core::{AlertService, LogEntry, LogError, Result};
use tracing::debug;

use crate::error::AlertError;

/// Sends every alert to all configured channels concurrently.
///
/// Delivery succeeds if at least one channel succeeded. With no channels
/// every delivery fails.
#[derive(Clone, Default)]
pub struct FanoutAlertService {
    channels: Vec<Arc<dyn AlertService>>,
}

impl FanoutAlertService {
    /// Creates an empty fan-out.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a channel.
    #[must_use]
    pub fn with_channel(mut self, channel: Arc<dyn AlertService>) -> Self {
        self.channels.push(channel);
        self
    }

    /// Returns the number of channels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Returns true if there are no channels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    fn settle(&self, outcomes: Vec<Result<()>>) -> Result<()> {
        let delivered = outcomes.iter().filter(|o| o.is_ok()).count();
        debug!(
            channels = self.channels.len(),
            delivered,
            "fan-out alert settled"
        );

        if delivered > 0 {
            Ok(())
        } else {
            Err(LogError::from(AlertError::NoChannelDelivered))
        }
    }
}

impl AlertService for FanoutAlertService {
    fn name(&self) -> &str {
        "fanout"
    }

    fn send_alert<'a>(&'a self, entry: &'a LogEntry) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let outcomes = join_all(self.channels.iter().map(|c| c.send_alert(entry))).await;
            self.settle(outcomes)
        })
    }

    fn send_batch_alert<'a>(&'a self, entries: &'a [LogEntry]) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let outcomes =
                join_all(self.channels.iter().map(|c| c.send_batch_alert(entries))).await;
            self.settle(outcomes)
        })
    }

    fn is_healthy(&self) -> BoxFuture<'_, bool> {
        Box::pin(async move {
            join_all(self.channels.iter().map(|c| c.is_healthy()))
                .await
                .into_iter()
                .any(|healthy| healthy)
        })
    }
}
