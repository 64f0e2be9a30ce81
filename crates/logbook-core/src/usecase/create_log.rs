//! Ingestion of a single log event.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{LogError, Result};
use crate::traits::{AlertService, Clock, IdGenerator, LogRepository};
use crate::types::{LogEntry, is_blank};
use crate::usecase::dto::{CreateLogRequest, CreateLogResponse};

/// Default upper bound on a single alert delivery.
pub const DEFAULT_ALERT_TIMEOUT: Duration = Duration::from_secs(10);

/// Validates, stores and (for severe levels) alerts on a new log entry.
///
/// Storage is always attempted before alerting. Alert delivery is best
/// effort: failures and timeouts are logged and reported through
/// `alert_sent = false`, never as an error.
#[derive(Clone)]
pub struct CreateLogUseCase {
    repository: Arc<dyn LogRepository>,
    alerts: Arc<dyn AlertService>,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
    alert_timeout: Duration,
}

impl CreateLogUseCase {
    /// Creates the use case with its collaborators.
    #[must_use]
    pub fn new(
        repository: Arc<dyn LogRepository>,
        alerts: Arc<dyn AlertService>,
        ids: Arc<dyn IdGenerator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            alerts,
            ids,
            clock,
            alert_timeout: DEFAULT_ALERT_TIMEOUT,
        }
    }

    /// Sets the alert delivery timeout.
    #[must_use]
    pub const fn with_alert_timeout(mut self, timeout: Duration) -> Self {
        self.alert_timeout = timeout;
        self
    }

    /// Returns the alert delivery timeout.
    #[must_use]
    pub const fn alert_timeout(&self) -> Duration {
        self.alert_timeout
    }

    /// Runs the use case.
    ///
    /// # Errors
    ///
    /// - `LogError::InvalidEntry` if a required field is blank, checked
    ///   before any ID or timestamp is generated
    /// - `LogError::IdGenerationFailed` if no ID could be produced
    /// - any error returned by the repository's `store`, unchanged
    pub async fn execute(&self, request: CreateLogRequest) -> Result<CreateLogResponse> {
        validate_request(&request)?;

        let entry = LogEntry {
            id: self.ids.generate()?,
            level: request.level,
            service: request.service,
            event: request.event,
            timestamp: self.clock.now(),
            user_id: request.user_id,
            chat_id: request.chat_id,
            message: request.message,
            metadata: request.metadata,
        };

        if !entry.is_valid() {
            return Err(LogError::InvalidEntry(
                "generated ID or timestamp is empty".to_string(),
            ));
        }

        self.repository.store(&entry).await?;

        let alert_sent = entry.should_alert() && self.dispatch_alert(&entry).await;

        debug!(
            id = %entry.id,
            level = %entry.level,
            service = %entry.service,
            event = %entry.event,
            alert_sent,
            "log entry stored"
        );

        Ok(CreateLogResponse {
            id: entry.id,
            timestamp: entry.timestamp,
            success: true,
            alert_sent,
        })
    }

    async fn dispatch_alert(&self, entry: &LogEntry) -> bool {
        match tokio::time::timeout(self.alert_timeout, self.alerts.send_alert(entry)).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                warn!(
                    id = %entry.id,
                    channel = %self.alerts.name(),
                    error = %e,
                    "alert delivery failed"
                );
                false
            }
            Err(_) => {
                warn!(
                    id = %entry.id,
                    channel = %self.alerts.name(),
                    timeout_ms = self.alert_timeout.as_millis() as u64,
                    "alert delivery timed out"
                );
                false
            }
        }
    }
}

fn validate_request(request: &CreateLogRequest) -> Result<()> {
    if !request.level.is_valid() {
        return Err(LogError::InvalidEntry(format!(
            "invalid level: {}",
            request.level
        )));
    }

    for (field, value) in [
        ("service", &request.service),
        ("event", &request.event),
        ("message", &request.message),
    ] {
        if is_blank(value) {
            return Err(LogError::InvalidEntry(format!("{field} must not be blank")));
        }
    }

    Ok(())
}
