//! Webhook alert channel.
//!
//! Alerts are POSTed as JSON to a configured URL. A single alert is sent as an
//! [`AlertPayload`], a digest as a [`BatchAlertPayload`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures::future::BoxFuture;
use logbook_core::{AlertService, LogEntry};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{AlertError, Result};
use crate::payload::{AlertPayload, BatchAlertPayload};

/// Configuration for a webhook channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// The name of this webhook.
    pub name: String,
    /// The URL to send alerts to.
    pub url: String,
    /// HTTP headers to include with requests.
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// Timeout in seconds for HTTP requests.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

const fn default_timeout_secs() -> u64 {
    10
}

impl WebhookConfig {
    /// Creates a new webhook configuration.
    ///
    /// # Errors
    ///
    /// Returns `AlertError::InvalidConfig` if the URL is empty or not HTTP(S).
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Result<Self> {
        let url = url.into();
        if url.trim().is_empty() {
            return Err(AlertError::InvalidConfig {
                reason: "webhook URL cannot be empty".to_string(),
            });
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(AlertError::InvalidConfig {
                reason: format!("webhook URL must be http or https: {url}"),
            });
        }

        Ok(Self {
            name: name.into(),
            url,
            headers: HashMap::new(),
            timeout_secs: default_timeout_secs(),
        })
    }

    /// Adds a header to the configuration.
    #[must_use]
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Sets the timeout.
    #[must_use]
    pub const fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// Alert service that POSTs to a webhook.
///
/// Any transport error or non-2xx response is a delivery failure.
/// [`is_healthy`](AlertService::is_healthy) reports the outcome of the most
/// recent delivery.
#[derive(Debug)]
pub struct WebhookAlertService {
    config: WebhookConfig,
    client: reqwest::Client,
    healthy: AtomicBool,
}

impl WebhookAlertService {
    /// Creates the channel and its HTTP client.
    ///
    /// # Errors
    ///
    /// Returns `AlertError::InvalidConfig` if the HTTP client cannot be built.
    pub fn new(config: WebhookConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AlertError::InvalidConfig {
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            config,
            client,
            healthy: AtomicBool::new(true),
        })
    }

    /// Returns the webhook URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.config.url
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &WebhookConfig {
        &self.config
    }

    async fn post<T: Serialize + Sync>(&self, body: &T) -> Result<()> {
        let mut request = self.client.post(&self.config.url).json(body);
        for (key, value) in &self.config.headers {
            request = request.header(key, value);
        }

        let outcome = match request.send().await {
            Ok(response) if response.status().is_success() => {
                debug!(
                    channel = %self.config.name,
                    status = response.status().as_u16(),
                    "webhook accepted alert"
                );
                Ok(())
            }
            Ok(response) => Err(AlertError::Rejected {
                channel: self.config.name.clone(),
                status: response.status().as_u16(),
            }),
            Err(e) => Err(AlertError::DeliveryFailed {
                channel: self.config.name.clone(),
                reason: e.to_string(),
            }),
        };

        self.healthy.store(outcome.is_ok(), Ordering::Release);
        if let Err(ref e) = outcome {
            warn!(channel = %self.config.name, url = %self.config.url, error = %e, "webhook delivery failed");
        }
        outcome
    }
}

impl AlertService for WebhookAlertService {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn send_alert<'a>(&'a self, entry: &'a LogEntry) -> BoxFuture<'a, logbook_core::Result<()>> {
        Box::pin(async move {
            self.post(&AlertPayload::from(entry)).await?;
            Ok(())
        })
    }

    fn send_batch_alert<'a>(
        &'a self,
        entries: &'a [LogEntry],
    ) -> BoxFuture<'a, logbook_core::Result<()>> {
        Box::pin(async move {
            if entries.is_empty() {
                return Ok(());
            }
            self.post(&BatchAlertPayload::from_entries(entries)).await?;
            Ok(())
        })
    }

    fn is_healthy(&self) -> BoxFuture<'_, bool> {
        Box::pin(async move { self.healthy.load(Ordering::Acquire) })
    }
}
