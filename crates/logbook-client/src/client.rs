//! HTTP client for the Logbook server.

use std::time::Duration;

use chrono::{DateTime, Utc};
use logbook_core::usecase::{CreateLogResponse, GetLogStatsResponse, QueryLogsResponse};
use logbook_core::{LogEntry, LogLevel, Metadata};
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ClientError, Result};
use crate::query::QueryParams;

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Body of `POST /log`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRequest {
    /// Level name
    pub level: LogLevel,
    /// Emitting service
    pub service: String,
    /// Event name
    pub event: String,
    /// Message text
    pub message: String,
    /// Optional user ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    /// Optional chat ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<i64>,
    /// Extra fields
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
}

/// Response of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    /// `"healthy"` while the server runs
    pub status: String,
    /// Server time of the check
    pub timestamp: DateTime<Utc>,
    /// Server version
    pub version: String,
    /// Service name
    pub service: String,
    /// Whether the server's alert channel is healthy
    #[serde(default)]
    pub alerts_healthy: bool,
    /// Server uptime in seconds
    #[serde(default)]
    pub uptime_secs: u64,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Typed client for one emitting service.
///
/// Every entry sent through the client is stamped with its service name.
#[derive(Debug, Clone)]
pub struct LogbookClient {
    base_url: String,
    service_name: String,
    api_key: Option<String>,
    http: reqwest::Client,
}

impl LogbookClient {
    /// Creates a client with the default timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::MissingBaseUrl`] if `base_url` is blank.
    pub fn new(base_url: impl Into<String>, service_name: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, service_name, DEFAULT_TIMEOUT)
    }

    /// Creates a client with a custom request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::MissingBaseUrl`] if `base_url` is blank, or an
    /// HTTP error if the underlying client cannot be built.
    pub fn with_timeout(
        base_url: impl Into<String>,
        service_name: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ClientError::MissingBaseUrl);
        }

        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url,
            service_name: service_name.into(),
            api_key: None,
            http,
        })
    }

    /// Sends `key` as a bearer token with every request.
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Returns the server base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the service name stamped on every entry.
    #[must_use]
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Sends one entry for this client's service.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects it.
    pub async fn send(
        &self,
        level: LogLevel,
        event: impl Into<String>,
        message: impl Into<String>,
        metadata: Metadata,
    ) -> Result<CreateLogResponse> {
        let request = LogRequest {
            level,
            service: self.service_name.clone(),
            event: event.into(),
            message: message.into(),
            user_id: None,
            chat_id: None,
            metadata,
        };
        self.send_request(&request).await
    }

    /// Sends a fully specified entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects it.
    pub async fn send_request(&self, request: &LogRequest) -> Result<CreateLogResponse> {
        let response = self
            .authorized(self.http.post(self.url("/log")))
            .json(request)
            .send()
            .await?;

        let created: CreateLogResponse = decode(response).await?;
        debug!(
            id = %created.id,
            level = %request.level,
            event = %request.event,
            alert_sent = created.alert_sent,
            "log entry sent"
        );
        Ok(created)
    }

    /// Searches entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects the
    /// criteria.
    pub async fn query(&self, params: &QueryParams) -> Result<QueryLogsResponse> {
        let response = self
            .authorized(self.http.get(self.url("/log")))
            .query(&params.to_pairs())
            .send()
            .await?;
        decode(response).await
    }

    /// Aggregates counts over matching entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects the
    /// criteria.
    pub async fn stats(&self, params: &QueryParams) -> Result<GetLogStatsResponse> {
        let response = self
            .authorized(self.http.get(self.url("/log/stats")))
            .query(&params.to_pairs())
            .send()
            .await?;
        decode(response).await
    }

    /// Fetches one entry by ID.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Status`] with status 404 if no such entry
    /// exists.
    pub async fn get(&self, id: &str) -> Result<LogEntry> {
        let response = self
            .authorized(self.http.get(self.url(&format!("/log/{id}"))))
            .send()
            .await?;
        decode(response).await
    }

    /// Checks server liveness.
    ///
    /// # Errors
    ///
    /// Returns an error if the server is unreachable or unhealthy.
    pub async fn health_status(&self) -> Result<HealthStatus> {
        let response = self.http.get(self.url("/health")).send().await?;
        decode(response).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }
}

/// Decodes a success body or turns an error response into
/// [`ClientError::Status`].
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    let bytes = response.bytes().await?;

    if !status.is_success() {
        let message = serde_json::from_slice::<ErrorBody>(&bytes).map_or_else(
            |_| status.canonical_reason().unwrap_or("unknown").to_string(),
            |body| body.error,
        );
        return Err(ClientError::Status {
            status: status.as_u16(),
            message,
        });
    }

    Ok(serde_json::from_slice(&bytes)?)
}
