//! Server configuration.
//!
//! Loaded from a TOML file, then overridden by command-line flags and
//! `LOGBOOK_*` environment variables in `main`.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use logbook_alerts::WebhookConfig;
use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

/// Configuration for the Logbook server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind the HTTP server to.
    pub bind_addr: SocketAddr,
    /// Deadline for a whole request, in seconds.
    pub request_timeout_secs: u64,
    /// CORS allowed origins (empty means all).
    pub cors_origins: Vec<String>,
    /// Storage backend.
    pub storage: StorageConfig,
    /// Alert channels.
    pub alerts: AlertConfig,
    /// API-key authentication.
    pub auth: AuthConfig,
    /// Per-client rate limiting.
    pub rate_limit: RateLimitConfig,
    /// Retention of old entries.
    pub retention: RetentionConfig,
}

/// Which repository implementation to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process memory only
    #[default]
    Memory,
    /// JSON-lines file
    File,
}

/// Storage settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Backend kind.
    pub backend: StorageBackend,
    /// Log file for the `file` backend.
    pub path: Option<PathBuf>,
    /// Maximum number of entries kept in memory; zero means unbounded.
    pub max_entries: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            path: None,
            max_entries: 100_000,
        }
    }
}

/// Alerting settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Webhooks to notify for ERROR and CRITICAL entries.
    pub webhooks: Vec<WebhookConfig>,
    /// Also write alerts to the server's own log.
    pub log_channel: bool,
    /// Upper bound on one alert delivery, in seconds.
    pub timeout_secs: u64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            webhooks: Vec::new(),
            log_channel: false,
            timeout_secs: 10,
        }
    }
}

/// Authentication settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Accepted API keys. Empty disables authentication.
    pub api_keys: Vec<String>,
}

/// Rate limiting settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Whether limiting is enabled.
    pub enabled: bool,
    /// Requests allowed per client and window.
    pub max_requests: u32,
    /// Window length in seconds.
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_requests: 100,
            window_secs: 1,
        }
    }
}

/// Retention settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionConfig {
    /// Maximum entry age in seconds. Unset keeps entries forever.
    pub max_age_secs: Option<u64>,
    /// How often the maintenance task runs, in seconds.
    pub sweep_interval_secs: u64,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            max_age_secs: None,
            sweep_interval_secs: 300,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            request_timeout_secs: 30,
            cors_origins: Vec::new(),
            storage: StorageConfig::default(),
            alerts: AlertConfig::default(),
            auth: AuthConfig::default(),
            rate_limit: RateLimitConfig::default(),
            retention: RetentionConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Create a new configuration with the specified bind address.
    #[must_use]
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            ..Self::default()
        }
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is invalid.
    pub fn from_file(path: impl AsRef<Path>) -> ServerResult<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ServerError::Config(format!(
                "failed to read config file '{}': {e}",
                path.as_ref().display()
            ))
        })?;

        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or fails validation.
    pub fn from_toml(content: &str) -> ServerResult<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| ServerError::Config(format!("invalid TOML: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> ServerResult<()> {
        if self.request_timeout_secs == 0 {
            return Err(ServerError::Config(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }

        if self.storage.backend == StorageBackend::File && self.storage.path.is_none() {
            return Err(ServerError::Config(
                "storage.path is required for the file backend".to_string(),
            ));
        }

        if self.alerts.timeout_secs == 0 {
            return Err(ServerError::Config(
                "alerts.timeout_secs must be greater than zero".to_string(),
            ));
        }

        for webhook in &self.alerts.webhooks {
            WebhookConfig::new(&webhook.name, &webhook.url)
                .map_err(|e| ServerError::Config(e.to_string()))?;
        }

        if self.auth.api_keys.iter().any(|k| k.trim().is_empty()) {
            return Err(ServerError::Config("API keys cannot be blank".to_string()));
        }

        if self.rate_limit.enabled
            && (self.rate_limit.max_requests == 0 || self.rate_limit.window_secs == 0)
        {
            return Err(ServerError::Config(
                "rate_limit.max_requests and rate_limit.window_secs must be greater than zero"
                    .to_string(),
            ));
        }

        if self.retention.max_age_secs == Some(0) {
            return Err(ServerError::Config(
                "retention.max_age_secs must be greater than zero".to_string(),
            ));
        }

        if self.retention.sweep_interval_secs == 0 {
            return Err(ServerError::Config(
                "retention.sweep_interval_secs must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Set the request deadline.
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_secs = timeout.as_secs();
        self
    }

    /// Add a CORS allowed origin.
    #[must_use]
    pub fn with_cors_origin(mut self, origin: impl Into<String>) -> Self {
        self.cors_origins.push(origin.into());
        self
    }

    /// Use the file backend at `path`.
    #[must_use]
    pub fn with_file_storage(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage.backend = StorageBackend::File;
        self.storage.path = Some(path.into());
        self
    }

    /// Set the in-memory capacity.
    #[must_use]
    pub const fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.storage.max_entries = max_entries;
        self
    }

    /// Add a webhook alert channel.
    #[must_use]
    pub fn with_webhook(mut self, webhook: WebhookConfig) -> Self {
        self.alerts.webhooks.push(webhook);
        self
    }

    /// Write alerts to the server log as well.
    #[must_use]
    pub const fn with_log_alerts(mut self, enabled: bool) -> Self {
        self.alerts.log_channel = enabled;
        self
    }

    /// Add an accepted API key.
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.auth.api_keys.push(key.into());
        self
    }

    /// Enable rate limiting.
    #[must_use]
    pub const fn with_rate_limit(mut self, max_requests: u32, window: Duration) -> Self {
        self.rate_limit = RateLimitConfig {
            enabled: true,
            max_requests,
            window_secs: window.as_secs(),
        };
        self
    }

    /// Delete entries older than `max_age`.
    #[must_use]
    pub const fn with_retention(mut self, max_age: Duration) -> Self {
        self.retention.max_age_secs = Some(max_age.as_secs());
        self
    }

    /// Returns the request deadline.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Returns the alert delivery timeout.
    #[must_use]
    pub const fn alert_timeout(&self) -> Duration {
        Duration::from_secs(self.alerts.timeout_secs)
    }

    /// Returns the maintenance interval.
    #[must_use]
    pub const fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.retention.sweep_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ServerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.alert_timeout(), Duration::from_secs(10));
        assert!(config.auth.api_keys.is_empty());
        assert!(!config.rate_limit.enabled);
    }

    #[test]
    fn parses_full_toml() {
        let toml = r#"
            bind_addr = "127.0.0.1:9090"
            request_timeout_secs = 15

            [storage]
            backend = "file"
            path = "/var/lib/logbook/logs.jsonl"
            max_entries = 5000

            [alerts]
            log_channel = true
            timeout_secs = 5

            [[alerts.webhooks]]
            name = "ops"
            url = "https://hooks.example.com/logbook"
            headers = { Authorization = "Bearer abc" }

            [auth]
            api_keys = ["secret-1", "secret-2"]

            [rate_limit]
            enabled = true
            max_requests = 50
            window_secs = 10

            [retention]
            max_age_secs = 604800
        "#;

        let config = ServerConfig::from_toml(toml).unwrap();

        assert_eq!(config.bind_addr.port(), 9090);
        assert_eq!(config.storage.backend, StorageBackend::File);
        assert_eq!(config.storage.max_entries, 5000);
        assert_eq!(config.alerts.webhooks.len(), 1);
        assert_eq!(config.alerts.webhooks[0].timeout_secs, 10);
        assert_eq!(config.auth.api_keys.len(), 2);
        assert_eq!(config.rate_limit.max_requests, 50);
        assert_eq!(config.retention.max_age_secs, Some(604_800));
        assert_eq!(config.retention.sweep_interval_secs, 300);
    }

    #[test]
    fn empty_toml_uses_defaults() {
        let config = ServerConfig::from_toml("").unwrap();
        assert_eq!(config, ServerConfig::default());
    }

    #[test]
    fn rejects_file_backend_without_path() {
        let err = ServerConfig::from_toml("[storage]\nbackend = \"file\"").unwrap_err();
        assert!(err.to_string().contains("storage.path"));
    }

    #[test]
    fn rejects_bad_webhook_url() {
        let toml = r#"
            [[alerts.webhooks]]
            name = "ops"
            url = "not-a-url"
        "#;
        assert!(ServerConfig::from_toml(toml).is_err());
    }

    #[test]
    fn rejects_blank_api_key() {
        let config = ServerConfig::default().with_api_key(" ");
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_rate_limit() {
        let config = ServerConfig::default().with_rate_limit(0, Duration::from_secs(1));
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_malformed_toml() {
        let err = ServerConfig::from_toml("bind_addr = ").unwrap_err();
        assert!(err.to_string().contains("invalid TOML"));
    }

    #[test]
    fn missing_file_is_reported() {
        let err = ServerConfig::from_file("/nonexistent/logbook.toml").unwrap_err();
        assert!(err.to_string().contains("failed to read config file"));
    }

    #[test]
    fn builders_compose() {
        let config = ServerConfig::new("127.0.0.1:0".parse().unwrap())
            .with_file_storage("/tmp/logs.jsonl")
            .with_max_entries(10)
            .with_log_alerts(true)
            .with_api_key("k")
            .with_retention(Duration::from_secs(3600))
            .with_request_timeout(Duration::from_secs(5))
            .with_cors_origin("https://ui.example.com");

        assert!(config.validate().is_ok());
        assert_eq!(config.storage.backend, StorageBackend::File);
        assert_eq!(config.retention.max_age_secs, Some(3600));
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
    }
}
