//! Shared state for request handlers.

use std::sync::Arc;
use std::time::{Duration, Instant};

use logbook_alerts::{
    FanoutAlertService, LogAlertService, NoopAlertService, WebhookAlertService,
};
use logbook_core::usecase::{CreateLogUseCase, GetLogUseCase, GetStatsUseCase, QueryLogsUseCase};
use logbook_core::{AlertService, Clock, IdGenerator, LogRepository, SystemClock, UuidGenerator};
use logbook_store::{FileLogRepository, FileStoreConfig, MemoryLogRepository, RetentionPolicy};
use tracing::info;

use crate::auth::ApiKeys;
use crate::config::{ServerConfig, StorageBackend};
use crate::error::{ServerError, ServerResult};
use crate::rate_limit::RequestRateLimiter;

/// Everything a request handler needs, wired once at startup.
pub struct AppState {
    config: ServerConfig,
    repository: Arc<dyn LogRepository>,
    alerts: Arc<dyn AlertService>,
    create_log: CreateLogUseCase,
    query_logs: QueryLogsUseCase,
    get_stats: GetStatsUseCase,
    get_log: GetLogUseCase,
    api_keys: ApiKeys,
    rate_limiter: RequestRateLimiter,
    retention: Option<RetentionPolicy>,
    started_at: Instant,
}

impl AppState {
    /// Wires the state around an existing repository and alert channel.
    #[must_use]
    pub fn new(
        config: ServerConfig,
        repository: Arc<dyn LogRepository>,
        alerts: Arc<dyn AlertService>,
    ) -> Self {
        Self::with_sources(
            config,
            repository,
            alerts,
            Arc::new(UuidGenerator),
            Arc::new(SystemClock),
        )
    }

    /// Like [`AppState::new`] with explicit ID and time sources.
    #[must_use]
    pub fn with_sources(
        config: ServerConfig,
        repository: Arc<dyn LogRepository>,
        alerts: Arc<dyn AlertService>,
        ids: Arc<dyn IdGenerator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let create_log =
            CreateLogUseCase::new(repository.clone(), alerts.clone(), ids, clock)
                .with_alert_timeout(config.alert_timeout());

        Self {
            query_logs: QueryLogsUseCase::new(repository.clone()),
            get_stats: GetStatsUseCase::new(repository.clone()),
            get_log: GetLogUseCase::new(repository.clone()),
            api_keys: ApiKeys::new(&config.auth.api_keys),
            rate_limiter: RequestRateLimiter::from_config(&config.rate_limit),
            retention: config
                .retention
                .max_age_secs
                .map(|secs| RetentionPolicy::new(Duration::from_secs(secs))),
            started_at: Instant::now(),
            create_log,
            repository,
            alerts,
            config,
        }
    }

    /// Builds the repository and alert channels the configuration names.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, the log file cannot
    /// be opened, or a webhook client cannot be built.
    pub fn from_config(config: ServerConfig) -> ServerResult<Self> {
        config.validate()?;

        let repository = build_repository(&config)?;
        let alerts = build_alerts(&config)?;

        Ok(Self::new(config, repository, alerts))
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns the repository.
    #[must_use]
    pub fn repository(&self) -> &Arc<dyn LogRepository> {
        &self.repository
    }

    /// Returns the alert channel.
    #[must_use]
    pub fn alerts(&self) -> &Arc<dyn AlertService> {
        &self.alerts
    }

    /// Returns the create-log use case.
    #[must_use]
    pub const fn create_log(&self) -> &CreateLogUseCase {
        &self.create_log
    }

    /// Returns the query-logs use case.
    #[must_use]
    pub const fn query_logs(&self) -> &QueryLogsUseCase {
        &self.query_logs
    }

    /// Returns the stats use case.
    #[must_use]
    pub const fn get_stats(&self) -> &GetStatsUseCase {
        &self.get_stats
    }

    /// Returns the get-log use case.
    #[must_use]
    pub const fn get_log(&self) -> &GetLogUseCase {
        &self.get_log
    }

    /// Returns the accepted API keys.
    #[must_use]
    pub const fn api_keys(&self) -> &ApiKeys {
        &self.api_keys
    }

    /// Returns the rate limiter.
    #[must_use]
    pub const fn rate_limiter(&self) -> &RequestRateLimiter {
        &self.rate_limiter
    }

    /// Returns the retention policy, if one is configured.
    #[must_use]
    pub const fn retention(&self) -> Option<RetentionPolicy> {
        self.retention
    }

    /// Returns how long the server has been up.
    #[must_use]
    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("alerts", &self.alerts.name())
            .field("api_keys", &self.api_keys)
            .field("retention", &self.retention)
            .finish_non_exhaustive()
    }
}

fn build_repository(config: &ServerConfig) -> ServerResult<Arc<dyn LogRepository>> {
    let storage = &config.storage;
    match (storage.backend, &storage.path) {
        (StorageBackend::File, Some(path)) => {
            let repository = FileLogRepository::open(
                FileStoreConfig::new(path).with_max_entries(storage.max_entries),
            )?;
            info!(
                path = %path.display(),
                entries = repository.memory().len(),
                "file storage opened"
            );
            Ok(Arc::new(repository))
        }
        (StorageBackend::File, None) => Err(ServerError::Config(
            "storage.path is required for the file backend".to_string(),
        )),
        (StorageBackend::Memory, _) => {
            info!(max_entries = storage.max_entries, "memory storage ready");
            Ok(Arc::new(MemoryLogRepository::with_capacity(storage.max_entries)))
        }
    }
}

fn build_alerts(config: &ServerConfig) -> ServerResult<Arc<dyn AlertService>> {
    let mut channels: Vec<Arc<dyn AlertService>> = Vec::new();

    for webhook in &config.alerts.webhooks {
        let service = WebhookAlertService::new(webhook.clone())
            .map_err(|e| ServerError::Config(e.to_string()))?;
        info!(name = %webhook.name, url = %service.url(), "webhook alert channel ready");
        channels.push(Arc::new(service));
    }

    if config.alerts.log_channel {
        channels.push(Arc::new(LogAlertService::default()));
    }

    Ok(match channels.len() {
        0 => Arc::new(NoopAlertService),
        1 => channels.remove(0),
        _ => Arc::new(
            channels
                .into_iter()
                .fold(FanoutAlertService::new(), FanoutAlertService::with_channel),
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use logbook_alerts::WebhookConfig;

    #[test]
    fn default_config_uses_memory_and_noop() {
        let state = AppState::from_config(ServerConfig::default()).unwrap();
        assert_eq!(state.alerts().name(), "noop");
        assert!(state.retention().is_none());
        assert!(!state.api_keys().is_enabled());
        assert!(!state.rate_limiter().is_enabled());
    }

    #[test]
    fn single_channel_is_used_directly() {
        let config = ServerConfig::default().with_log_alerts(true);
        let state = AppState::from_config(config).unwrap();
        assert_eq!(state.alerts().name(), "log");
    }

    #[test]
    fn several_channels_fan_out() {
        let config = ServerConfig::default()
            .with_log_alerts(true)
            .with_webhook(WebhookConfig::new("ops", "http://127.0.0.1:9/hook").unwrap());
        let state = AppState::from_config(config).unwrap();
        assert_eq!(state.alerts().name(), "fanout");
    }

    #[test]
    fn file_backend_opens_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("logbook.jsonl");
        let config = ServerConfig::default().with_file_storage(&path);

        let state = AppState::from_config(config).unwrap();
        assert!(path.exists());
        assert_eq!(
            state.create_log().alert_timeout(),
            Duration::from_secs(10)
        );
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = ServerConfig::default();
        config.request_timeout_secs = 0;
        assert!(AppState::from_config(config).is_err());
    }

    #[test]
    fn retention_is_wired() {
        let config = ServerConfig::default().with_retention(Duration::from_secs(60));
        let state = AppState::from_config(config).unwrap();
        assert_eq!(
            state.retention().map(|r| r.max_age),
            Some(Duration::from_secs(60))
        );
    }
}
