//! Typed helpers for the events every service emits.
//!
//! Each helper picks the level and event name and fills in base metadata.
//! Caller metadata wins over base metadata on key collision.

use std::time::Duration;

use logbook_core::usecase::CreateLogResponse;
use logbook_core::{LogLevel, Metadata};
use serde_json::{Value, json};

use crate::client::LogbookClient;
use crate::error::Result;

/// Merges `extra` over `base`.
fn merge(mut base: Metadata, extra: Metadata) -> Metadata {
    base.extend(extra);
    base
}

fn base<const N: usize>(fields: [(&str, Value); N]) -> Metadata {
    fields
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

fn millis(duration: Duration) -> Value {
    json!(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
}

impl LogbookClient {
    /// Records that the service started.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry could not be delivered.
    pub async fn service_start(
        &self,
        version: &str,
        message: impl Into<String>,
    ) -> Result<CreateLogResponse> {
        let metadata = base([("version", json!(version))]);
        self.send(LogLevel::Info, "service_start", message, metadata)
            .await
    }

    /// Records that the service stopped after `uptime`.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry could not be delivered.
    pub async fn service_stop(
        &self,
        uptime: Duration,
        message: impl Into<String>,
    ) -> Result<CreateLogResponse> {
        let metadata = base([("uptime_seconds", json!(uptime.as_secs_f64()))]);
        self.send(LogLevel::Info, "service_stop", message, metadata)
            .await
    }

    /// Records a health probe result.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry could not be delivered.
    pub async fn health(
        &self,
        status: &str,
        message: impl Into<String>,
        metadata: Metadata,
    ) -> Result<CreateLogResponse> {
        let metadata = merge(base([("status", json!(status))]), metadata);
        self.send(LogLevel::Info, "health_check", message, metadata)
            .await
    }

    /// Records an error. Triggers an alert on the server.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry could not be delivered.
    pub async fn error(
        &self,
        err: &(dyn std::error::Error + Send + Sync),
        message: impl Into<String>,
        metadata: Metadata,
    ) -> Result<CreateLogResponse> {
        let metadata = merge(base([("error", json!(err.to_string()))]), metadata);
        self.send(LogLevel::Error, "error_event", message, metadata)
            .await
    }

    /// Records a warning.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry could not be delivered.
    pub async fn warning(
        &self,
        message: impl Into<String>,
        metadata: Metadata,
    ) -> Result<CreateLogResponse> {
        self.send(LogLevel::Warning, "warning_event", message, metadata)
            .await
    }

    /// Records an informational event.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry could not be delivered.
    pub async fn info(
        &self,
        event: impl Into<String>,
        message: impl Into<String>,
        metadata: Metadata,
    ) -> Result<CreateLogResponse> {
        self.send(LogLevel::Info, event, message, metadata).await
    }

    /// Records a critical failure. Triggers an alert on the server.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry could not be delivered.
    pub async fn critical(
        &self,
        message: impl Into<String>,
        metadata: Metadata,
    ) -> Result<CreateLogResponse> {
        self.send(LogLevel::Critical, "critical_event", message, metadata)
            .await
    }

    /// Records debugging output.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry could not be delivered.
    pub async fn debug(
        &self,
        message: impl Into<String>,
        metadata: Metadata,
    ) -> Result<CreateLogResponse> {
        self.send(LogLevel::Debug, "debug_event", message, metadata)
            .await
    }

    /// Records an HTTP request served by this service.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry could not be delivered.
    pub async fn http_request(
        &self,
        method: &str,
        path: &str,
        status_code: u16,
        duration: Duration,
        metadata: Metadata,
    ) -> Result<CreateLogResponse> {
        let fields = base([
            ("method", json!(method)),
            ("path", json!(path)),
            ("status_code", json!(status_code)),
            ("duration_ms", millis(duration)),
        ]);
        let message = format!("{method} {path} - {status_code}");
        self.send(LogLevel::Info, "http_request", message, merge(fields, metadata))
            .await
    }

    /// Records a call to a third-party API.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry could not be delivered.
    pub async fn external_api(
        &self,
        api_name: &str,
        endpoint: &str,
        status_code: u16,
        duration: Duration,
        metadata: Metadata,
    ) -> Result<CreateLogResponse> {
        let fields = base([
            ("api_name", json!(api_name)),
            ("endpoint", json!(endpoint)),
            ("status_code", json!(status_code)),
            ("duration_ms", millis(duration)),
        ]);
        let message = format!("API call to {api_name}");
        self.send(LogLevel::Info, "external_api", message, merge(fields, metadata))
            .await
    }

    /// Records a call to another internal service.
    ///
    /// Logged at ERROR, and so alerted on, when `success` is false.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry could not be delivered.
    pub async fn service_communication(
        &self,
        target_service: &str,
        operation: &str,
        success: bool,
        duration: Duration,
        metadata: Metadata,
    ) -> Result<CreateLogResponse> {
        let fields = base([
            ("target_service", json!(target_service)),
            ("operation", json!(operation)),
            ("success", json!(success)),
            ("duration_ms", millis(duration)),
        ]);
        let level = if success {
            LogLevel::Info
        } else {
            LogLevel::Error
        };
        let message = format!("Communication with {target_service}: {operation}");
        self.send(level, "service_communication", message, merge(fields, metadata))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::post;
    use axum::{Json, Router};
    use std::sync::{Arc, Mutex};
    use test_case::test_case;

    type Bodies = Arc<Mutex<Vec<serde_json::Value>>>;

    async fn recorder() -> (LogbookClient, Bodies) {
        let bodies: Bodies = Arc::default();
        let sink = bodies.clone();
        let app = Router::new().route(
            "/log",
            post(move |Json(body): Json<serde_json::Value>| {
                let sink = sink.clone();
                async move {
                    sink.lock().unwrap().push(body);
                    (
                        axum::http::StatusCode::CREATED,
                        Json(json!({
                            "id": "log-1",
                            "timestamp": "2025-09-01T15:30:00Z",
                            "success": true,
                            "alert_sent": false,
                        })),
                    )
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = LogbookClient::new(format!("http://{addr}"), "orders-service").unwrap();
        (client, bodies)
    }

    fn last(bodies: &Bodies) -> serde_json::Value {
        bodies.lock().unwrap().last().cloned().unwrap()
    }

    #[test]
    fn caller_metadata_wins() {
        let merged = merge(
            base([("status", json!("ok")), ("region", json!("eu"))]),
            base([("status", json!("degraded"))]),
        );
        assert_eq!(merged["status"], "degraded");
        assert_eq!(merged["region"], "eu");
    }

    #[tokio::test]
    async fn service_start_and_stop() {
        let (client, bodies) = recorder().await;

        client.service_start("1.4.2", "booted").await.unwrap();
        let body = last(&bodies);
        assert_eq!(body["level"], "INFO");
        assert_eq!(body["event"], "service_start");
        assert_eq!(body["service"], "orders-service");
        assert_eq!(body["metadata"]["version"], "1.4.2");

        client
            .service_stop(Duration::from_millis(1500), "bye")
            .await
            .unwrap();
        let body = last(&bodies);
        assert_eq!(body["event"], "service_stop");
        assert_eq!(body["metadata"]["uptime_seconds"], 1.5);
    }

    #[tokio::test]
    async fn health_merges_metadata() {
        let (client, bodies) = recorder().await;

        client
            .health("ok", "checked", base([("status", json!("degraded")), ("db", json!("up"))]))
            .await
            .unwrap();

        let body = last(&bodies);
        assert_eq!(body["event"], "health_check");
        assert_eq!(body["metadata"]["status"], "degraded");
        assert_eq!(body["metadata"]["db"], "up");
    }

    #[tokio::test]
    async fn error_records_cause() {
        let (client, bodies) = recorder().await;
        let cause = std::io::Error::other("connection reset");

        client
            .error(&cause, "checkout failed", Metadata::new())
            .await
            .unwrap();

        let body = last(&bodies);
        assert_eq!(body["level"], "ERROR");
        assert_eq!(body["event"], "error_event");
        assert_eq!(body["metadata"]["error"], "connection reset");
    }

    #[test_case("warning", "WARNING", "warning_event" ; "warning")]
    #[test_case("critical", "CRITICAL", "critical_event" ; "critical")]
    #[test_case("debug", "DEBUG", "debug_event" ; "debug")]
    #[test_case("info", "INFO", "cache_warm" ; "info uses caller event")]
    #[tokio::test]
    async fn fixed_event_names(helper: &str, level: &str, event: &str) {
        let (client, bodies) = recorder().await;

        match helper {
            "warning" => client.warning("m", Metadata::new()).await,
            "critical" => client.critical("m", Metadata::new()).await,
            "debug" => client.debug("m", Metadata::new()).await,
            _ => client.info("cache_warm", "m", Metadata::new()).await,
        }
        .unwrap();

        let body = last(&bodies);
        assert_eq!(body["level"], level);
        assert_eq!(body["event"], event);
        assert_eq!(body["service"], "orders-service");
    }

    #[tokio::test]
    async fn http_request_formats_message() {
        let (client, bodies) = recorder().await;

        client
            .http_request("GET", "/orders/7", 404, Duration::from_millis(12), Metadata::new())
            .await
            .unwrap();

        let body = last(&bodies);
        assert_eq!(body["event"], "http_request");
        assert_eq!(body["message"], "GET /orders/7 - 404");
        assert_eq!(body["metadata"]["status_code"], 404);
        assert_eq!(body["metadata"]["duration_ms"], 12);
    }

    #[tokio::test]
    async fn external_api_formats_message() {
        let (client, bodies) = recorder().await;

        client
            .external_api("stripe", "/v1/charges", 200, Duration::from_millis(250), Metadata::new())
            .await
            .unwrap();

        let body = last(&bodies);
        assert_eq!(body["message"], "API call to stripe");
        assert_eq!(body["metadata"]["endpoint"], "/v1/charges");
    }

    #[tokio::test]
    async fn failed_service_communication_is_error() {
        let (client, bodies) = recorder().await;

        client
            .service_communication("billing", "charge", true, Duration::ZERO, Metadata::new())
            .await
            .unwrap();
        assert_eq!(last(&bodies)["level"], "INFO");

        client
            .service_communication("billing", "charge", false, Duration::ZERO, Metadata::new())
            .await
            .unwrap();
        let body = last(&bodies);
        assert_eq!(body["level"], "ERROR");
        assert_eq!(body["message"], "Communication with billing: charge");
        assert_eq!(body["metadata"]["success"], false);
    }
}
