//! Route configuration for the log API.

use std::sync::Arc;

use axum::middleware::{from_fn_with_state, map_response};
use axum::routing::{Router, get};
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::auth::require_api_key;
use crate::config::ServerConfig;
use crate::error::timeout_as_json;
use crate::handlers::{create_log, get_log, get_stats, health_check, query_logs};
use crate::rate_limit::limit_requests;
use crate::state::AppState;

/// Create the log API router.
///
/// `/log` routes are rate limited, then authenticated. `/health` is open.
#[allow(deprecated)]
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = build_cors_layer(state.config());
    let timeout = TimeoutLayer::new(state.config().request_timeout());

    let log_routes = Router::new()
        .route("/log", get(query_logs).post(create_log))
        .route("/log/stats", get(get_stats))
        .route("/log/{id}", get(get_log))
        .route_layer(from_fn_with_state(state.clone(), require_api_key))
        .route_layer(from_fn_with_state(state.clone(), limit_requests));

    Router::new()
        .route("/health", get(health_check))
        .merge(log_routes)
        .with_state(state)
        .layer(timeout)
        .layer(map_response(timeout_as_json))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Build the CORS layer based on configuration.
fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    if config.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use futures::future::BoxFuture;
    use http_body_util::BodyExt;
    use logbook_alerts::NoopAlertService;
    use logbook_core::{AlertService, LogEntry, LogError, LogRepository, Result};
    use logbook_store::MemoryLogRepository;
    use std::time::Duration;
    use tower::ServiceExt;

    struct FailingAlerts;

    impl AlertService for FailingAlerts {
        fn name(&self) -> &str {
            "failing"
        }

        fn send_alert<'a>(&'a self, _entry: &'a LogEntry) -> BoxFuture<'a, Result<()>> {
            Box::pin(async { Err(LogError::AlertServiceUnavailable("down".to_string())) })
        }

        fn send_batch_alert<'a>(&'a self, _entries: &'a [LogEntry]) -> BoxFuture<'a, Result<()>> {
            Box::pin(async { Err(LogError::AlertServiceUnavailable("down".to_string())) })
        }

        fn is_healthy(&self) -> BoxFuture<'_, bool> {
            Box::pin(async { false })
        }
    }

    fn make_state(config: ServerConfig, alerts: Arc<dyn AlertService>) -> Arc<AppState> {
        let repository: Arc<dyn LogRepository> = Arc::new(MemoryLogRepository::new());
        Arc::new(AppState::new(config, repository, alerts))
    }

    fn make_test_state() -> Arc<AppState> {
        make_state(ServerConfig::default(), Arc::new(NoopAlertService))
    }

    fn post_log(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/log")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    fn entry_json(level: &str, service: &str, event: &str, message: &str) -> String {
        serde_json::json!({
            "level": level,
            "service": service,
            "event": event,
            "message": message,
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = create_router(make_test_state());

        let (status, json) = send(&app, get("/health")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["service"], "logbook");
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
        assert_eq!(json["alerts_healthy"], true);
        assert!(json["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_create_info_log() {
        let app = create_router(make_test_state());

        let (status, json) = send(
            &app,
            post_log(&entry_json("INFO", "auth-service", "login", "user signed in")),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["success"], true);
        assert_eq!(json["alert_sent"], false);
        assert!(!json["id"].as_str().unwrap().is_empty());
        assert!(json["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_create_error_log_alerts() {
        let app = create_router(make_test_state());

        let (status, json) = send(
            &app,
            post_log(&entry_json("ERROR", "gateway-service", "api_error", "upstream 502")),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["alert_sent"], true);
    }

    #[tokio::test]
    async fn test_critical_log_with_failing_alerts_is_stored() {
        let app = create_router(make_state(ServerConfig::default(), Arc::new(FailingAlerts)));

        let (status, created) = send(
            &app,
            post_log(&entry_json("CRITICAL", "payment-service", "db_down", "primary lost")),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["success"], true);
        assert_eq!(created["alert_sent"], false);

        let (status, page) = send(&app, get("/log?level=CRITICAL")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["total_count"], 1);
        assert_eq!(page["logs"][0]["id"], created["id"]);
        assert_eq!(page["logs"][0]["service"], "payment-service");
    }

    #[tokio::test]
    async fn test_query_by_service_and_level() {
        let app = create_router(make_test_state());

        for body in [
            entry_json("ERROR", "gateway-service", "api_error", "upstream 502"),
            entry_json("INFO", "gateway-service", "request", "GET /users"),
            entry_json("ERROR", "billing-service", "charge_failed", "card declined"),
        ] {
            let (status, _) = send(&app, post_log(&body)).await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (status, page) = send(
            &app,
            get("/log?service=gateway-service&level=ERROR&limit=10&offset=0"),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["logs"].as_array().unwrap().len(), 1);
        assert_eq!(page["logs"][0]["event"], "api_error");
        assert_eq!(page["total_count"], 1);
        assert_eq!(page["has_more"], false);
    }

    #[tokio::test]
    async fn test_query_pages_have_more() {
        let app = create_router(make_test_state());

        for i in 0..3 {
            let body = entry_json("INFO", "worker", "tick", &format!("tick {i}"));
            send(&app, post_log(&body)).await;
        }

        let (_, page) = send(&app, get("/log?limit=2")).await;
        assert_eq!(page["logs"].as_array().unwrap().len(), 2);
        assert_eq!(page["total_count"], 3);
        assert_eq!(page["has_more"], true);

        let (_, page) = send(&app, get("/log?limit=2&offset=2")).await;
        assert_eq!(page["logs"].as_array().unwrap().len(), 1);
        assert_eq!(page["has_more"], false);
    }

    #[tokio::test]
    async fn test_invalid_json_body() {
        let app = create_router(make_test_state());

        let (status, json) = send(&app, post_log("{not json")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Invalid JSON format");
        assert_eq!(json["success"], false);
    }

    #[tokio::test]
    async fn test_missing_content_type_is_invalid_json() {
        let app = create_router(make_test_state());
        let request = Request::builder()
            .method("POST")
            .uri("/log")
            .body(Body::from(entry_json("INFO", "s", "e", "m")))
            .unwrap();

        let (status, json) = send(&app, request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Invalid JSON format");
    }

    #[tokio::test]
    async fn test_unknown_level() {
        let app = create_router(make_test_state());

        let (status, json) = send(&app, post_log(&entry_json("LOUD", "s", "e", "m"))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Invalid log level");
    }

    #[tokio::test]
    async fn test_blank_fields_rejected() {
        let app = create_router(make_test_state());

        let (status, json) = send(&app, post_log(&entry_json("INFO", "  ", "e", "m"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Invalid log entry");

        let (status, _) = send(&app, post_log(r#"{"level":"INFO","service":"s"}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, page) = send(&app, get("/log")).await;
        assert_eq!(page["total_count"], 0);
    }

    #[tokio::test]
    async fn test_null_optional_fields_accepted() {
        let app = create_router(make_test_state());
        let body = r#"{"level":"INFO","service":"svc","event":"e","message":"m","user_id":null,"chat_id":null,"metadata":null}"#;

        let (status, json) = send(&app, post_log(body)).await;
        assert_eq!(status, StatusCode::CREATED);

        let id = json["id"].as_str().unwrap();
        let (status, entry) = send(&app, get(&format!("/log/{id}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert!(entry["user_id"].is_null());
    }

    #[tokio::test]
    async fn test_null_required_fields_fail_validation() {
        let app = create_router(make_test_state());

        let (status, json) = send(
            &app,
            post_log(r#"{"level":null,"service":"s","event":"e","message":"m"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Invalid log level");

        let (status, json) = send(
            &app,
            post_log(r#"{"level":"INFO","service":null,"event":"e","message":"m"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Invalid log entry");
    }

    #[tokio::test]
    #[allow(deprecated)]
    async fn test_timeout_has_error_body() {
        let app = Router::new()
            .route(
                "/slow",
                axum::routing::get(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                }),
            )
            .layer(TimeoutLayer::new(Duration::from_millis(20)))
            .layer(map_response(timeout_as_json));

        let (status, json) = send(&app, get("/slow")).await;

        assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
        assert_eq!(json["error"], "Request timeout");
        assert_eq!(json["success"], false);
    }

    #[tokio::test]
    async fn test_bad_query_parameters() {
        let app = create_router(make_test_state());

        let (status, json) = send(&app, get("/log?limit=abc")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Invalid limit parameter");

        let (status, json) = send(&app, get("/log?limit=5000")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Invalid filter parameters");

        let (status, json) = send(&app, get("/log?time_from=2025-09-02T00:00:00Z&time_to=2025-09-01T00:00:00Z")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Invalid filter parameters");
    }

    #[tokio::test]
    async fn test_stats_endpoint() {
        let app = create_router(make_test_state());

        for body in [
            entry_json("INFO", "api", "request", "a"),
            entry_json("INFO", "api", "request", "b"),
            entry_json("ERROR", "worker", "job_failed", "c"),
        ] {
            send(&app, post_log(&body)).await;
        }

        let (status, json) = send(&app, get("/log/stats")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["stats"]["total_count"], 3);
        assert_eq!(json["stats"]["count_by_level"]["INFO"], 2);
        assert_eq!(json["stats"]["count_by_level"]["ERROR"], 1);
        assert_eq!(json["stats"]["count_by_service"]["api"], 2);
        assert_eq!(json["stats"]["count_by_event"]["job_failed"], 1);

        let (_, json) = send(&app, get("/log/stats?service=worker")).await;
        assert_eq!(json["stats"]["total_count"], 1);
    }

    #[tokio::test]
    async fn test_get_log_by_id() {
        let app = create_router(make_test_state());

        let (_, created) = send(&app, post_log(&entry_json("WARNING", "api", "slow", "1.2s"))).await;
        let id = created["id"].as_str().unwrap();

        let (status, json) = send(&app, get(&format!("/log/{id}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["id"], id);
        assert_eq!(json["level"], "WARNING");

        let (status, json) = send(&app, get("/log/does-not-exist")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "Log entry not found");
    }

    #[tokio::test]
    async fn test_storage_unavailable() {
        let repository = Arc::new(MemoryLogRepository::new());
        repository.set_available(false);
        let state = Arc::new(AppState::new(
            ServerConfig::default(),
            repository.clone(),
            Arc::new(NoopAlertService),
        ));
        let app = create_router(state);

        let (status, json) = send(&app, post_log(&entry_json("INFO", "s", "e", "m"))).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json["error"], "Storage unavailable");

        let (status, _) = send(&app, get("/log")).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_api_key_required() {
        let config = ServerConfig::default().with_api_key("s3cret");
        let app = create_router(make_state(config, Arc::new(NoopAlertService)));

        let (status, json) = send(&app, get("/log")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["error"], "Unauthorized access");

        let request = Request::builder()
            .uri("/log")
            .header("authorization", "Bearer s3cret")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);

        let request = Request::builder()
            .uri("/log/stats")
            .header("x-api-key", "s3cret")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(&app, get("/health")).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_rate_limit() {
        let config = ServerConfig::default().with_rate_limit(2, Duration::from_secs(60));
        let app = create_router(make_state(config, Arc::new(NoopAlertService)));

        assert_eq!(send(&app, get("/log")).await.0, StatusCode::OK);
        assert_eq!(send(&app, get("/log")).await.0, StatusCode::OK);

        let (status, json) = send(&app, get("/log")).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(json["error"], "Rate limit exceeded");

        assert_eq!(send(&app, get("/health")).await.0, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_endpoint() {
        let app = create_router(make_test_state());
        let (status, _) = send(&app, get("/nonexistent")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_cors_any_origin() {
        let app = create_router(make_test_state());

        let request = Request::builder()
            .uri("/health")
            .header("origin", "https://example.com")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "*"
        );
    }
}
