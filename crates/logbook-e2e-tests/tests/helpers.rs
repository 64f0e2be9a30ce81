//! Test helpers for E2E tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use logbook_client::LogbookClient;
use logbook_server::{AppState, LogbookServer, ServerConfig, ServerResult};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing_subscriber::EnvFilter;

/// Default test timeout.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Installs a test-writer subscriber once; `RUST_LOG` picks the level.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Server running on an ephemeral port for the duration of a test.
pub struct TestServer {
    pub addr: SocketAddr,
    pub state: Arc<AppState>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<ServerResult<()>>>,
}

impl TestServer {
    /// Start a server with default configuration.
    pub async fn start() -> Self {
        Self::start_with(ServerConfig::default()).await
    }

    /// Start a server with `config`; the bind address is replaced by an
    /// ephemeral port.
    pub async fn start_with(config: ServerConfig) -> Self {
        init_tracing();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let config = ServerConfig {
            bind_addr: addr,
            ..config
        };
        let server = LogbookServer::from_config(config).unwrap();
        let state = server.state();
        tracing::info!(%addr, "test server started");

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let handle = tokio::spawn(async move {
            server
                .serve_listener(listener, async {
                    let _ = shutdown_rx.await;
                })
                .await
        });

        Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    /// Base URL of the server.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// A client emitting as `service`.
    pub fn client(&self, service: &str) -> LogbookClient {
        LogbookClient::new(self.url(), service).unwrap()
    }

    /// Shutdown the server and wait for it to stop.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let result = timeout(TEST_TIMEOUT, handle)
                .await
                .expect("server did not shut down in time")
                .unwrap();
            assert!(result.is_ok(), "server exited with error: {result:?}");
        }
    }
}

/// Webhook endpoint that records every alert it receives.
pub struct WebhookReceiver {
    pub url: String,
    received: Arc<Mutex<Vec<serde_json::Value>>>,
}

impl WebhookReceiver {
    /// Start a receiver answering every alert with `status`.
    pub async fn start(status: StatusCode) -> Self {
        let received: Arc<Mutex<Vec<serde_json::Value>>> = Arc::default();
        let sink = received.clone();
        let app = Router::new().route(
            "/alerts",
            post(move |Json(body): Json<serde_json::Value>| {
                let sink = sink.clone();
                async move {
                    sink.lock().unwrap().push(body);
                    status
                }
            }),
        );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            url: format!("http://{addr}/alerts"),
            received,
        }
    }

    /// Alerts received so far.
    pub fn received(&self) -> Vec<serde_json::Value> {
        self.received.lock().unwrap().clone()
    }
}

/// URL of a port nothing listens on.
pub async fn unreachable_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/alerts")
}

/// Poll `check` until it returns true or the test timeout elapses.
pub async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + TEST_TIMEOUT;
    while tokio::time::Instant::now() < deadline {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}
