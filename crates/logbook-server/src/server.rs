//! Server lifecycle.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::routes::create_router;
use crate::state::AppState;
use crate::sweeper;

/// The Logbook HTTP server.
///
/// Serves the log API and runs the maintenance loop for as long as it
/// listens.
#[derive(Debug, Clone)]
pub struct LogbookServer {
    state: Arc<AppState>,
}

impl LogbookServer {
    /// Create a server around prepared state.
    #[must_use]
    pub const fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// Create a server from configuration, opening storage and alert
    /// channels.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or storage cannot
    /// be opened.
    pub fn from_config(config: ServerConfig) -> ServerResult<Self> {
        Ok(Self::new(Arc::new(AppState::from_config(config)?)))
    }

    /// Get the shared state.
    #[must_use]
    pub fn state(&self) -> Arc<AppState> {
        self.state.clone()
    }

    /// Start the server on the configured address.
    ///
    /// This method runs until the server encounters a fatal error.
    ///
    /// # Errors
    ///
    /// Returns an error if binding to the address fails.
    pub async fn serve(&self) -> ServerResult<()> {
        self.serve_with_shutdown(std::future::pending()).await
    }

    /// Start the server with graceful shutdown support.
    ///
    /// The server will shut down when the provided future completes.
    ///
    /// # Errors
    ///
    /// Returns an error if binding to the address fails.
    pub async fn serve_with_shutdown<F>(&self, shutdown: F) -> ServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.state.config().bind_addr;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::BindFailed(addr, e))?;

        self.serve_listener(listener, shutdown).await
    }

    /// Serve on an already bound listener.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener fails.
    pub async fn serve_listener<F>(&self, listener: TcpListener, shutdown: F) -> ServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let local_addr = listener
            .local_addr()
            .map_err(|e| ServerError::Internal(e.to_string()))?;

        info!(
            addr = %local_addr,
            alerts = self.state.alerts().name(),
            auth = self.state.api_keys().is_enabled(),
            rate_limit = self.state.rate_limiter().is_enabled(),
            "Logbook server listening"
        );

        let maintenance = sweeper::spawn(self.state.clone());
        let router = create_router(self.state.clone());

        let result = axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| ServerError::Internal(e.to_string()));

        maintenance.abort();
        info!("Logbook server shut down");
        result
    }
}
