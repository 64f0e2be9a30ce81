//! HTTP server for Logbook.
//!
//! Exposes the log use cases over a small JSON API:
//!
//! | Method | Path          | Use case    |
//! |--------|---------------|-------------|
//! | POST   | `/log`        | create log  |
//! | GET    | `/log`        | query logs  |
//! | GET    | `/log/stats`  | get stats   |
//! | GET    | `/log/{id}`   | get log     |
//! | GET    | `/health`     | liveness    |
//!
//! Errors are returned as `{"success": false, "error": "<message>"}`.
//!
//! # Example
//!
//! ```rust,ignore
//! use logbook_server::{LogbookServer, ServerConfig};
//!
//! let config = ServerConfig::new("127.0.0.1:8080".parse()?);
//! LogbookServer::from_config(config)?.serve().await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod rate_limit;
pub mod routes;
pub mod server;
pub mod state;
pub mod sweeper;

pub use config::ServerConfig;
pub use error::{ApiError, ServerError, ServerResult};
pub use routes::create_router;
pub use server::LogbookServer;
pub use state::AppState;
