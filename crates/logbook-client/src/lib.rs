//! Typed HTTP client for Logbook.
//!
//! A [`LogbookClient`] belongs to one emitting service and stamps that
//! service's name on every entry. Besides the raw [`LogbookClient::send`] it
//! offers helpers for common events (`service_start`, `http_request`,
//! `service_communication`, ...) and read access to queries and stats.
//!
//! # Example
//!
//! ```rust,ignore
//! use logbook_client::{LogbookClient, QueryParams};
//! use logbook_core::LogLevel;
//!
//! let client = LogbookClient::new("http://localhost:8080", "orders-service")?;
//! client.service_start("1.4.2", "orders-service started").await?;
//!
//! let page = client
//!     .query(&QueryParams::new().level(LogLevel::Error).page(20, 0))
//!     .await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod client;
pub mod error;
pub mod events;
pub mod query;

pub use client::{DEFAULT_TIMEOUT, HealthStatus, LogRequest, LogbookClient};
pub use error::{ClientError, Result};
pub use query::QueryParams;
