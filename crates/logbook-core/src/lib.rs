//! Core of the Logbook structured-logging service.
//!
//! This crate holds everything that does not depend on a transport or a
//! storage technology:
//!
//! - [`LogEntry`] and [`LogLevel`], with the validation and alerting rules
//! - [`LogFilter`] and [`LogStats`], the query and aggregation value objects
//! - The collaborator contracts: [`LogRepository`], [`AlertService`],
//!   [`IdGenerator`] and [`Clock`]
//! - The use cases in [`usecase`]: create, query, stats and get-by-id
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use logbook_core::usecase::{CreateLogRequest, CreateLogUseCase};
//! use logbook_core::{LogLevel, SystemClock, UuidGenerator};
//!
//! let create = CreateLogUseCase::new(repository, alerts, Arc::new(UuidGenerator), Arc::new(SystemClock));
//! let response = create
//!     .execute(CreateLogRequest::new(LogLevel::Error, "gateway-service", "api_error", "upstream timed out"))
//!     .await?;
//! assert!(response.success);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod filter;
pub mod traits;
pub mod types;
pub mod usecase;

pub use error::{LogError, Result};
pub use filter::{LogFilter, LogStats, SortField, SortOrder};
pub use traits::{AlertService, Clock, IdGenerator, LogRepository, SystemClock, UuidGenerator};
pub use types::{LogEntry, LogEntryBuilder, LogLevel, Metadata, TimeRange, is_blank, is_set};
