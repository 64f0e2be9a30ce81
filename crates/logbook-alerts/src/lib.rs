//! Alert channels for Logbook.
//!
//! Every channel implements [`AlertService`](logbook_core::AlertService):
//!
//! - [`WebhookAlertService`]: JSON POST to an HTTP endpoint
//! - [`LogAlertService`]: Writes alerts through `tracing`
//! - [`FanoutAlertService`]: Delivers to several channels, succeeds if any does
//! - [`NoopAlertService`]: Accepts and drops every alert

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod fanout;
pub mod log;
pub mod noop;
pub mod payload;
pub mod webhook;

pub use error::{AlertError, Result};
pub use fanout::FanoutAlertService;
pub use log::LogAlertService;
pub use noop::NoopAlertService;
pub use payload::{AlertPayload, BatchAlertPayload};
pub use webhook::{WebhookAlertService, WebhookConfig};
