//! Application use cases.
//!
//! Each use case is a small struct holding its injected collaborators and an
//! async `execute` method. They carry no other state and are cheap to clone,
//! so a host can build them once and share them across request handlers.

mod create_log;
mod dto;
mod get_log;
mod get_stats;
mod query_logs;

pub use create_log::{CreateLogUseCase, DEFAULT_ALERT_TIMEOUT};
pub use dto::{CreateLogRequest, CreateLogResponse, GetLogStatsResponse, QueryLogsResponse};
pub use get_log::GetLogUseCase;
pub use get_stats::GetStatsUseCase;
pub use query_logs::{
    DEFAULT_LIMIT, MAX_LIMIT, QueryLogsUseCase, apply_defaults, validate_filter,
    validate_time_range,
};
