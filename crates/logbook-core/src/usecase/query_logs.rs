//! Filtered, paginated reads.

use std::sync::Arc;

use tracing::debug;

use crate::error::{LogError, Result};
use crate::filter::{LogFilter, SortField, SortOrder};
use crate::traits::LogRepository;
use crate::usecase::dto::QueryLogsResponse;

/// Page size used when the filter leaves `limit` unset.
pub const DEFAULT_LIMIT: i64 = 100;

/// Largest page size a caller may request.
pub const MAX_LIMIT: i64 = 1000;

/// Validates a filter, fills in defaults and returns one page of results.
#[derive(Clone)]
pub struct QueryLogsUseCase {
    repository: Arc<dyn LogRepository>,
}

impl QueryLogsUseCase {
    /// Creates the use case.
    #[must_use]
    pub fn new(repository: Arc<dyn LogRepository>) -> Self {
        Self { repository }
    }

    /// Runs the use case.
    ///
    /// `query` and `count` are two independent repository calls. Under
    /// concurrent writes `total_count` may not describe exactly the same
    /// snapshot as `logs`, so `has_more` is approximate in that window.
    pub async fn execute(&self, filter: LogFilter) -> Result<QueryLogsResponse> {
        validate_filter(&filter)?;
        let filter = apply_defaults(filter);

        let logs = self.repository.query(&filter).await?;
        let total_count = self.repository.count(&filter).await?;

        let seen = filter.offset.unsigned_abs() + logs.len() as u64;
        let has_more = seen < total_count;

        debug!(
            returned = logs.len(),
            total_count,
            offset = filter.offset,
            limit = filter.limit,
            has_more,
            "logs queried"
        );

        Ok(QueryLogsResponse {
            logs,
            total_count,
            has_more,
        })
    }
}

/// Rejects out-of-range pagination and inverted time windows.
pub fn validate_filter(filter: &LogFilter) -> Result<()> {
    if !(0..=MAX_LIMIT).contains(&filter.limit) {
        return Err(LogError::InvalidFilter(format!(
            "limit must be between 0 and {MAX_LIMIT}, got {}",
            filter.limit
        )));
    }

    if filter.offset < 0 {
        return Err(LogError::InvalidFilter(format!(
            "offset must not be negative, got {}",
            filter.offset
        )));
    }

    validate_time_range(filter)
}

/// Rejects a filter whose `time_to` precedes its `time_from`.
pub fn validate_time_range(filter: &LogFilter) -> Result<()> {
    if filter.time_range().is_ordered() {
        Ok(())
    } else {
        Err(LogError::InvalidFilter(
            "time_to must not precede time_from".to_string(),
        ))
    }
}

/// Fills unset pagination and ordering fields.
///
/// Only zero/unset values are replaced; explicit values are kept.
#[must_use]
pub fn apply_defaults(mut filter: LogFilter) -> LogFilter {
    if filter.limit == 0 {
        filter.limit = DEFAULT_LIMIT;
    }
    filter.sort_by.get_or_insert(SortField::Timestamp);
    filter.sort_order.get_or_insert(SortOrder::Desc);
    filter
}
