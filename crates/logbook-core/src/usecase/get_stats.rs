//! Aggregated counts over matching entries.

use std::sync::Arc;

use tracing::debug;

use crate::error::Result;
use crate::filter::LogFilter;
use crate::traits::LogRepository;
use crate::usecase::dto::GetLogStatsResponse;
use crate::usecase::query_logs::validate_time_range;

/// Returns the repository's statistics for a filter.
///
/// Only the time window is validated. Set dimensions pass through untouched
/// and no defaults are applied.
#[derive(Clone)]
pub struct GetStatsUseCase {
    repository: Arc<dyn LogRepository>,
}

impl GetStatsUseCase {
    /// Creates the use case.
    #[must_use]
    pub fn new(repository: Arc<dyn LogRepository>) -> Self {
        Self { repository }
    }

    /// Runs the use case.
    pub async fn execute(&self, filter: LogFilter) -> Result<GetLogStatsResponse> {
        validate_time_range(&filter)?;

        let stats = self.repository.get_stats(&filter).await?;
        debug!(total_count = stats.total_count, "log stats computed");

        Ok(GetLogStatsResponse { stats })
    }
}
