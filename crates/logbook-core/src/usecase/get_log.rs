//! Single-entry lookup.

use std::sync::Arc;

use crate::error::{LogError, Result};
use crate::traits::LogRepository;
use crate::types::{LogEntry, is_blank};

/// Fetches one entry by ID.
#[derive(Clone)]
pub struct GetLogUseCase {
    repository: Arc<dyn LogRepository>,
}

impl GetLogUseCase {
    /// Creates the use case.
    #[must_use]
    pub fn new(repository: Arc<dyn LogRepository>) -> Self {
        Self { repository }
    }

    /// Runs the use case. A blank ID is reported as not found.
    pub async fn execute(&self, id: &str) -> Result<LogEntry> {
        if is_blank(id) {
            return Err(LogError::NotFound(id.to_string()));
        }
        self.repository.get_by_id(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LogLevel;
    use crate::usecase::fakes::{FakeRepository, fixed_time};

    #[tokio::test]
    async fn finds_seeded_entry() {
        let repository = FakeRepository::new();
        repository.seed(
            LogEntry::builder()
                .id("log-7")
                .level(LogLevel::Warning)
                .service("search-service")
                .event("slow_query")
                .message("query took 2s")
                .timestamp(fixed_time())
                .build()
                .unwrap(),
        );
        let use_case = GetLogUseCase::new(Arc::new(repository));

        let entry = use_case.execute("log-7").await.unwrap();
        assert_eq!(entry.event, "slow_query");
    }

    #[tokio::test]
    async fn missing_entry_is_not_found() {
        let use_case = GetLogUseCase::new(Arc::new(FakeRepository::new()));
        assert!(matches!(
            use_case.execute("nope").await,
            Err(LogError::NotFound(_))
        ));
        assert!(matches!(
            use_case.execute("  ").await,
            Err(LogError::NotFound(_))
        ));
    }
}
