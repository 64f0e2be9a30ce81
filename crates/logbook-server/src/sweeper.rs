//! Background maintenance: retention sweeps and rate-limiter pruning.

use std::sync::Arc;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, warn};

use crate::state::AppState;

/// Runs one maintenance pass.
///
/// Returns the number of log entries deleted by retention.
pub async fn run_once(state: &AppState) -> u64 {
    let pruned = state.rate_limiter().prune();
    if pruned > 0 {
        debug!(pruned, "idle rate-limit windows dropped");
    }

    let Some(policy) = state.retention() else {
        return 0;
    };

    match policy.sweep(state.repository().as_ref(), Utc::now()).await {
        Ok(removed) => removed,
        Err(e) => {
            warn!(error = %e, kind = e.kind(), "retention sweep failed");
            0
        }
    }
}

/// Spawns the maintenance loop on the configured interval.
///
/// The first pass runs immediately.
pub fn spawn(state: Arc<AppState>) -> JoinHandle<()> {
    let period = state.config().sweep_interval();

    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            run_once(&state).await;
        }
    })
}
