//! Per-client request rate limiting.
//!
//! Sliding-window counter keyed by the peer IP address. Requests arriving
//! without connection info (in-process tests, some proxies) share the
//! unspecified address bucket.

use std::collections::{HashMap, VecDeque};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use logbook_core::LogError;
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::RateLimitConfig;
use crate::error::ApiError;
use crate::state::AppState;

/// Sliding window of request timestamps for one client.
#[derive(Debug, Default)]
struct SlidingWindow {
    timestamps: VecDeque<Instant>,
}

impl SlidingWindow {

    fn evict(&mut self, now: Instant, window: Duration) {
        while self
            .timestamps
            .front()
            .is_some_and(|t| now.saturating_duration_since(*t) >= window)
        {
            self.timestamps.pop_front();
        }
    }

    fn try_request(&mut self, now: Instant, window: Duration, max_requests: u32) -> bool {
        self.evict(now, window);

        if (self.timestamps.len() as u32) < max_requests {
            self.timestamps.push_back(now);
            true
        } else {
            false
        }
    }
}

/// Request rate limiter using a sliding window per client IP.
#[derive(Debug)]
pub struct RequestRateLimiter {
    max_requests: u32,
    window: Duration,
    enabled: bool,
    windows: Mutex<HashMap<IpAddr, SlidingWindow>>,
}

impl RequestRateLimiter {
    /// Create an enabled limiter.
    #[must_use]
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            enabled: true,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Create a limiter that allows everything.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::new(0, Duration::ZERO)
        }
    }

    /// Create from configuration.
    #[must_use]
    pub fn from_config(config: &RateLimitConfig) -> Self {
        if config.enabled {
            Self::new(config.max_requests, Duration::from_secs(config.window_secs))
        } else {
            Self::disabled()
        }
    }

    /// Returns true if the limiter is switched on.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Check if a request is allowed and record it if so.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::RateLimitExceeded`] if the client used up its
    /// budget for the current window.
    pub fn check_and_record(&self, ip: IpAddr) -> Result<(), LogError> {
        if !self.enabled {
            return Ok(());
        }

        let now = Instant::now();
        let mut windows = self.windows.lock();
        let window = windows.entry(ip).or_default();

        if window.try_request(now, self.window, self.max_requests) {
            debug!(ip = %ip, count = window.timestamps.len(), "request allowed");
            Ok(())
        } else {
            warn!(ip = %ip, limit = self.max_requests, "rate limit exceeded");
            Err(LogError::RateLimitExceeded)
        }
    }

    /// Returns the number of clients currently tracked.
    #[must_use]
    pub fn tracked_clients(&self) -> usize {
        self.windows.lock().len()
    }

    /// Drops clients with no requests inside the current window.
    ///
    /// Returns the number of clients removed.
    pub fn prune(&self) -> usize {
        let now = Instant::now();
        let mut windows = self.windows.lock();
        let before = windows.len();

        windows.retain(|_, w| {
            w.evict(now, self.window);
            !w.timestamps.is_empty()
        });

        before - windows.len()
    }
}

impl Default for RequestRateLimiter {
    fn default() -> Self {
        Self::disabled()
    }
}

/// Returns the peer address of a request, or the unspecified address.
fn client_ip(request: &Request) -> IpAddr {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED), |ConnectInfo(addr)| addr.ip())
}

/// Middleware rejecting clients over their request budget.
pub async fn limit_requests(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    state.rate_limiter().check_and_record(client_ip(&request))?;
    Ok(next.run(request).await)
}
