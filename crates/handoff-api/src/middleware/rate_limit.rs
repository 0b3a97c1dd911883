//! Rate limiting for the verification endpoint.
//!
//! Sliding-window limiter keyed by client IP. Verification URLs are
//! bearer credentials, so the endpoint is throttled to slow down
//! signature-guessing attempts.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use parking_lot::Mutex;

use crate::router::HandoffState;

/// Default attempts allowed per IP per window on the verify endpoint.
pub const DEFAULT_VERIFY_ATTEMPTS: usize = 10;

/// Default sliding-window length.
const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Rate limiter configuration.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub max_attempts: usize,
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_VERIFY_ATTEMPTS,
            window: DEFAULT_WINDOW,
        }
    }
}

/// Attempt timestamps for one client within the window.
#[derive(Debug, Default)]
struct AttemptEntry {
    timestamps: Vec<Instant>,
}

impl AttemptEntry {
    fn record_attempt(&mut self) {
        self.timestamps.push(Instant::now());
    }

    /// Count attempts inside the window, dropping aged-out ones.
    fn count(&mut self, window: Duration) -> usize {
        let cutoff = Instant::now().checked_sub(window);
        if let Some(cutoff) = cutoff {
            self.timestamps.retain(|t| *t > cutoff);
        }
        self.timestamps.len()
    }
}

/// In-memory sliding-window rate limiter keyed by IP address.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimitConfig,
    entries: Arc<Mutex<HashMap<IpAddr, AttemptEntry>>>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    #[must_use]
    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Whether `ip` has exhausted its attempts for the current window.
    #[must_use]
    pub fn is_limited(&self, ip: IpAddr) -> bool {
        let mut entries = self.entries.lock();
        match entries.get_mut(&ip) {
            Some(entry) => entry.count(self.config.window) >= self.config.max_attempts,
            None => false,
        }
    }

    /// Record one attempt for `ip`.
    pub fn record_attempt(&self, ip: IpAddr) {
        self.entries.lock().entry(ip).or_default().record_attempt();
    }

    /// Admit and record one attempt for `ip`, or refuse it.
    ///
    /// Check and record happen under a single lock, so concurrent
    /// callers can never admit more than `max_attempts` per window.
    #[must_use]
    pub fn try_attempt(&self, ip: IpAddr) -> bool {
        let mut entries = self.entries.lock();
        let entry = entries.entry(ip).or_default();
        if entry.count(self.config.window) >= self.config.max_attempts {
            return false;
        }
        entry.record_attempt();
        true
    }

    /// Attempts left before `ip` is limited.
    #[must_use]
    pub fn remaining_attempts(&self, ip: IpAddr) -> usize {
        let mut entries = self.entries.lock();
        let used = entries
            .get_mut(&ip)
            .map_or(0, |entry| entry.count(self.config.window));
        self.config.max_attempts.saturating_sub(used)
    }

    /// Forget all attempts for `ip`.
    pub fn reset(&self, ip: IpAddr) {
        self.entries.lock().remove(&ip);
    }

    /// Drop entries with no attempts left inside the window.
    pub fn cleanup(&self) {
        let window = self.config.window;
        self.entries
            .lock()
            .retain(|_, entry| entry.count(window) > 0);
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}

fn client_ip(request: &Request) -> IpAddr {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED), |info| info.0.ip())
}

/// Throttle the verify endpoint per client IP.
pub async fn verify_rate_limit(
    State(state): State<HandoffState>,
    request: Request,
    next: Next,
) -> Response {
    let limiter = state.limiter();
    let ip = client_ip(&request);

    if !limiter.try_attempt(ip) {
        tracing::warn!(client_ip = %ip, "handoff verification rate limit exceeded");
        let body = serde_json::json!({
            "type": "https://handoff.dev/problems/rate-limited",
            "title": "Too Many Requests",
            "status": 429,
            "detail": "Too many handoff verification attempts, retry later",
        });
        return (
            StatusCode::TOO_MANY_REQUESTS,
            [(header::CONTENT_TYPE, "application/problem+json")],
            body.to_string(),
        )
            .into_response();
    }

    next.run(request).await
}
