//! Rate limiting primitives for auth flows.
//!
//! [`LoginRateLimiter`] tracks failed logins per client identifier inside
//! a fixed-origin window: the window opens at the first failure and
//! expires `window` later, regardless of how many failures land inside
//! it. Expired records are treated as absent and dropped on next touch
//! rather than swept. State is process-local and never persisted.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::warn;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed,
    Limited,
}

pub trait RateLimiter: Send + Sync {
    /// Decide whether a login attempt may proceed, before any credential
    /// work happens.
    fn check(&self, client_id: &str) -> RateLimitDecision;

    /// Count a failed authentication step against the client.
    fn record_failure(&self, client_id: &str);
}

/// Limiter that admits everything; used where limiting is someone else's
/// job (tests, embedded setups behind an upstream limiter).
#[derive(Clone, Debug)]
pub struct NoopRateLimiter;

impl RateLimiter for NoopRateLimiter {
    fn check(&self, _client_id: &str) -> RateLimitDecision {
        RateLimitDecision::Allowed
    }

    fn record_failure(&self, _client_id: &str) {}
}

#[derive(Debug)]
struct AttemptWindow {
    count: u32,
    window_start: Instant,
}

/// Failed-login tracker keyed by client identifier.
pub struct LoginRateLimiter {
    max_attempts: u32,
    window: Duration,
    // One lock over the whole map; increments for the same key serialize
    // here, which is what keeps concurrent failures from losing updates.
    attempts: Mutex<HashMap<String, AttemptWindow>>,
}

impl LoginRateLimiter {
    #[must_use]
    pub fn new(max_attempts: u32, window: Duration) -> Self {
        Self {
            max_attempts,
            window,
            attempts: Mutex::new(HashMap::new()),
        }
    }

    fn check_at(&self, client_id: &str, now: Instant) -> RateLimitDecision {
        let mut attempts = self
            .attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(entry) = attempts.get(client_id) {
            if now.duration_since(entry.window_start) > self.window {
                // Stale record: the window has elapsed, start fresh.
                attempts.remove(client_id);
                return RateLimitDecision::Allowed;
            }
            if entry.count >= self.max_attempts {
                // The caller still sees a generic login failure; only the
                // log carries the raw client id.
                warn!("Rate limit exceeded for login: {client_id}");
                return RateLimitDecision::Limited;
            }
        }

        RateLimitDecision::Allowed
    }

    fn record_failure_at(&self, client_id: &str, now: Instant) {
        let mut attempts = self
            .attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        match attempts.get_mut(client_id) {
            // Fixed-origin window: keep the anchor from the first failure.
            Some(entry) if now.duration_since(entry.window_start) <= self.window => {
                entry.count += 1;
            }
            _ => {
                attempts.insert(
                    client_id.to_string(),
                    AttemptWindow {
                        count: 1,
                        window_start: now,
                    },
                );
            }
        }
    }
}

impl RateLimiter for LoginRateLimiter {
    fn check(&self, client_id: &str) -> RateLimitDecision {
        self.check_at(client_id, Instant::now())
    }

    fn record_failure(&self, client_id: &str) {
        self.record_failure_at(client_id, Instant::now())
    }
}
