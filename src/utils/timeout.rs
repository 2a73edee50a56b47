//! Timeout utilities for gateway calls
//!
//! Per-attempt HTTP timeouts are enforced by the `reqwest` client; the
//! whole-call deadline is enforced here around each attempt.

use std::time::{Duration, Instant};

/// Timeout configuration for provider calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutConfig {
    /// Timeout for a single provider request (default: 60s)
    pub request_timeout: Duration,

    /// Connection timeout for the HTTP client (default: 10s)
    pub connect_timeout: Duration,

    /// Upper bound for one `generate` call across all candidates (default: 180s)
    pub generate_deadline: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(10),
            generate_deadline: Duration::from_secs(180),
        }
    }
}

impl TimeoutConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_generate_deadline(mut self, deadline: Duration) -> Self {
        self.generate_deadline = deadline;
        self
    }
}

/// A point in time after which no further provider attempts start
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    /// `None` when the budget is too large to represent, i.e. unbounded
    expires_at: Option<Instant>,
}

impl Deadline {
    /// Deadline `budget` from now
    pub fn after(budget: Duration) -> Self {
        Self {
            expires_at: Instant::now().checked_add(budget),
        }
    }

    pub fn is_unbounded(&self) -> bool {
        self.expires_at.is_none()
    }

    /// Time left before expiry, `None` once expired
    pub fn remaining(&self) -> Option<Duration> {
        match self.expires_at {
            Some(at) => at
                .checked_duration_since(Instant::now())
                .filter(|d| !d.is_zero()),
            None => Some(Duration::MAX),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.remaining().is_none()
    }
}

/// Run `future` until it completes or the deadline passes.
///
/// Returns `None` when the deadline fires first; the future is dropped,
/// which cancels any in-flight request it owns.
pub async fn within_deadline<T>(
    deadline: &Deadline,
    future: impl std::future::Future<Output = T>,
) -> Option<T> {
    if deadline.is_unbounded() {
        return Some(future.await);
    }
    let remaining = deadline.remaining()?;
    tokio::time::timeout(remaining, future).await.ok()
}
