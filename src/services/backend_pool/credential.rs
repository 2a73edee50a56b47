//! Credential records and health policy
//!
//! This module defines the per-credential health state and the cooldown
//! transitions applied after each provider attempt.

use crate::error::FailureKind;
use crate::utils::mask_secret;
use std::fmt;
use std::time::{Duration, Instant};

// ============================================================================
// Cooldown Policy
// ============================================================================

/// Longest cooldown ever applied; larger configured values are clamped
pub const MAX_COOLDOWN: Duration = Duration::from_secs(30 * 24 * 3600);

/// Cooldown durations applied on failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CooldownPolicy {
    /// Cooldown after an authentication rejection, independent of history
    pub auth_cooldown: Duration,
    /// Base of the exponential rate-limit backoff
    pub rate_limit_base: Duration,
    /// Ceiling of the exponential rate-limit backoff
    pub rate_limit_ceiling: Duration,
    /// Transient failures tolerated before the credential cools down
    pub failure_threshold: u32,
    /// Cooldown once `failure_threshold` transient failures accumulate
    pub failure_cooldown: Duration,
}

impl Default for CooldownPolicy {
    fn default() -> Self {
        Self {
            auth_cooldown: Duration::from_secs(3600),
            rate_limit_base: Duration::from_secs(30),
            rate_limit_ceiling: Duration::from_secs(600),
            failure_threshold: 3,
            failure_cooldown: Duration::from_secs(300), // 5 minutes
        }
    }
}

impl CooldownPolicy {
    pub fn with_auth_cooldown(mut self, cooldown: Duration) -> Self {
        self.auth_cooldown = cooldown;
        self
    }

    pub fn with_rate_limit_backoff(mut self, base: Duration, ceiling: Duration) -> Self {
        self.rate_limit_base = base;
        self.rate_limit_ceiling = ceiling;
        self
    }

    pub fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold;
        self
    }

    pub fn with_failure_cooldown(mut self, cooldown: Duration) -> Self {
        self.failure_cooldown = cooldown;
        self
    }

    /// `min(ceiling, base * 2^failures)`
    pub fn rate_limit_backoff(&self, failures: u32) -> Duration {
        let factor = 1u32.checked_shl(failures).unwrap_or(u32::MAX);
        self.rate_limit_base
            .checked_mul(factor)
            .map_or(self.rate_limit_ceiling, |d| d.min(self.rate_limit_ceiling))
    }
}

// ============================================================================
// Credential Record
// ============================================================================

/// One secret for one provider, with its health state
///
/// A record is available while `disabled_until` is unset or in the past.
/// Once a cooldown elapses the failure counter counts as zero; the stored
/// counter is rewritten on the next transition.
pub struct CredentialRecord {
    provider: String,
    secret: String,
    /// Per-provider sequence number, for logs only
    index: usize,
    failures: u32,
    disabled_until: Option<Instant>,
    last_used: Option<Instant>,
}

impl CredentialRecord {
    pub fn new(provider: impl Into<String>, secret: impl Into<String>, index: usize) -> Self {
        Self {
            provider: provider.into(),
            secret: secret.into(),
            index,
            failures: 0,
            disabled_until: None,
            last_used: None,
        }
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn last_used(&self) -> Option<Instant> {
        self.last_used
    }

    pub fn disabled_until(&self) -> Option<Instant> {
        self.disabled_until
    }

    /// `provider#index`, the form used in logs and diagnostics
    pub fn label(&self) -> String {
        format!("{}#{}", self.provider, self.index)
    }

    pub fn is_available_at(&self, now: Instant) -> bool {
        self.disabled_until.map_or(true, |until| now >= until)
    }

    /// Failure count as seen at `now`; an elapsed cooldown reads as zero
    pub fn failures_at(&self, now: Instant) -> u32 {
        match self.disabled_until {
            Some(until) if now >= until => 0,
            _ => self.failures,
        }
    }

    /// Commit the healing of an elapsed cooldown
    fn refresh(&mut self, now: Instant) {
        if matches!(self.disabled_until, Some(until) if now >= until) {
            self.disabled_until = None;
            self.failures = 0;
        }
    }

    pub fn record_success(&mut self, now: Instant) {
        self.failures = 0;
        self.disabled_until = None;
        self.last_used = Some(now);
    }

    /// Apply the cooldown transition for `kind`.
    ///
    /// Returns the cooldown started by this failure, if any.
    pub fn record_failure(
        &mut self,
        kind: FailureKind,
        policy: &CooldownPolicy,
        now: Instant,
    ) -> Option<Duration> {
        self.refresh(now);
        self.last_used = Some(now);

        let cooldown = match kind {
            FailureKind::AuthRejected => Some(policy.auth_cooldown),
            FailureKind::RateLimited => Some(policy.rate_limit_backoff(self.failures)),
            FailureKind::TransientFailure => {
                (self.failures + 1 >= policy.failure_threshold).then_some(policy.failure_cooldown)
            }
        };
        self.failures = self.failures.saturating_add(1);

        let cooldown = cooldown.map(|d| d.min(MAX_COOLDOWN));
        if let Some(duration) = cooldown {
            self.disabled_until = Some(now.checked_add(duration).unwrap_or(now));
        }
        cooldown
    }
}

// The secret never reaches Debug output.
impl fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("provider", &self.provider)
            .field("secret", &mask_secret(&self.secret))
            .field("index", &self.index)
            .field("failures", &self.failures)
            .field("disabled_until", &self.disabled_until)
            .field("last_used", &self.last_used)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
