//! Candidate ordering
//!
//! Orders available credentials by provider preference, then health, then
//! least-recent use so load spreads across a provider's keys.

use super::credential::CredentialRecord;
use std::cmp::Ordering;
use std::time::Instant;

// ============================================================================
// Provider Preference
// ============================================================================

/// Operator-configured provider preference order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderPreference {
    order: Vec<String>,
}

impl ProviderPreference {
    pub fn new<I, S>(providers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            order: providers.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse a comma-delimited list (case-insensitive, blanks ignored)
    pub fn parse(s: &str) -> Self {
        Self::new(
            s.split(',')
                .map(|p| p.trim().to_lowercase())
                .filter(|p| !p.is_empty()),
        )
    }

    /// Position in the preference list; unlisted providers rank last
    pub fn rank(&self, provider: &str) -> usize {
        self.order
            .iter()
            .position(|p| p == provider)
            .unwrap_or(usize::MAX)
    }

    pub fn providers(&self) -> &[String] {
        &self.order
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

// ============================================================================
// Ordering
// ============================================================================

/// Compare two available records for candidate order at `now`
pub fn candidate_order(
    preference: &ProviderPreference,
    a: &CredentialRecord,
    b: &CredentialRecord,
    now: Instant,
) -> Ordering {
    preference
        .rank(a.provider())
        .cmp(&preference.rank(b.provider()))
        .then_with(|| a.failures_at(now).cmp(&b.failures_at(now)))
        // `None` sorts before `Some`: never-used keys go first
        .then_with(|| a.last_used().cmp(&b.last_used()))
}

// ============================================================================
// Tests
// ============================================================================
