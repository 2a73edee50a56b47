//! Credential Pool Implementation
//!
//! This module provides the `CredentialPool` that owns every credential
//! record, orders candidates for a request and applies health transitions.

use super::credential::{CooldownPolicy, CredentialRecord};
use super::loader::LoadedCredentials;
use super::strategy::{candidate_order, ProviderPreference};
use crate::error::FailureKind;
use crate::utils::mask_secret;
use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

// ============================================================================
// Pool Configuration
// ============================================================================

/// Configuration for credential pool behavior
#[derive(Debug, Clone, Default)]
pub struct PoolConfig {
    /// Provider preference order for candidate selection
    pub preference: ProviderPreference,
    /// Cooldown transitions applied on failure
    pub policy: CooldownPolicy,
}

impl PoolConfig {
    pub fn new(preference: ProviderPreference) -> Self {
        Self {
            preference,
            ..Default::default()
        }
    }

    pub fn with_policy(mut self, policy: CooldownPolicy) -> Self {
        self.policy = policy;
        self
    }
}

// ============================================================================
// Candidate
// ============================================================================

/// Stable identity of a record within its pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CredentialId(usize);

/// Detached view of an available credential, handed to the gateway
#[derive(Clone)]
pub struct Candidate {
    pub id: CredentialId,
    pub provider: String,
    pub secret: String,
    pub index: usize,
}

impl Candidate {
    pub fn label(&self) -> String {
        format!("{}#{}", self.provider, self.index)
    }
}

impl fmt::Debug for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Candidate")
            .field("id", &self.id)
            .field("provider", &self.provider)
            .field("secret", &mask_secret(&self.secret))
            .field("index", &self.index)
            .finish()
    }
}

// ============================================================================
// Credential Pool
// ============================================================================

/// Every credential the gateway may use, behind one lock
///
/// Selection and mutation each take the lock briefly; no caller holds it
/// across a provider call.
#[derive(Debug)]
pub struct CredentialPool {
    records: Mutex<Vec<CredentialRecord>>,
    config: PoolConfig,
}

impl CredentialPool {
    /// Build a pool from loader output.
    ///
    /// Records are numbered per provider and shuffled so that never-used
    /// keys are not always tried in the same order.
    pub fn new(credentials: LoadedCredentials, config: PoolConfig) -> Self {
        let mut next_index: HashMap<String, usize> = HashMap::new();
        let mut records: Vec<CredentialRecord> = credentials
            .into_vec()
            .into_iter()
            .map(|cred| {
                let index = next_index.entry(cred.provider.clone()).or_insert(0);
                *index += 1;
                CredentialRecord::new(cred.provider, cred.secret, *index)
            })
            .collect();
        records.shuffle(&mut rand::thread_rng());

        let pool = Self::from_records(records, config);
        tracing::info!(
            total = pool.len(),
            providers = pool.snapshot().providers.len(),
            "Initialized credential pool"
        );
        pool
    }

    /// Build a pool from prepared records, keeping their order
    pub fn from_records(records: Vec<CredentialRecord>, config: PoolConfig) -> Self {
        Self {
            records: Mutex::new(records),
            config,
        }
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// A panic elsewhere never leaves a record half-written, so a poisoned
    /// lock is still consistent.
    fn records(&self) -> MutexGuard<'_, Vec<CredentialRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Total number of credentials, available or not
    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records().is_empty()
    }

    /// Available credentials in the order they should be tried
    pub fn select_candidates(&self) -> Vec<Candidate> {
        self.select_candidates_at(Instant::now())
    }

    pub fn select_candidates_at(&self, now: Instant) -> Vec<Candidate> {
        let records = self.records();
        let mut available: Vec<(usize, &CredentialRecord)> = records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.is_available_at(now))
            .collect();
        available.sort_by(|(_, a), (_, b)| candidate_order(&self.config.preference, a, b, now));

        available
            .into_iter()
            .map(|(position, record)| Candidate {
                id: CredentialId(position),
                provider: record.provider().to_string(),
                secret: record.secret().to_string(),
                index: record.index(),
            })
            .collect()
    }

    /// Record a successful attempt
    pub fn mark_success(&self, id: CredentialId) {
        self.mark_success_at(id, Instant::now());
    }

    pub fn mark_success_at(&self, id: CredentialId, now: Instant) {
        if let Some(record) = self.records().get_mut(id.0) {
            record.record_success(now);
        }
    }

    /// Record a failed attempt.
    ///
    /// Returns the cooldown the credential entered, if any.
    pub fn mark_failure(&self, id: CredentialId, kind: FailureKind) -> Option<Duration> {
        self.mark_failure_at(id, kind, Instant::now())
    }

    pub fn mark_failure_at(
        &self,
        id: CredentialId,
        kind: FailureKind,
        now: Instant,
    ) -> Option<Duration> {
        let mut records = self.records();
        let record = records.get_mut(id.0)?;
        let cooldown = record.record_failure(kind, &self.config.policy, now);

        if let Some(duration) = cooldown {
            tracing::warn!(
                credential = %record.label(),
                kind = %kind,
                cooldown_secs = duration.as_secs(),
                "Credential cooling down"
            );
        }
        cooldown
    }

    /// Per-provider counts for observability
    pub fn snapshot(&self) -> HealthSnapshot {
        self.snapshot_at(Instant::now())
    }

    pub fn snapshot_at(&self, now: Instant) -> HealthSnapshot {
        let mut providers: BTreeMap<String, ProviderHealth> = BTreeMap::new();
        for record in self.records().iter() {
            let entry = providers.entry(record.provider().to_string()).or_default();
            entry.total += 1;
            if record.is_available_at(now) {
                entry.available += 1;
            } else {
                entry.disabled += 1;
            }
        }

        HealthSnapshot {
            taken_at: Utc::now(),
            providers,
        }
    }
}

// ============================================================================
// Health Snapshot
// ============================================================================

/// Credential counts for one provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProviderHealth {
    pub total: usize,
    pub available: usize,
    pub disabled: usize,
}

/// Read-only health view of the pool
#[derive(Debug, Clone, Serialize)]
pub struct HealthSnapshot {
    pub taken_at: DateTime<Utc>,
    pub providers: BTreeMap<String, ProviderHealth>,
}

impl HealthSnapshot {
    pub fn total(&self) -> usize {
        self.providers.values().map(|p| p.total).sum()
    }

    pub fn available(&self) -> usize {
        self.providers.values().map(|p| p.available).sum()
    }

    /// At least one credential can serve a request right now
    pub fn is_healthy(&self) -> bool {
        self.available() > 0
    }
}

// ============================================================================
// Tests
// ============================================================================
