//! Gateway
//!
//! Routes one generation request across the candidate sequence, stopping at
//! the first success and feeding every outcome back into the pool.

use super::backend_pool::{
    Candidate, CredentialLoader, CredentialPool, EnvSource, HealthSnapshot, PoolConfig,
    ProviderPreference,
};
use super::providers::{AdapterError, AdapterSet, ProviderRegistry};
use super::request::{GenerateRequest, Generation};
use crate::error::{AttemptDiagnostic, FailureKind, GatewayError, GatewayResult};
use crate::utils::{within_deadline, Deadline, TimeoutConfig};
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;

/// Multi-provider text generation with failover
#[derive(Debug, Clone)]
pub struct Gateway {
    pool: Arc<CredentialPool>,
    registry: Arc<ProviderRegistry>,
    adapters: AdapterSet,
    default_deadline: Duration,
}

impl Gateway {
    pub fn new(pool: Arc<CredentialPool>, registry: ProviderRegistry, adapters: AdapterSet) -> Self {
        Self {
            pool,
            registry: Arc::new(registry),
            adapters,
            default_deadline: TimeoutConfig::default().generate_deadline,
        }
    }

    pub fn with_default_deadline(mut self, deadline: Duration) -> Self {
        self.default_deadline = deadline;
        self
    }

    /// Load credentials from `env` for every registered provider and wire up
    /// the built-in adapters.
    ///
    /// Without an explicit preference, providers rank in registration order.
    pub fn from_env(
        registry: ProviderRegistry,
        env: &impl EnvSource,
        mut pool_config: PoolConfig,
        timeouts: &TimeoutConfig,
    ) -> Result<Self, reqwest::Error> {
        if pool_config.preference.is_empty() {
            pool_config.preference = ProviderPreference::new(registry.ids());
        }

        let loaded = CredentialLoader::new().load(registry.all(), env);

        if loaded.is_empty() {
            let expected: Vec<String> = registry
                .all()
                .iter()
                .flat_map(|d| d.expected_vars())
                .collect();
            tracing::error!(
                expected = %expected.join(", "),
                "No LLM credentials configured; set at least one of the expected variables"
            );
        }

        let pool = Arc::new(CredentialPool::new(loaded, pool_config));
        let adapters = AdapterSet::builtin(timeouts)?;
        Ok(Self::new(pool, registry, adapters).with_default_deadline(timeouts.generate_deadline))
    }

    pub fn pool(&self) -> &Arc<CredentialPool> {
        &self.pool
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Read-only health view of the pool
    pub fn snapshot(&self) -> HealthSnapshot {
        self.pool.snapshot()
    }

    /// Generate text, failing over across candidates until one succeeds.
    pub async fn generate(&self, request: &GenerateRequest) -> GatewayResult<Generation> {
        let request_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!("generate", request_id = %request_id);
        self.generate_inner(request).instrument(span).await
    }

    async fn generate_inner(&self, request: &GenerateRequest) -> GatewayResult<Generation> {
        let candidates = self.pool.select_candidates();
        if candidates.is_empty() {
            let configured = self.pool.len();
            tracing::warn!(configured, "No credential available for generation");
            return Err(GatewayError::NoCredentialsAvailable { configured });
        }

        let deadline = Deadline::after(request.deadline.unwrap_or(self.default_deadline));
        let total = candidates.len();
        let mut attempts: Vec<AttemptDiagnostic> = Vec::new();

        tracing::debug!(candidates = total, "Starting generation");

        for candidate in candidates {
            if deadline.is_expired() {
                return Err(self.deadline_exceeded(attempts, total));
            }

            let outcome = match within_deadline(&deadline, self.attempt(&candidate, request)).await {
                Some(outcome) => outcome,
                // The cancelled attempt says nothing about the credential
                None => return Err(self.deadline_exceeded(attempts, total)),
            };

            match outcome {
                Ok((model, text)) => {
                    self.pool.mark_success(candidate.id);
                    tracing::info!(
                        credential = %candidate.label(),
                        model = %model,
                        attempts = attempts.len() + 1,
                        "Generation succeeded"
                    );
                    return Ok(Generation {
                        text,
                        provider: candidate.provider,
                        model,
                        credential: candidate.index,
                        attempts: attempts.len() + 1,
                    });
                }
                Err(diagnostic) => {
                    self.pool.mark_failure(candidate.id, diagnostic.kind);
                    tracing::warn!(
                        credential = %candidate.label(),
                        model = %diagnostic.model,
                        kind = %diagnostic.kind,
                        error = %diagnostic.message,
                        "Provider attempt failed, trying next candidate"
                    );
                    attempts.push(diagnostic);
                }
            }
        }

        tracing::error!(attempts = attempts.len(), "All candidates failed");
        Err(GatewayError::ExhaustedPool {
            attempts,
            deadline_exceeded: false,
        })
    }

    /// One provider call with `candidate`; the error side is already a
    /// diagnostic ready to be recorded.
    async fn attempt(
        &self,
        candidate: &Candidate,
        request: &GenerateRequest,
    ) -> Result<(String, String), AttemptDiagnostic> {
        let diagnostic = |model: &str, kind: FailureKind, message: String| AttemptDiagnostic {
            provider: candidate.provider.clone(),
            credential: candidate.index,
            model: model.to_string(),
            kind,
            message,
        };

        let Some(descriptor) = self.registry.get(&candidate.provider) else {
            return Err(diagnostic(
                "",
                FailureKind::TransientFailure,
                format!("unknown provider '{}'", candidate.provider),
            ));
        };
        let Some(model) = descriptor.primary_model() else {
            return Err(diagnostic(
                "",
                FailureKind::TransientFailure,
                "provider has no models configured".to_string(),
            ));
        };
        let Some(adapter) = self.adapters.get(descriptor.wire_format) else {
            return Err(diagnostic(
                model,
                FailureKind::TransientFailure,
                format!("no adapter for wire format {}", descriptor.wire_format),
            ));
        };

        tracing::debug!(credential = %candidate.label(), model = %model, "Attempting provider");

        adapter
            .generate(descriptor, model, &candidate.secret, request)
            .await
            .map(|text| (model.to_string(), text))
            .map_err(|e: AdapterError| diagnostic(model, e.kind(), e.to_string()))
    }

    fn deadline_exceeded(&self, attempts: Vec<AttemptDiagnostic>, total: usize) -> GatewayError {
        tracing::error!(
            attempts = attempts.len(),
            skipped = total - attempts.len(),
            "Generation deadline exceeded"
        );
        GatewayError::ExhaustedPool {
            attempts,
            deadline_exceeded: true,
        }
    }
}
