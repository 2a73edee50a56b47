//! Backend Pool Module
//!
//! Manages the credentials of every provider: loading them from the
//! environment, tracking per-credential health, and ordering candidates for
//! each request.
//!
//! # Features
//! - Three merged naming conventions (list, numbered, singular) with dedup
//! - Differentiated cooldowns for auth rejections, rate limits and transient errors
//! - Preference-ranked, health-aware, least-recently-used candidate ordering
//! - Read-only health snapshot for observability
//!
//! # Example
//! ```ignore
//! use llm_gateway::services::backend_pool::{CredentialLoader, CredentialPool, PoolConfig, ProcessEnv};
//! use llm_gateway::services::providers::ProviderRegistry;
//!
//! let registry = ProviderRegistry::builtin();
//! let loaded = CredentialLoader::new().load(registry.all(), &ProcessEnv);
//! let pool = CredentialPool::new(loaded, PoolConfig::default());
//!
//! for candidate in pool.select_candidates() {
//!     println!("would try {}", candidate.label());
//! }
//! ```

mod credential;
mod loader;
mod pool;
mod strategy;

pub use credential::{CooldownPolicy, CredentialRecord, MAX_COOLDOWN};
pub use loader::{
    CredentialLoader, EnvSource, LoadedCredential, LoadedCredentials, ProcessEnv, MIN_SECRET_LEN,
};
pub use pool::{
    Candidate, CredentialId, CredentialPool, HealthSnapshot, PoolConfig, ProviderHealth,
};
pub use strategy::ProviderPreference;
