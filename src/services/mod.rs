//! Services module
//!
//! Contains the credential pool, the provider adapters and the gateway that
//! routes generation requests across them.

pub mod backend_pool;
pub mod gateway;
pub mod providers;
pub mod request;

pub use backend_pool::{
    CooldownPolicy, CredentialLoader, CredentialPool, HealthSnapshot, PoolConfig,
    ProviderHealth, ProviderPreference,
};
pub use gateway::Gateway;
pub use providers::{AdapterSet, ProviderAdapter, ProviderDescriptor, ProviderRegistry, WireFormat};
pub use request::{GenerateRequest, Generation};
