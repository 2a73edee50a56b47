//! Multi-provider text-generation gateway library

// Public modules
pub mod config;
pub mod error;
pub mod schemas;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use error::{AttemptDiagnostic, FailureKind, GatewayError, GatewayResult};
pub use services::{Gateway, GenerateRequest, Generation, HealthSnapshot};
