//! Error types

mod types;

pub use types::{AttemptDiagnostic, FailureKind, GatewayError, GatewayResult};
