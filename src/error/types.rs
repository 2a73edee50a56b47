//! Gateway error types

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Classified outcome of one failed provider attempt
///
/// Recovered locally by the gateway's failover loop; each kind drives a
/// different cooldown transition on the credential that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Credential invalid, expired or revoked (HTTP 401/403)
    AuthRejected,
    /// Backend throttled the credential (HTTP 429)
    RateLimited,
    /// Network error, timeout, unexpected status or unusable body
    TransientFailure,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AuthRejected => write!(f, "auth_rejected"),
            Self::RateLimited => write!(f, "rate_limited"),
            Self::TransientFailure => write!(f, "transient_failure"),
        }
    }
}

/// One failed attempt recorded during a `generate` call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttemptDiagnostic {
    pub provider: String,
    /// Per-provider credential index, as shown in logs (`groq#2`)
    pub credential: usize,
    pub model: String,
    pub kind: FailureKind,
    pub message: String,
}

impl fmt::Display for AttemptDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}#{} ({}): {}: {}",
            self.provider, self.credential, self.model, self.kind, self.message
        )
    }
}

/// Terminal failures of a `generate` call
#[derive(Error, Debug, Clone)]
pub enum GatewayError {
    /// No credential was selectable when the call started.
    ///
    /// `configured == 0` means nothing was loaded at startup; otherwise every
    /// configured credential is cooling down.
    #[error("No credentials available ({configured} configured, all cooling down or none loaded)")]
    NoCredentialsAvailable { configured: usize },

    /// Every candidate was tried and failed, or the call deadline cut the
    /// sequence short.
    #[error("All {} candidate(s) failed{}", .attempts.len(), deadline_suffix(.deadline_exceeded))]
    ExhaustedPool {
        attempts: Vec<AttemptDiagnostic>,
        deadline_exceeded: bool,
    },
}

impl GatewayError {
    /// Diagnostics gathered before the call gave up
    pub fn attempts(&self) -> &[AttemptDiagnostic] {
        match self {
            Self::NoCredentialsAvailable { .. } => &[],
            Self::ExhaustedPool { attempts, .. } => attempts,
        }
    }

    /// The provider/credential that last attempted the call
    pub fn last_attempt(&self) -> Option<&AttemptDiagnostic> {
        self.attempts().last()
    }

    pub fn is_not_configured(&self) -> bool {
        matches!(self, Self::NoCredentialsAvailable { configured: 0 })
    }
}

fn deadline_suffix(deadline_exceeded: &bool) -> &'static str {
    if *deadline_exceeded {
        " before the deadline expired"
    } else {
        ""
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn diagnostic(provider: &str, kind: FailureKind) -> AttemptDiagnostic {
        AttemptDiagnostic {
            provider: provider.to_string(),
            credential: 1,
            model: "m".to_string(),
            kind,
            message: "HTTP 429".to_string(),
        }
    }

    #[test]
    fn test_exhausted_pool_message() {
        let err = GatewayError::ExhaustedPool {
            attempts: vec![
                diagnostic("groq", FailureKind::RateLimited),
                diagnostic("gemini", FailureKind::AuthRejected),
            ],
            deadline_exceeded: false,
        };
        assert_eq!(err.to_string(), "All 2 candidate(s) failed");
        assert_eq!(err.last_attempt().unwrap().provider, "gemini");
    }

    #[test]
    fn test_deadline_message() {
        let err = GatewayError::ExhaustedPool {
            attempts: vec![],
            deadline_exceeded: true,
        };
        assert!(err.to_string().contains("deadline"));
        assert!(err.last_attempt().is_none());
    }

    #[test]
    fn test_not_configured() {
        assert!(GatewayError::NoCredentialsAvailable { configured: 0 }.is_not_configured());
        assert!(!GatewayError::NoCredentialsAvailable { configured: 3 }.is_not_configured());
    }

    #[test]
    fn test_diagnostic_display() {
        let d = diagnostic("groq", FailureKind::RateLimited);
        assert_eq!(d.to_string(), "groq#1 (m): rate_limited: HTTP 429");
    }
}
