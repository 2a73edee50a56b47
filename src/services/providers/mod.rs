//! Provider adapters
//!
//! One adapter per wire-format family. Each translates a normalized request
//! into its backend's envelope, places the credential where that backend
//! expects it, and classifies every failure into a [`FailureKind`].

mod chat_completions;
mod descriptor;
mod gemini;
mod huggingface;

pub use chat_completions::ChatCompletionsAdapter;
pub use descriptor::{ProviderDescriptor, ProviderRegistry, WireFormat};
pub use gemini::GenerativeContentAdapter;
pub use huggingface::TextGenerationAdapter;

use crate::error::FailureKind;
use crate::services::request::GenerateRequest;
use crate::utils::{summarize_body, TimeoutConfig};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Longest error body kept in diagnostics
const MAX_ERROR_BODY_CHARS: usize = 300;

// ============================================================================
// Error Types
// ============================================================================

/// Errors from a single provider call
#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Rejected {
        status: u16,
        kind: FailureKind,
        message: String,
    },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Response contained no text")]
    EmptyResponse,
}

impl AdapterError {
    /// Rejection classified by status code alone
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        Self::Rejected {
            status: status.as_u16(),
            kind: classify_status(status),
            message: summarize_body(body, MAX_ERROR_BODY_CHARS),
        }
    }

    /// Outcome category driving the credential's health transition
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Rejected { kind, .. } => *kind,
            Self::Http(_) | Self::Parse(_) | Self::EmptyResponse => FailureKind::TransientFailure,
        }
    }
}

/// 401/403 reject the credential, 429 throttles it, anything else is transient
pub fn classify_status(status: StatusCode) -> FailureKind {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => FailureKind::AuthRejected,
        StatusCode::TOO_MANY_REQUESTS => FailureKind::RateLimited,
        _ => FailureKind::TransientFailure,
    }
}

// ============================================================================
// Adapter Trait
// ============================================================================

/// A backend wire-format family
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn wire_format(&self) -> WireFormat;

    /// Generate text with `secret` against `descriptor`'s endpoint.
    ///
    /// A successful call that yields no usable text is an error.
    async fn generate(
        &self,
        descriptor: &ProviderDescriptor,
        model: &str,
        secret: &str,
        request: &GenerateRequest,
    ) -> Result<String, AdapterError>;
}

/// Adapters keyed by the wire format they speak
#[derive(Clone, Default)]
pub struct AdapterSet {
    adapters: HashMap<WireFormat, Arc<dyn ProviderAdapter>>,
}

impl AdapterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// The three built-in adapters sharing one HTTP client
    pub fn builtin(timeouts: &TimeoutConfig) -> Result<Self, reqwest::Error> {
        let client = build_client(timeouts)?;
        Ok(Self::new()
            .with(Arc::new(ChatCompletionsAdapter::new(client.clone())))
            .with(Arc::new(GenerativeContentAdapter::new(client.clone())))
            .with(Arc::new(TextGenerationAdapter::new(client))))
    }

    /// Register `adapter`, replacing any adapter for the same wire format
    pub fn with(mut self, adapter: Arc<dyn ProviderAdapter>) -> Self {
        self.adapters.insert(adapter.wire_format(), adapter);
        self
    }

    pub fn get(&self, format: WireFormat) -> Option<&Arc<dyn ProviderAdapter>> {
        self.adapters.get(&format)
    }
}

impl std::fmt::Debug for AdapterSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.adapters.keys()).finish()
    }
}

/// HTTP client with the per-attempt timeout applied
pub fn build_client(timeouts: &TimeoutConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(timeouts.request_timeout)
        .connect_timeout(timeouts.connect_timeout)
        .build()
}

// ============================================================================
// Shared Helpers
// ============================================================================

/// Read the body of a successful response, or turn a failed one into an error
/// using `classify` for the status/body pair.
async fn read_body(
    response: Response,
    classify: impl FnOnce(StatusCode, &str) -> AdapterError,
) -> Result<String, AdapterError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(classify(status, &body));
    }
    Ok(response.text().await?)
}

/// Accept extracted text only if it has visible content
fn non_empty(text: Option<&str>) -> Result<String, AdapterError> {
    match text {
        Some(t) if !t.trim().is_empty() => Ok(t.to_string()),
        _ => Err(AdapterError::EmptyResponse),
    }
}

fn parse_json<T: serde::de::DeserializeOwned>(body: &str) -> Result<T, AdapterError> {
    serde_json::from_str(body).map_err(|e| {
        tracing::debug!(
            error = %e,
            body = %summarize_body(body, MAX_ERROR_BODY_CHARS),
            "Failed to parse provider response"
        );
        AdapterError::Parse(e.to_string())
    })
}
