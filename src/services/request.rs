//! Normalized generation request and response

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_MAX_TOKENS: u32 = 1024;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// A provider-independent generation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub prompt: String,
    #[serde(default)]
    pub system: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Overrides the gateway's default deadline for this call
    #[serde(skip)]
    pub deadline: Option<Duration>,
}

impl GenerateRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system: None,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            deadline: None,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// System instruction, if present and non-blank
    pub fn system_text(&self) -> Option<&str> {
        self.system.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

/// Successful generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Generation {
    pub text: String,
    pub provider: String,
    pub model: String,
    /// Per-provider index of the credential that served the request
    pub credential: usize,
    /// Attempts made, including the successful one
    pub attempts: usize,
}
