//! Gateway settings and configuration
//!
//! This module loads runtime configuration from environment variables (and a
//! `.env` file, if present) with sensible defaults.

use crate::services::backend_pool::{
    CooldownPolicy, EnvSource, PoolConfig, ProcessEnv, ProviderPreference, MAX_COOLDOWN,
};
use crate::utils::TimeoutConfig;
use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Upper bound for request timeouts and the generate deadline
const MAX_TIMEOUT: Duration = Duration::from_secs(24 * 3600);

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Pretty => write!(f, "pretty"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => anyhow::bail!("Invalid log format: {}. Expected: pretty or json", s),
        }
    }
}

/// Runtime settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub log_level: String,
    pub log_format: LogFormat,

    /// Provider ids in preference order; empty means registration order
    pub preferred_providers: ProviderPreference,

    pub timeouts: TimeoutConfig,
    pub cooldown: CooldownPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::default(),
            preferred_providers: ProviderPreference::default(),
            timeouts: TimeoutConfig::default(),
            cooldown: CooldownPolicy::default(),
        }
    }
}

impl Settings {
    /// Load settings from the process environment
    pub fn load() -> Result<Self> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();
        Self::from_source(&ProcessEnv)
    }

    /// Load settings from an arbitrary variable source
    pub fn from_source(env: &impl EnvSource) -> Result<Self> {
        let settings = Self {
            log_level: env_or_default(env, "LOG_LEVEL", "info"),
            log_format: env_or_default(env, "LOG_FORMAT", "pretty")
                .parse()
                .context("Invalid LOG_FORMAT value")?,
            preferred_providers: ProviderPreference::parse(&env_or_default(
                env,
                "LLM_PREFERRED_PROVIDERS",
                "",
            )),

            timeouts: TimeoutConfig {
                request_timeout: secs(env, "LLM_REQUEST_TIMEOUT_SECS", 60)?,
                connect_timeout: secs(env, "LLM_CONNECT_TIMEOUT_SECS", 10)?,
                generate_deadline: secs(env, "LLM_GENERATE_DEADLINE_SECS", 180)?,
            },

            cooldown: CooldownPolicy {
                auth_cooldown: secs(env, "LLM_AUTH_COOLDOWN_SECS", 3600)?,
                rate_limit_base: secs(env, "LLM_RATE_LIMIT_BASE_SECS", 30)?,
                rate_limit_ceiling: secs(env, "LLM_RATE_LIMIT_MAX_SECS", 600)?,
                failure_threshold: env_or_default(env, "LLM_FAILURE_THRESHOLD", "3")
                    .trim()
                    .parse()
                    .context("Invalid LLM_FAILURE_THRESHOLD value")?,
                failure_cooldown: secs(env, "LLM_FAILURE_COOLDOWN_SECS", 300)?,
            },
        };

        settings.validate()?;
        Ok(settings)
    }

    /// Validate settings
    fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("LLM_REQUEST_TIMEOUT_SECS", self.timeouts.request_timeout),
            ("LLM_CONNECT_TIMEOUT_SECS", self.timeouts.connect_timeout),
            ("LLM_GENERATE_DEADLINE_SECS", self.timeouts.generate_deadline),
            ("LLM_AUTH_COOLDOWN_SECS", self.cooldown.auth_cooldown),
            ("LLM_RATE_LIMIT_BASE_SECS", self.cooldown.rate_limit_base),
            ("LLM_FAILURE_COOLDOWN_SECS", self.cooldown.failure_cooldown),
        ] {
            if value.is_zero() {
                anyhow::bail!("{} must be > 0", name);
            }
        }

        for (name, value) in [
            ("LLM_REQUEST_TIMEOUT_SECS", self.timeouts.request_timeout),
            ("LLM_CONNECT_TIMEOUT_SECS", self.timeouts.connect_timeout),
            ("LLM_GENERATE_DEADLINE_SECS", self.timeouts.generate_deadline),
        ] {
            if value > MAX_TIMEOUT {
                anyhow::bail!("{} must be <= {}", name, MAX_TIMEOUT.as_secs());
            }
        }

        for (name, value) in [
            ("LLM_AUTH_COOLDOWN_SECS", self.cooldown.auth_cooldown),
            ("LLM_RATE_LIMIT_MAX_SECS", self.cooldown.rate_limit_ceiling),
            ("LLM_FAILURE_COOLDOWN_SECS", self.cooldown.failure_cooldown),
        ] {
            if value > MAX_COOLDOWN {
                anyhow::bail!("{} must be <= {}", name, MAX_COOLDOWN.as_secs());
            }
        }

        if self.cooldown.failure_threshold == 0 {
            anyhow::bail!("LLM_FAILURE_THRESHOLD must be > 0");
        }

        if self.cooldown.rate_limit_base > self.cooldown.rate_limit_ceiling {
            anyhow::bail!(
                "LLM_RATE_LIMIT_BASE_SECS ({}) must not exceed LLM_RATE_LIMIT_MAX_SECS ({})",
                self.cooldown.rate_limit_base.as_secs(),
                self.cooldown.rate_limit_ceiling.as_secs()
            );
        }

        if self.timeouts.generate_deadline < self.timeouts.request_timeout {
            tracing::warn!(
                deadline_secs = self.timeouts.generate_deadline.as_secs(),
                request_timeout_secs = self.timeouts.request_timeout.as_secs(),
                "Generate deadline is shorter than the per-request timeout"
            );
        }

        Ok(())
    }

    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig::new(self.preferred_providers.clone()).with_policy(self.cooldown)
    }

    pub fn timeout_config(&self) -> TimeoutConfig {
        self.timeouts
    }
}

/// Helper function to get a variable with default
fn env_or_default(env: &impl EnvSource, key: &str, default: &str) -> String {
    env.get(key).unwrap_or_else(|| default.to_string())
}

fn secs(env: &impl EnvSource, key: &str, default: u64) -> Result<Duration> {
    let value: u64 = env_or_default(env, key, &default.to_string())
        .trim()
        .parse()
        .with_context(|| format!("Invalid {} value", key))?;
    Ok(Duration::from_secs(value))
}
