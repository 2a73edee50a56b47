//! Provider descriptors
//!
//! Static description of each remote backend: wire format, endpoint, models
//! and the environment variable names its credentials may be supplied under.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Wire-format family spoken by a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum WireFormat {
    /// OpenAI-style `/chat/completions`
    ChatCompletionsCompatible,
    /// Google `generateContent`
    GenerativeContent,
    /// Anything else; currently the Hugging Face text-generation task
    Bespoke,
}

impl fmt::Display for WireFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ChatCompletionsCompatible => write!(f, "chat-completions-compatible"),
            Self::GenerativeContent => write!(f, "generative-content"),
            Self::Bespoke => write!(f, "bespoke"),
        }
    }
}

/// Static description of one backend
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ProviderDescriptor {
    /// Provider identifier, e.g. `groq`
    pub id: String,
    pub wire_format: WireFormat,
    /// Endpoint URL; `{model}` is substituted with the model identifier
    pub endpoint: String,
    /// Acceptable models, primary first
    pub models: Vec<String>,
    /// Variables holding a comma-delimited list of secrets
    pub list_vars: Vec<String>,
    /// Variables holding exactly one secret
    pub singular_vars: Vec<String>,
    /// Prefixes read as `<PREFIX><n>`
    pub numbered_prefixes: Vec<String>,
    /// Highest `n` read for numbered variables
    pub max_numbered: usize,
    /// Provider-specific headers sent with every request
    #[serde(default)]
    pub extra_headers: Vec<(String, String)>,
}

impl ProviderDescriptor {
    /// Create a descriptor with no credential variables configured
    pub fn new(
        id: impl Into<String>,
        wire_format: WireFormat,
        endpoint: impl Into<String>,
        models: &[&str],
    ) -> Self {
        Self {
            id: id.into(),
            wire_format,
            endpoint: endpoint.into(),
            models: models.iter().map(|m| m.to_string()).collect(),
            list_vars: Vec::new(),
            singular_vars: Vec::new(),
            numbered_prefixes: Vec::new(),
            max_numbered: 0,
            extra_headers: Vec::new(),
        }
    }

    pub fn with_list_vars(mut self, vars: &[&str]) -> Self {
        self.list_vars = vars.iter().map(|v| v.to_string()).collect();
        self
    }

    pub fn with_singular_vars(mut self, vars: &[&str]) -> Self {
        self.singular_vars = vars.iter().map(|v| v.to_string()).collect();
        self
    }

    pub fn with_numbered(mut self, prefixes: &[&str], max: usize) -> Self {
        self.numbered_prefixes = prefixes.iter().map(|p| p.to_string()).collect();
        self.max_numbered = max;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.push((name.into(), value.into()));
        self
    }

    /// Override the endpoint (self-hosted mirrors, mock servers)
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// The model every request is sent to
    pub fn primary_model(&self) -> Option<&str> {
        self.models.first().map(String::as_str)
    }

    /// Endpoint with `{model}` substituted
    pub fn endpoint_for(&self, model: &str) -> String {
        self.endpoint.replace("{model}", model)
    }

    /// Every variable name this provider reads, for "nothing configured" hints
    pub fn expected_vars(&self) -> Vec<String> {
        let mut vars: Vec<String> = self
            .list_vars
            .iter()
            .chain(self.singular_vars.iter())
            .cloned()
            .collect();
        vars.extend(self.numbered_prefixes.iter().map(|p| format!("{}1", p)));
        vars
    }

    /// The built-in provider table
    pub fn builtin() -> Vec<Self> {
        use WireFormat::*;

        vec![
            Self::new(
                "groq",
                ChatCompletionsCompatible,
                "https://api.groq.com/openai/v1/chat/completions",
                &["llama-3.3-70b-versatile", "llama-3.1-8b-instant", "mixtral-8x7b-32768"],
            )
            .with_list_vars(&["GROQ_API_KEYS"])
            .with_singular_vars(&["GROQ_API_KEY"])
            .with_numbered(&["GROQ_API_KEY_", "GROQ_KEY_"], 10),
            Self::new(
                "nvidia",
                ChatCompletionsCompatible,
                "https://integrate.api.nvidia.com/v1/chat/completions",
                &["meta/llama-3.1-405b-instruct", "meta/llama-3.1-70b-instruct"],
            )
            .with_list_vars(&["NVIDIA_API_KEYS"])
            .with_singular_vars(&["NVIDIA_API_KEY"])
            .with_numbered(&["NVIDIA_API_KEY_", "NVIDIA_KEY_"], 5),
            Self::new(
                "openrouter",
                ChatCompletionsCompatible,
                "https://openrouter.ai/api/v1/chat/completions",
                &["meta-llama/llama-3.3-70b-instruct:free", "google/gemma-2-9b-it:free"],
            )
            .with_list_vars(&["OPENROUTER_API_KEYS"])
            .with_singular_vars(&["OPENROUTER_API_KEY"])
            .with_numbered(&["OPENROUTER_API_KEY_", "OPENROUTER_KEY_"], 10)
            .with_header("HTTP-Referer", "https://github.com/Agnuxo1/OpenCLAW")
            .with_header("X-Title", "OpenCLAW Agent"),
            Self::new(
                "mistral",
                ChatCompletionsCompatible,
                "https://api.mistral.ai/v1/chat/completions",
                &["mistral-small-latest", "open-mistral-7b"],
            )
            .with_list_vars(&["MISTRAL_API_KEYS"])
            .with_singular_vars(&["MISTRAL_API_KEY"])
            .with_numbered(&["MISTRAL_API_KEY_", "MISTRAL_KEY_"], 5),
            Self::new(
                "deepseek",
                ChatCompletionsCompatible,
                "https://api.deepseek.com/v1/chat/completions",
                &["deepseek-chat", "deepseek-reasoner"],
            )
            .with_list_vars(&["DEEPSEEK_API_KEYS"])
            .with_singular_vars(&["DEEPSEEK_API_KEY"])
            .with_numbered(&["DEEPSEEK_API_KEY_", "DEEPSEEK_KEY_"], 10),
            Self::new(
                "zhipuai",
                ChatCompletionsCompatible,
                "https://open.bigmodel.cn/api/paas/v4/chat/completions",
                &["glm-4-flash", "glm-4"],
            )
            .with_list_vars(&["ZHIPUAI_API_KEYS"])
            .with_singular_vars(&["ZHIPUAI_API_KEY", "GLM_API_KEY"])
            .with_numbered(&["ZHIPUAI_API_KEY_", "GLM_API_KEY_", "ZHIPU_KEY_"], 10),
            Self::new(
                "gemini",
                GenerativeContent,
                "https://generativelanguage.googleapis.com/v1beta/models/{model}:generateContent",
                &["gemini-1.5-flash", "gemini-1.5-pro"],
            )
            .with_list_vars(&["GEMINI_API_KEYS"])
            .with_singular_vars(&["GEMINI_API_KEY", "GOOGLE_API_KEY"])
            .with_numbered(&["GEMINI_API_KEY_", "GOOGLE_API_KEY_"], 10),
            Self::new(
                "huggingface",
                Bespoke,
                "https://api-inference.huggingface.co/models/{model}",
                &["mistralai/Mistral-7B-Instruct-v0.3"],
            )
            .with_list_vars(&["HF_TOKEN"])
            .with_singular_vars(&["HF_API_KEY"])
            .with_numbered(&["HF_TOKEN_", "HUGGINGFACE_TOKEN_"], 10),
        ]
    }
}

/// Lookup table of descriptors by provider id, in registration order
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    descriptors: Vec<ProviderDescriptor>,
}

impl ProviderRegistry {
    pub fn new(descriptors: Vec<ProviderDescriptor>) -> Self {
        Self { descriptors }
    }

    pub fn builtin() -> Self {
        Self::new(ProviderDescriptor::builtin())
    }

    pub fn get(&self, id: &str) -> Option<&ProviderDescriptor> {
        self.descriptors.iter().find(|d| d.id == id)
    }

    pub fn all(&self) -> &[ProviderDescriptor] {
        &self.descriptors
    }

    /// Provider ids in registration order (the default preference order)
    pub fn ids(&self) -> Vec<String> {
        self.descriptors.iter().map(|d| d.id.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_providers() {
        let registry = ProviderRegistry::builtin();
        assert_eq!(
            registry.ids(),
            vec![
                "groq",
                "nvidia",
                "openrouter",
                "mistral",
                "deepseek",
                "zhipuai",
                "gemini",
                "huggingface"
            ]
        );

        for descriptor in registry.all() {
            assert!(descriptor.primary_model().is_some(), "{} has no model", descriptor.id);
            assert!(descriptor.max_numbered > 0);
            assert!(!descriptor.singular_vars.is_empty());
        }
    }

    #[test]
    fn test_endpoint_template() {
        let registry = ProviderRegistry::builtin();
        let gemini = registry.get("gemini").unwrap();
        assert_eq!(gemini.wire_format, WireFormat::GenerativeContent);
        assert_eq!(
            gemini.endpoint_for("gemini-1.5-flash"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent"
        );

        let groq = registry.get("groq").unwrap();
        assert_eq!(groq.endpoint_for("anything"), groq.endpoint);
    }

    #[test]
    fn test_endpoint_override_keeps_template() {
        let registry = ProviderRegistry::builtin();
        let mirror = registry
            .get("huggingface")
            .unwrap()
            .clone()
            .with_endpoint("http://127.0.0.1:8080/models/{model}");
        assert_eq!(
            mirror.endpoint_for("mistralai/Mistral-7B-Instruct-v0.3"),
            "http://127.0.0.1:8080/models/mistralai/Mistral-7B-Instruct-v0.3"
        );
        assert_eq!(mirror.list_vars, vec!["HF_TOKEN"]);
        assert_eq!(mirror.singular_vars, vec!["HF_API_KEY"]);
    }

    #[test]
    fn test_openrouter_attribution_headers() {
        let registry = ProviderRegistry::builtin();
        let openrouter = registry.get("openrouter").unwrap();
        let names: Vec<&str> = openrouter
            .extra_headers
            .iter()
            .map(|(n, _)| n.as_str())
            .collect();
        assert_eq!(names, vec!["HTTP-Referer", "X-Title"]);
        assert!(registry.get("groq").unwrap().extra_headers.is_empty());
    }

    #[test]
    fn test_expected_vars() {
        let descriptor = ProviderDescriptor::new("x", WireFormat::Bespoke, "http://x", &["m"])
            .with_list_vars(&["X_KEYS"])
            .with_singular_vars(&["X_KEY"])
            .with_numbered(&["X_KEY_"], 3);
        assert_eq!(descriptor.expected_vars(), vec!["X_KEYS", "X_KEY", "X_KEY_1"]);
    }

    #[test]
    fn test_wire_format_display() {
        assert_eq!(
            WireFormat::ChatCompletionsCompatible.to_string(),
            "chat-completions-compatible"
        );
        assert_eq!(WireFormat::GenerativeContent.to_string(), "generative-content");
    }
}
