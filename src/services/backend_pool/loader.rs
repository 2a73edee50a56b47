//! Credential loading
//!
//! Reads operator-supplied secrets for every provider from an environment
//! source, merging the list, numbered and singular naming conventions.

use crate::services::providers::ProviderDescriptor;
use crate::utils::mask_secret;
use std::collections::{BTreeSet, HashMap};

/// Secrets shorter than this are treated as placeholders or truncated values
pub const MIN_SECRET_LEN: usize = 10;

// ============================================================================
// Environment Source
// ============================================================================

/// Read-only view of configuration variables
pub trait EnvSource {
    fn get(&self, name: &str) -> Option<String>;
}

/// The process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn get(&self, name: &str) -> Option<String> {
        HashMap::get(self, name).cloned()
    }
}

// ============================================================================
// Loaded Credentials
// ============================================================================

/// One (provider, secret) pair
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct LoadedCredential {
    pub provider: String,
    pub secret: String,
}

impl std::fmt::Debug for LoadedCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedCredential")
            .field("provider", &self.provider)
            .field("secret", &mask_secret(&self.secret))
            .finish()
    }
}

/// Deduplicated loader output
#[derive(Debug, Clone, Default)]
pub struct LoadedCredentials {
    credentials: Vec<LoadedCredential>,
}

impl LoadedCredentials {
    pub fn new(credentials: Vec<LoadedCredential>) -> Self {
        let unique: BTreeSet<LoadedCredential> = credentials.into_iter().collect();
        Self {
            credentials: unique.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    /// No secrets for any provider; a configuration state, not a failure
    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LoadedCredential> {
        self.credentials.iter()
    }

    pub fn count_for(&self, provider: &str) -> usize {
        self.credentials
            .iter()
            .filter(|c| c.provider == provider)
            .count()
    }

    pub fn into_vec(self) -> Vec<LoadedCredential> {
        self.credentials
    }
}

// ============================================================================
// Loader
// ============================================================================

/// Loads credentials for a set of providers
#[derive(Debug, Clone)]
pub struct CredentialLoader {
    min_secret_len: usize,
}

impl Default for CredentialLoader {
    fn default() -> Self {
        Self {
            min_secret_len: MIN_SECRET_LEN,
        }
    }
}

impl CredentialLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min_secret_len(mut self, len: usize) -> Self {
        self.min_secret_len = len;
        self
    }

    /// Load every provider's secrets from `env`
    pub fn load(&self, descriptors: &[ProviderDescriptor], env: &impl EnvSource) -> LoadedCredentials {
        let mut all = Vec::new();

        for descriptor in descriptors {
            let secrets = self.load_provider(descriptor, env);
            if !secrets.is_empty() {
                tracing::info!(
                    provider = %descriptor.id,
                    count = secrets.len(),
                    "Loaded provider credentials"
                );
            }
            all.extend(secrets.into_iter().map(|secret| LoadedCredential {
                provider: descriptor.id.clone(),
                secret,
            }));
        }

        LoadedCredentials::new(all)
    }

    /// Union of the three naming conventions for one provider
    pub fn load_provider(
        &self,
        descriptor: &ProviderDescriptor,
        env: &impl EnvSource,
    ) -> BTreeSet<String> {
        let mut found = BTreeSet::new();

        // List form: PROVIDER_API_KEYS="k1,k2,k3"
        for var in &descriptor.list_vars {
            if let Some(value) = env.get(var) {
                for candidate in value.split(',') {
                    self.accept(&mut found, var, candidate);
                }
            }
        }

        // Numbered form: PROVIDER_API_KEY_1 .. PROVIDER_API_KEY_N
        for prefix in &descriptor.numbered_prefixes {
            for n in 1..=descriptor.max_numbered {
                let var = format!("{}{}", prefix, n);
                if let Some(value) = env.get(&var) {
                    self.accept(&mut found, &var, &value);
                }
            }
        }

        // Singular form: PROVIDER_API_KEY="k1"
        for var in &descriptor.singular_vars {
            if let Some(value) = env.get(var) {
                self.accept(&mut found, var, &value);
            }
        }

        found
    }

    fn accept(&self, found: &mut BTreeSet<String>, var: &str, raw: &str) {
        let secret = raw.trim();
        if secret.is_empty() {
            return;
        }
        if secret.chars().count() < self.min_secret_len {
            tracing::debug!(
                variable = %var,
                len = secret.chars().count(),
                min_len = self.min_secret_len,
                "Ignoring secret shorter than minimum length"
            );
            return;
        }
        found.insert(secret.to_string());
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::providers::{ProviderRegistry, WireFormat};

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn descriptor() -> ProviderDescriptor {
        ProviderDescriptor::new("groq", WireFormat::ChatCompletionsCompatible, "http://x", &["m"])
            .with_list_vars(&["GROQ_API_KEYS"])
            .with_singular_vars(&["GROQ_API_KEY"])
            .with_numbered(&["GROQ_API_KEY_"], 3)
    }

    #[test]
    fn test_merges_all_three_forms() {
        let env = env(&[
            ("GROQ_API_KEYS", "gsk_list_000001, gsk_list_000002"),
            ("GROQ_API_KEY_1", "gsk_numbered_01"),
            ("GROQ_API_KEY_3", "gsk_numbered_03"),
            ("GROQ_API_KEY", "gsk_singular_01"),
        ]);

        let secrets = CredentialLoader::new().load_provider(&descriptor(), &env);
        let expected: BTreeSet<String> = [
            "gsk_list_000001",
            "gsk_list_000002",
            "gsk_numbered_01",
            "gsk_numbered_03",
            "gsk_singular_01",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        assert_eq!(secrets, expected);
    }

    #[test]
    fn test_dedup_across_list_and_numbered() {
        let env = env(&[
            ("GROQ_API_KEYS", "gsk_same_secret_1"),
            ("GROQ_API_KEY_2", "gsk_same_secret_1"),
        ]);

        let loaded = CredentialLoader::new().load(&[descriptor()], &env);
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.count_for("groq"), 1);
    }

    #[test]
    fn test_short_secrets_discarded() {
        let env = env(&[
            ("GROQ_API_KEYS", "short, ,xxxxxxxxx,exactly10!"),
            ("GROQ_API_KEY", "changeme"),
        ]);

        let secrets = CredentialLoader::new().load_provider(&descriptor(), &env);
        assert_eq!(secrets.len(), 1);
        assert!(secrets.contains("exactly10!"));
    }

    #[test]
    fn test_custom_minimum_length() {
        let env = env(&[("GROQ_API_KEYS", "abcdef, exactly10!")]);

        let strict = CredentialLoader::new().with_min_secret_len(12);
        assert!(strict.load_provider(&descriptor(), &env).is_empty());

        let lenient = CredentialLoader::new().with_min_secret_len(6);
        assert_eq!(lenient.load_provider(&descriptor(), &env).len(), 2);
    }

    #[test]
    fn test_numbered_beyond_max_ignored() {
        let env = env(&[("GROQ_API_KEY_4", "gsk_too_far_0004")]);
        let secrets = CredentialLoader::new().load_provider(&descriptor(), &env);
        assert!(secrets.is_empty());
    }

    #[test]
    fn test_same_secret_under_two_providers_kept() {
        let other = ProviderDescriptor::new("nvidia", WireFormat::ChatCompletionsCompatible, "http://y", &["m"])
            .with_singular_vars(&["NVIDIA_API_KEY"]);
        let env = env(&[
            ("GROQ_API_KEY", "shared_secret_value"),
            ("NVIDIA_API_KEY", "shared_secret_value"),
        ]);

        let loaded = CredentialLoader::new().load(&[descriptor(), other], &env);
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.count_for("groq"), 1);
        assert_eq!(loaded.count_for("nvidia"), 1);
    }

    #[test]
    fn test_empty_environment_is_empty_not_error() {
        let registry = ProviderRegistry::builtin();
        let loaded = CredentialLoader::new().load(registry.all(), &HashMap::<String, String>::new());
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_builtin_aliases() {
        let registry = ProviderRegistry::builtin();
        let env = env(&[
            ("GOOGLE_API_KEY", "AIzaSyTestKey00001"),
            ("GLM_API_KEY_2", "glm.test.key.0002"),
            ("HUGGINGFACE_TOKEN_1", "hf_testtoken00001"),
        ]);

        let loaded = CredentialLoader::new().load(registry.all(), &env);
        assert_eq!(loaded.count_for("gemini"), 1);
        assert_eq!(loaded.count_for("zhipuai"), 1);
        assert_eq!(loaded.count_for("huggingface"), 1);
        assert_eq!(loaded.len(), 3);
    }

    #[test]
    fn test_huggingface_token_list_and_api_key() {
        let registry = ProviderRegistry::builtin();
        let env = env(&[
            ("HF_TOKEN", "hf_listtoken0001,hf_listtoken0002"),
            ("HF_API_KEY", "hf_apikey000001"),
        ]);

        let loaded = CredentialLoader::new().load(registry.all(), &env);
        assert_eq!(loaded.count_for("huggingface"), 3);
    }

    #[test]
    fn test_debug_masks_secret() {
        let cred = LoadedCredential {
            provider: "groq".to_string(),
            secret: "gsk_secret_abcd".to_string(),
        };
        assert!(!format!("{:?}", cred).contains("gsk_secret"));
    }
}
