use std::env;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Which hosted model backs both completion and embeddings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmBackend {
    Gemini,
    OpenAI,
}

impl LlmBackend {
    pub fn name(&self) -> &'static str {
        match self {
            LlmBackend::Gemini => "gemini",
            LlmBackend::OpenAI => "openai",
        }
    }

    fn api_key_var(&self) -> &'static str {
        match self {
            LlmBackend::Gemini => "GEMINI_API_KEY",
            LlmBackend::OpenAI => "OPENAI_API_KEY",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub model: String,
    pub embedding_model: String,
    pub api_url: String,
    pub temperature: f32,
}

impl ProviderConfig {
    /// Reads `<PROVIDER>_MODEL`, `_EMBEDDING_MODEL`, `_API_URL` and
    /// `_TEMPERATURE`, falling back to per-provider defaults.
    pub fn from_lookup<F>(provider: &str, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let prefix = provider.to_uppercase();

        let model = lookup(&format!("{}_MODEL", prefix))
            .unwrap_or_else(|| match provider {
                "openai" => "gpt-4o-mini".to_string(),
                _ => "gemini-2.5-flash".to_string(),
            });

        let embedding_model = lookup(&format!("{}_EMBEDDING_MODEL", prefix))
            .unwrap_or_else(|| match provider {
                "openai" => "text-embedding-3-small".to_string(),
                _ => "text-embedding-004".to_string(),
            });

        // Base URL only; the provider appends model and method
        let api_url = lookup(&format!("{}_API_URL", prefix))
            .unwrap_or_else(|| match provider {
                "openai" => "https://api.openai.com/v1".to_string(),
                _ => "https://generativelanguage.googleapis.com/v1beta".to_string(),
            });

        let temperature = lookup(&format!("{}_TEMPERATURE", prefix))
            .and_then(|t| t.parse().ok())
            .unwrap_or(0.3);

        Self {
            model,
            embedding_model,
            api_url,
            temperature,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub backend: LlmBackend,
    pub llm_api_key: String,
    pub provider: ProviderConfig,
    pub qdrant_url: String,
    pub qdrant_api_key: String,
    pub collection: String,
    pub top_k: u64,
    pub call_timeout: Duration,
    pub request_deadline: Duration,
    pub max_concurrent_requests: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend = match lookup("LLM_PROVIDER").as_deref().map(str::trim) {
            None | Some("") | Some("gemini") => LlmBackend::Gemini,
            Some("openai") => LlmBackend::OpenAI,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "LLM_PROVIDER",
                    value: other.to_string(),
                })
            }
        };

        let qdrant_api_key = required(&lookup, "QDRANT_API_KEY")?;
        let llm_api_key = required(&lookup, backend.api_key_var())?;

        Ok(Self {
            backend,
            llm_api_key,
            provider: ProviderConfig::from_lookup(backend.name(), &lookup),
            qdrant_url: lookup("QDRANT_URL").unwrap_or_else(|| "http://localhost:6334".to_string()),
            qdrant_api_key,
            collection: lookup("QDRANT_COLLECTION").unwrap_or_else(|| "medibot".to_string()),
            top_k: parsed(&lookup, "RETRIEVAL_TOP_K", 3)?,
            call_timeout: Duration::from_secs(parsed(&lookup, "CALL_TIMEOUT_SECS", 30)?),
            request_deadline: Duration::from_secs(parsed(&lookup, "REQUEST_DEADLINE_SECS", 90)?),
            max_concurrent_requests: parsed(&lookup, "MAX_CONCURRENT_REQUESTS", 64)?,
        })
    }
}

fn required<F>(lookup: &F, key: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(key)),
    }
}

fn parsed<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + PartialOrd + Default,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => match raw.trim().parse::<T>() {
            Ok(value) if value > T::default() => Ok(value),
            _ => Err(ConfigError::Invalid { key, value: raw }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_secrets_are_set() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("QDRANT_API_KEY", "q-key"),
            ("GEMINI_API_KEY", "g-key"),
        ]))
        .unwrap();

        assert_eq!(config.backend, LlmBackend::Gemini);
        assert_eq!(config.llm_api_key, "g-key");
        assert_eq!(config.collection, "medibot");
        assert_eq!(config.top_k, 3);
        assert_eq!(config.provider.model, "gemini-2.5-flash");
        assert!((config.provider.temperature - 0.3).abs() < f32::EPSILON);
        assert_eq!(config.request_deadline, Duration::from_secs(90));
    }

    #[test]
    fn missing_vector_index_credential_is_fatal() {
        let err = AppConfig::from_lookup(lookup_from(&[("GEMINI_API_KEY", "g-key")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("QDRANT_API_KEY"));
    }

    #[test]
    fn missing_model_credential_is_fatal() {
        let err = AppConfig::from_lookup(lookup_from(&[
            ("QDRANT_API_KEY", "q-key"),
            ("LLM_PROVIDER", "openai"),
            ("GEMINI_API_KEY", "g-key"),
        ]))
        .unwrap_err();
        assert_eq!(err, ConfigError::Missing("OPENAI_API_KEY"));
    }

    #[test]
    fn blank_secret_counts_as_missing() {
        let err = AppConfig::from_lookup(lookup_from(&[
            ("QDRANT_API_KEY", "  "),
            ("GEMINI_API_KEY", "g-key"),
        ]))
        .unwrap_err();
        assert_eq!(err, ConfigError::Missing("QDRANT_API_KEY"));
    }

    #[test]
    fn unknown_provider_and_bad_numbers_are_rejected() {
        let err = AppConfig::from_lookup(lookup_from(&[
            ("QDRANT_API_KEY", "q"),
            ("GEMINI_API_KEY", "g"),
            ("LLM_PROVIDER", "llama"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "LLM_PROVIDER", .. }));

        let err = AppConfig::from_lookup(lookup_from(&[
            ("QDRANT_API_KEY", "q"),
            ("GEMINI_API_KEY", "g"),
            ("RETRIEVAL_TOP_K", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "RETRIEVAL_TOP_K", .. }));
    }

    #[test]
    fn provider_overrides_use_prefixed_keys() {
        let provider = ProviderConfig::from_lookup(
            "openai",
            lookup_from(&[("OPENAI_MODEL", "gpt-4o"), ("OPENAI_TEMPERATURE", "0.7")]),
        );
        assert_eq!(provider.model, "gpt-4o");
        assert_eq!(provider.embedding_model, "text-embedding-3-small");
        assert!((provider.temperature - 0.7).abs() < f32::EPSILON);
    }
}
