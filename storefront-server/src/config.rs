//! Environment-derived server configuration.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use storefront_rag::RagConfig;

use crate::error::ServerError;

/// File name of the bundled knowledge base.
pub const KNOWLEDGE_BASE_FILE: &str = "ecommerce_knowledge_base.txt";

/// Settings for the hosted LLM.
#[derive(Clone)]
pub struct LlmSettings {
    pub api_key: String,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub base_url: Option<String>,
}

/// Settings for the embedding API.
#[derive(Clone, Default)]
pub struct EmbeddingSettings {
    /// Passed through as-is; the provider decides whether a missing key is acceptable.
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
}

#[derive(Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub knowledge_base_path: PathBuf,
    /// Abort startup when the knowledge base cannot be loaded.
    pub require_knowledge_base: bool,
    pub rag: RagConfig,
    pub llm: LlmSettings,
    pub embedding: EmbeddingSettings,
}

// Keys stay out of logs.
impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("knowledge_base_path", &self.knowledge_base_path)
            .field("require_knowledge_base", &self.require_knowledge_base)
            .field("rag", &self.rag)
            .field("llm_model", &self.llm.model)
            .field("embedding_model", &self.embedding.model)
            .finish_non_exhaustive()
    }
}

impl ServerConfig {
    /// Configuration with the given LLM key and defaults everywhere else.
    pub fn new(llm_api_key: impl Into<String>) -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            knowledge_base_path: default_knowledge_base_path(),
            require_knowledge_base: false,
            rag: RagConfig::default(),
            llm: LlmSettings {
                api_key: llm_api_key.into(),
                model: None,
                max_tokens: None,
                base_url: None,
            },
            embedding: EmbeddingSettings::default(),
        }
    }

    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ServerError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through `lookup`, which returns a variable's value if set.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::MissingVar`] when no LLM key is set and
    /// [`ServerError::InvalidVar`] when a numeric or boolean value does not parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ServerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let llm_api_key = var("LLM_API_KEY")
            .or_else(|| var("TOGETHER_API_KEY"))
            .ok_or(ServerError::MissingVar("LLM_API_KEY"))?;

        let mut config = Self::new(llm_api_key);

        if let Some(host) = var("HOST") {
            config.host = host;
        }
        if let Some(port) = parse_var(&var, "PORT")? {
            config.port = port;
        }
        if let Some(path) = var("KNOWLEDGE_BASE_PATH") {
            config.knowledge_base_path = PathBuf::from(path);
        }
        if let Some(required) = var("REQUIRE_KNOWLEDGE_BASE") {
            config.require_knowledge_base = parse_bool("REQUIRE_KNOWLEDGE_BASE", &required)?;
        }

        config.llm.model = var("LLM_MODEL");
        config.llm.max_tokens = parse_var(&var, "LLM_MAX_TOKENS")?;
        config.llm.base_url = var("LLM_BASE_URL");

        config.embedding = EmbeddingSettings {
            api_key: var("EMBEDDING_API_KEY").or_else(|| var("OPENAI_API_KEY")),
            model: var("EMBEDDING_MODEL"),
            base_url: var("EMBEDDING_BASE_URL"),
        };

        Ok(config)
    }

    /// The `host:port` string to bind.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// The knowledge base shipped next to this crate's manifest.
pub fn default_knowledge_base_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join(KNOWLEDGE_BASE_FILE)
}

fn parse_var<T, F>(var: &F, name: &'static str) -> Result<Option<T>, ServerError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    var(name)
        .map(|value| {
            value.trim().parse::<T>().map_err(|e| ServerError::InvalidVar {
                name,
                value: value.clone(),
                reason: e.to_string(),
            })
        })
        .transpose()
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, ServerError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ServerError::InvalidVar {
            name,
            value: value.to_string(),
            reason: "expected true or false".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> Result<ServerConfig, ServerError> {
        let vars: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        ServerConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn missing_llm_key_is_fatal() {
        let err = config_from(&[("EMBEDDING_API_KEY", "sk")]).unwrap_err();
        assert!(matches!(err, ServerError::MissingVar("LLM_API_KEY")));

        let err = config_from(&[("LLM_API_KEY", "  ")]).unwrap_err();
        assert!(matches!(err, ServerError::MissingVar(_)));
    }

    #[test]
    fn defaults() {
        let config = config_from(&[("LLM_API_KEY", "tg")]).unwrap();
        assert_eq!(config.bind_address(), "127.0.0.1:8000");
        assert_eq!(config.llm.api_key, "tg");
        assert!(config.embedding.api_key.is_none());
        assert!(!config.require_knowledge_base);
        assert!(config.knowledge_base_path.ends_with(KNOWLEDGE_BASE_FILE));
        assert_eq!(config.rag, RagConfig::default());
    }

    #[test]
    fn bundled_knowledge_base_describes_team_store() {
        let text = std::fs::read_to_string(default_knowledge_base_path()).unwrap();
        assert!(text.contains("Rusholme Rendunks"));
        assert!(text.contains("jerseys"));
    }

    #[test]
    fn legacy_key_names_are_accepted() {
        let config =
            config_from(&[("TOGETHER_API_KEY", "tg"), ("OPENAI_API_KEY", "sk")]).unwrap();
        assert_eq!(config.llm.api_key, "tg");
        assert_eq!(config.embedding.api_key.as_deref(), Some("sk"));
    }

    #[test]
    fn overrides_are_parsed() {
        let config = config_from(&[
            ("LLM_API_KEY", "tg"),
            ("HOST", "0.0.0.0"),
            ("PORT", "9000"),
            ("KNOWLEDGE_BASE_PATH", "/srv/kb.txt"),
            ("REQUIRE_KNOWLEDGE_BASE", "yes"),
            ("LLM_MODEL", "meta-llama/Llama-3-8b"),
            ("LLM_MAX_TOKENS", "256"),
            ("EMBEDDING_MODEL", "text-embedding-3-large"),
        ])
        .unwrap();
        assert_eq!(config.bind_address(), "0.0.0.0:9000");
        assert_eq!(config.knowledge_base_path, PathBuf::from("/srv/kb.txt"));
        assert!(config.require_knowledge_base);
        assert_eq!(config.llm.model.as_deref(), Some("meta-llama/Llama-3-8b"));
        assert_eq!(config.llm.max_tokens, Some(256));
        assert_eq!(config.embedding.model.as_deref(), Some("text-embedding-3-large"));
    }

    #[test]
    fn invalid_numbers_and_flags_are_rejected() {
        let err = config_from(&[("LLM_API_KEY", "tg"), ("PORT", "eighty")]).unwrap_err();
        assert!(matches!(err, ServerError::InvalidVar { name: "PORT", .. }));

        let err =
            config_from(&[("LLM_API_KEY", "tg"), ("REQUIRE_KNOWLEDGE_BASE", "maybe")]).unwrap_err();
        assert!(matches!(err, ServerError::InvalidVar { name: "REQUIRE_KNOWLEDGE_BASE", .. }));
    }

    #[test]
    fn debug_output_hides_keys() {
        let config = config_from(&[("LLM_API_KEY", "secret-key")]).unwrap();
        assert!(!format!("{config:?}").contains("secret-key"));
    }
}
