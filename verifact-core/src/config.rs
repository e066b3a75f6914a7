//! Configuration system for Verifact.
//!
//! Uses `figment` for layered configuration: defaults -> user config file ->
//! workspace config file -> environment. Configuration is loaded from
//! `~/.config/verifact/config.toml` and/or `.verifact/config.toml` in the
//! working directory, with `VERIFACT_`-prefixed environment variables on top
//! (nested fields separated by `__`, e.g. `VERIFACT_LLM__MODEL`).

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration for the verification pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// Configuration for the reasoning-service provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider name; anything OpenAI-compatible ("openai", "local", ...).
    pub provider: String,
    /// Model identifier (e.g. "gpt-4o-mini", "llama3.1:8b").
    pub model: String,
    /// Environment variable name containing the API key.
    pub api_key_env: String,
    /// Optional base URL override for the API endpoint.
    pub base_url: Option<String>,
    /// Maximum tokens to generate in a response.
    pub max_tokens: usize,
    /// Default temperature for generation.
    pub temperature: f32,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Retry behavior for transient failures.
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            base_url: None,
            max_tokens: 1024,
            temperature: 0.2,
            timeout_secs: 60,
            retry: RetryConfig::default(),
        }
    }
}

/// Retry behavior for transient reasoning-service failures.
///
/// Tests zero the backoff fields to run retries without real delays.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Number of retries after the initial attempt.
    pub max_retries: u32,
    /// Delay before the first retry, in milliseconds.
    pub initial_backoff_ms: u64,
    /// Upper bound on any single backoff delay, in milliseconds.
    pub max_backoff_ms: u64,
    /// Multiplier applied to the backoff after each attempt.
    pub backoff_multiplier: f64,
    /// Add up to 25% random jitter to each delay.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_backoff_ms: 1000,
            max_backoff_ms: 30_000,
            backoff_multiplier: 2.0,
            jitter: false,
        }
    }
}

/// Configuration for the evidence-retrieval service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Number of sources to retrieve per claim.
    pub max_results: usize,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: 5,
            timeout_secs: 15,
        }
    }
}

/// Pipeline pacing and caching knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Delay inserted between per-claim verifications, in milliseconds.
    /// Serial pacing keeps the pipeline under upstream per-minute limits.
    pub claim_delay_ms: u64,
    /// How long cached extraction results stay live, in seconds.
    pub cache_ttl_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            claim_delay_ms: 500,
            cache_ttl_secs: 600,
        }
    }
}

/// Load configuration with full layering: defaults, user config file,
/// workspace config file, then `VERIFACT_` environment variables.
pub fn load_config(workspace: Option<&Path>) -> Result<Config, Box<figment::Error>> {
    let mut figment = Figment::from(Serialized::defaults(Config::default()));

    if let Some(config_dir) = directories::ProjectDirs::from("dev", "verifact", "verifact") {
        let user_config = config_dir.config_dir().join("config.toml");
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    if let Some(ws) = workspace {
        let ws_config = ws.join(".verifact").join("config.toml");
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    figment = figment.merge(Env::prefixed("VERIFACT_").split("__"));

    figment.extract().map_err(Box::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.llm.provider, "openai");
        assert_eq!(config.llm.retry.max_retries, 2);
        assert_eq!(config.search.max_results, 5);
        assert_eq!(config.pipeline.claim_delay_ms, 500);
    }

    #[test]
    fn test_deserialize_empty_sections() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.pipeline.cache_ttl_secs, 600);
    }

    #[test]
    fn test_deserialize_partial_override() {
        let config: Config = toml::from_str(
            r#"
            [llm]
            provider = "local"
            model = "llama3.1:8b"
            api_key_env = "OPENAI_API_KEY"
            base_url = "http://localhost:11434/v1"
            max_tokens = 512
            temperature = 0.0
            timeout_secs = 120

            [pipeline]
            claim_delay_ms = 0
            cache_ttl_secs = 60
            "#,
        )
        .unwrap();
        assert_eq!(config.llm.provider, "local");
        assert_eq!(
            config.llm.base_url.as_deref(),
            Some("http://localhost:11434/v1")
        );
        assert_eq!(config.pipeline.claim_delay_ms, 0);
        // Untouched section keeps its defaults
        assert_eq!(config.search.max_results, 5);
    }

    #[test]
    fn test_retry_config_serde_roundtrip() {
        let retry = RetryConfig {
            max_retries: 5,
            initial_backoff_ms: 10,
            max_backoff_ms: 100,
            backoff_multiplier: 1.5,
            jitter: true,
        };
        let json = serde_json::to_string(&retry).unwrap();
        let back: RetryConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.max_retries, 5);
        assert!(back.jitter);
    }

    #[test]
    fn test_env_override_layering() {
        unsafe {
            std::env::set_var("VERIFACT_LLM__MODEL", "gpt-4o");
            std::env::set_var("VERIFACT_PIPELINE__CLAIM_DELAY_MS", "250");
        }
        let config = load_config(None).expect("config should load");
        assert_eq!(config.llm.model, "gpt-4o");
        assert_eq!(config.pipeline.claim_delay_ms, 250);
        unsafe {
            std::env::remove_var("VERIFACT_LLM__MODEL");
            std::env::remove_var("VERIFACT_PIPELINE__CLAIM_DELAY_MS");
        }
    }
}
