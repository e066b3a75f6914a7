//! Reasoning-service provider implementations.
//!
//! Provides the OpenAI-compatible implementation of `ReasoningProvider`
//! (OpenAI, Azure, Ollama, vLLM, LM Studio) plus the shared retry helper
//! used everywhere a completion crosses the network.
//!
//! Use `create_reasoner()` to instantiate a provider from configuration.

pub mod openai_compat;

use crate::config::{LlmConfig, RetryConfig};
use crate::error::LlmError;
use crate::reasoner::ReasoningProvider;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

pub use openai_compat::OpenAiCompatibleReasoner;

/// Execute an async operation with exponential backoff retry on transient
/// errors.
///
/// Retries on `LlmError::RateLimited` (respects `retry_after_secs`),
/// `LlmError::Connection`, and `LlmError::Timeout`. Permanent errors
/// (auth, parse) return immediately.
pub async fn with_retry<F, Fut, T>(config: &RetryConfig, operation: F) -> Result<T, LlmError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, LlmError>>,
{
    let mut last_err = None;
    for attempt in 0..=config.max_retries {
        match operation().await {
            Ok(val) => return Ok(val),
            Err(e) => {
                if !is_retryable(&e) || attempt == config.max_retries {
                    return Err(e);
                }

                let backoff_ms = compute_backoff(config, attempt, &e);
                tracing::warn!(
                    attempt = attempt + 1,
                    max = config.max_retries,
                    backoff_ms = backoff_ms,
                    error = %e,
                    "Retrying after transient error"
                );
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                last_err = Some(e);
            }
        }
    }
    Err(last_err.unwrap_or_else(|| LlmError::Connection {
        message: "All retry attempts exhausted".to_string(),
    }))
}

/// Check if an error is retryable (transient).
pub fn is_retryable(err: &LlmError) -> bool {
    matches!(
        err,
        LlmError::RateLimited { .. } | LlmError::Connection { .. } | LlmError::Timeout { .. }
    )
}

/// Compute backoff delay, respecting rate limit retry-after headers.
fn compute_backoff(config: &RetryConfig, attempt: u32, err: &LlmError) -> u64 {
    // For rate limiting, respect the server's retry-after if present
    if let LlmError::RateLimited { retry_after_secs } = err {
        let server_ms = retry_after_secs * 1000;
        let computed = compute_exponential_backoff(config, attempt);
        return server_ms.max(computed);
    }
    compute_exponential_backoff(config, attempt)
}

/// Pure exponential backoff with optional jitter.
fn compute_exponential_backoff(config: &RetryConfig, attempt: u32) -> u64 {
    let base = config.initial_backoff_ms as f64 * config.backoff_multiplier.powi(attempt as i32);
    let capped = base.min(config.max_backoff_ms as f64) as u64;
    if config.jitter {
        // Add up to 25% jitter
        let jitter = (capped as f64 * 0.25 * rand_simple()) as u64;
        capped + jitter
    } else {
        capped
    }
}

/// Simple deterministic pseudo-random for jitter (avoids pulling in rand crate).
fn rand_simple() -> f64 {
    use std::time::SystemTime;
    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos();
    (nanos % 1000) as f64 / 1000.0
}

/// Resolve the API key for a provider from the configured environment
/// variable. Local endpoints (Ollama, vLLM, LM Studio) need no key.
pub fn resolve_api_key(config: &LlmConfig) -> Result<String, LlmError> {
    let is_local = config
        .base_url
        .as_ref()
        .map(|u| u.contains("localhost") || u.contains("127.0.0.1"))
        .unwrap_or(false);

    std::env::var(&config.api_key_env)
        .ok()
        .or_else(|| {
            if is_local {
                tracing::debug!("No API key set for local provider; using dummy bearer token");
                Some("local".to_string())
            } else {
                None
            }
        })
        .ok_or_else(|| LlmError::AuthFailed {
            provider: format!("env var '{}' not set", config.api_key_env),
        })
}

/// Create a reasoning provider based on the configuration.
///
/// Every supported provider speaks the OpenAI chat completions wire format,
/// so this routes everything to `OpenAiCompatibleReasoner` with the
/// appropriate base URL and key.
pub fn create_reasoner(config: &LlmConfig) -> Result<Arc<dyn ReasoningProvider>, LlmError> {
    let api_key = resolve_api_key(config)?;
    Ok(Arc::new(OpenAiCompatibleReasoner::new(config, api_key)?))
}
