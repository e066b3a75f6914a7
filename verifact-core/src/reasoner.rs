//! Reasoning-service abstraction.
//!
//! Defines the `ReasoningProvider` trait for model-agnostic text completion.
//! The pipeline sends two prompt shapes through this interface — claim
//! extraction and claim evaluation — and always treats the reply as
//! untrusted free text. A scripted `MockReasoner` is provided for tests.

use crate::error::LlmError;
use async_trait::async_trait;

/// Trait for reasoning-service providers.
///
/// Implementations perform a single text completion. Structure is requested
/// in the prompt but never assumed in the reply; the callers run every
/// response through the normalizer.
#[async_trait]
pub trait ReasoningProvider: Send + Sync {
    /// Perform a completion and return the raw response text.
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        max_tokens: usize,
        temperature: f32,
    ) -> Result<String, LlmError>;

    /// Return the model name.
    fn model_name(&self) -> &str;
}

/// A scripted reasoning provider for tests.
///
/// Pops queued responses in order and records the prompts it was sent.
/// When the queue runs dry, each call returns an `ApiRequest` error so
/// tests can exercise exhausted-retry paths deliberately.
pub struct MockReasoner {
    model: String,
    responses: std::sync::Mutex<std::collections::VecDeque<Result<String, LlmError>>>,
    prompts: std::sync::Mutex<Vec<String>>,
}

impl MockReasoner {
    pub fn new() -> Self {
        Self {
            model: "mock-model".to_string(),
            responses: std::sync::Mutex::new(std::collections::VecDeque::new()),
            prompts: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Create a MockReasoner that returns the given text for every call.
    pub fn with_response(text: &str) -> Self {
        let provider = Self::new();
        for _ in 0..20 {
            provider.queue_ok(text);
        }
        provider
    }

    /// Queue a successful response for the next `complete` call.
    pub fn queue_ok(&self, text: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(text.to_string()));
    }

    /// Queue an error for the next `complete` call.
    pub fn queue_err(&self, err: LlmError) {
        self.responses.lock().unwrap().push_back(Err(err));
    }

    /// User prompts received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    /// Number of `complete` calls made so far.
    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

impl Default for MockReasoner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReasoningProvider for MockReasoner {
    async fn complete(
        &self,
        _system_prompt: &str,
        user_prompt: &str,
        _max_tokens: usize,
        _temperature: f32,
    ) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(user_prompt.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(LlmError::ApiRequest {
                    message: "mock reasoner: no queued responses".to_string(),
                })
            })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
