//! Passage analysis operations.
//!
//! Explanation and summarization of a selected passage, built on the same
//! reasoning-service interface as verification. Unlike verification these
//! propagate errors: there is no meaningful degraded output for prose.

use crate::config::LlmConfig;
use crate::error::LlmError;
use crate::providers::with_retry;
use crate::reasoner::ReasoningProvider;
use std::sync::Arc;

const SYSTEM_PROMPT: &str =
    "You are a helpful assistant that explains and summarizes text clearly and concisely.";

/// Produces explanations and summaries of a passage.
pub struct Analyst {
    reasoner: Arc<dyn ReasoningProvider>,
    llm: LlmConfig,
}

impl Analyst {
    pub fn new(reasoner: Arc<dyn ReasoningProvider>, llm: LlmConfig) -> Self {
        Self { reasoner, llm }
    }

    /// Explain the passage in plain language.
    pub async fn explain(&self, text: &str) -> Result<String, LlmError> {
        let prompt = format!(
            "Explain the following passage in plain language, covering any \
             terms or references a general reader might not know:\n\n{text}"
        );
        self.complete(&prompt).await
    }

    /// Summarize the passage in a few sentences.
    pub async fn summarize(&self, text: &str) -> Result<String, LlmError> {
        let prompt =
            format!("Summarize the following passage in at most three sentences:\n\n{text}");
        self.complete(&prompt).await
    }

    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        with_retry(&self.llm.retry, || {
            self.reasoner.complete(
                SYSTEM_PROMPT,
                prompt,
                self.llm.max_tokens,
                self.llm.temperature,
            )
        })
        .await
    }
}
