//! The verification pipeline.
//!
//! Orchestrates the full flow: claim extraction (cache-checked), then per
//! claim evidence retrieval and evaluation, then aggregation into the
//! final report. Per-claim verification runs sequentially with a pacing
//! delay between claims; the upstream reasoning and search services
//! enforce per-minute rate limits and serial pacing stays under them.

use crate::aggregate;
use crate::cache::VerificationCache;
use crate::config::Config;
use crate::evaluator::ClaimEvaluator;
use crate::extractor::ClaimExtractor;
use crate::reasoner::ReasoningProvider;
use crate::search::{SearchProvider, SourceRetriever};
use crate::types::PipelineOutput;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// End-to-end claim verification.
pub struct VerificationPipeline {
    extractor: ClaimExtractor,
    retriever: SourceRetriever,
    evaluator: ClaimEvaluator,
    claim_delay: Duration,
    max_sources: usize,
}

impl VerificationPipeline {
    pub fn new(
        reasoner: Arc<dyn ReasoningProvider>,
        search: Arc<dyn SearchProvider>,
        cache: Arc<dyn VerificationCache>,
        config: &Config,
    ) -> Self {
        Self {
            extractor: ClaimExtractor::new(reasoner.clone(), cache, config.llm.clone()),
            retriever: SourceRetriever::new(search),
            evaluator: ClaimEvaluator::new(reasoner, config.llm.clone()),
            claim_delay: Duration::from_millis(config.pipeline.claim_delay_ms),
            max_sources: config.search.max_results,
        }
    }

    /// Verify a passage of text.
    ///
    /// Always produces a complete output: one verdict per extracted claim,
    /// with per-claim failures converted to `Error` verdicts locally.
    /// Dropping the returned future cancels in-flight work cooperatively;
    /// no partial report is ever observable.
    pub async fn verify(&self, text: &str) -> PipelineOutput {
        let claims = self.extractor.extract(text).await;
        info!(claims = claims.len(), "Extracted claims; starting verification");

        let mut verdicts = Vec::with_capacity(claims.len());
        for (index, claim) in claims.iter().enumerate() {
            if index > 0 && !self.claim_delay.is_zero() {
                tokio::time::sleep(self.claim_delay).await;
            }

            let sources = self.retriever.retrieve(&claim.text, self.max_sources).await;
            debug!(
                claim = index + 1,
                total = claims.len(),
                sources = sources.len(),
                "Evaluating claim"
            );
            verdicts.push(self.evaluator.evaluate(claim, &sources).await);
        }

        let report = aggregate::aggregate(verdicts);
        info!(
            score = report.overall_score,
            errors = report.summary_counts[&crate::types::Assessment::Error],
            "Verification complete"
        );

        PipelineOutput { claims, report }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryCache;
    use crate::config::RetryConfig;
    use crate::error::LlmError;
    use crate::reasoner::MockReasoner;
    use crate::search::MockSearch;
    use crate::types::{Assessment, Source};

    fn test_config() -> Config {
        let mut config = Config::default();
        config.llm.retry = RetryConfig {
            max_retries: 0,
            initial_backoff_ms: 0,
            max_backoff_ms: 0,
            backoff_multiplier: 1.0,
            jitter: false,
        };
        config.pipeline.claim_delay_ms = 0;
        config
    }

    fn make_pipeline(
        reasoner: Arc<MockReasoner>,
        search: Arc<MockSearch>,
    ) -> VerificationPipeline {
        let cache = Arc::new(InMemoryCache::new(Duration::from_secs(60)));
        VerificationPipeline::new(reasoner, search, cache, &test_config())
    }

    fn source() -> Source {
        Source {
            title: "Encyclopedia".into(),
            url: "https://example.com".into(),
            snippet: "Reference material.".into(),
        }
    }

    #[tokio::test]
    async fn test_end_to_end_happy_path() {
        let reasoner = Arc::new(MockReasoner::new());
        reasoner.queue_ok(
            r#"[{"claim": "Water boils at 100C at sea level.", "type": "scientific"},
                {"claim": "Ford was founded in 1903.", "type": "historical"}]"#,
        );
        reasoner.queue_ok(r#"{"assessment": "true", "confidence": 90, "summary": "Basic physics."}"#);
        reasoner.queue_ok(r#"{"assessment": "true", "confidence": 95, "summary": "Well documented."}"#);

        let search = Arc::new(MockSearch::new());
        search.queue(Ok(vec![source()]));
        search.queue(Ok(vec![source()]));

        let output = make_pipeline(reasoner, search).verify("Some passage.").await;

        assert_eq!(output.claims.len(), 2);
        assert_eq!(output.report.verdicts.len(), 2);
        assert_eq!(output.report.overall_score, 100);
        assert_eq!(output.report.verdicts[0].claim_text, output.claims[0].text);
    }

    #[tokio::test]
    async fn test_per_claim_failure_does_not_abort() {
        let reasoner = Arc::new(MockReasoner::new());
        reasoner.queue_ok(
            r#"[{"claim": "First claim sentence here.", "type": "general"},
                {"claim": "Second claim sentence here.", "type": "general"}]"#,
        );
        reasoner.queue_ok(r#"{"assessment": "true", "confidence": 80, "summary": "ok"}"#);
        reasoner.queue_err(LlmError::Connection {
            message: "reset".into(),
        });

        let output = make_pipeline(reasoner, Arc::new(MockSearch::new()))
            .verify("Some passage.")
            .await;

        assert_eq!(output.report.verdicts.len(), 2);
        assert_eq!(output.report.verdicts[0].assessment, Assessment::True);
        assert_eq!(output.report.verdicts[1].assessment, Assessment::Error);
        // Error verdicts do not drag down the score
        assert_eq!(output.report.overall_score, 100);
    }

    #[tokio::test]
    async fn test_zero_sources_still_produces_verdict() {
        let reasoner = Arc::new(MockReasoner::new());
        reasoner.queue_ok(r#"[{"claim": "An obscure claim nobody indexed."}]"#);
        reasoner.queue_ok(
            r#"{"assessment": "unverifiable", "confidence": 20, "summary": "No sources found."}"#,
        );

        // Search errors are absorbed into an empty source list
        let search = Arc::new(MockSearch::new());
        search.queue(Err(crate::error::SearchError::Request {
            message: "offline".into(),
        }));

        let output = make_pipeline(reasoner, search).verify("Some passage.").await;

        assert_eq!(output.report.verdicts.len(), 1);
        assert_eq!(
            output.report.verdicts[0].assessment,
            Assessment::Unverifiable
        );
    }

    #[tokio::test]
    async fn test_repeat_verification_uses_cache() {
        let reasoner = Arc::new(MockReasoner::new());
        reasoner.queue_ok(r#"[{"claim": "A cached claim sentence."}]"#);
        reasoner.queue_ok(r#"{"assessment": "true", "confidence": 80, "summary": "ok"}"#);
        reasoner.queue_ok(r#"{"assessment": "true", "confidence": 80, "summary": "ok"}"#);

        let pipeline = make_pipeline(reasoner.clone(), Arc::new(MockSearch::new()));
        let first = pipeline.verify("Same passage.").await;
        let second = pipeline.verify("Same passage.").await;

        assert_eq!(first.claims, second.claims);
        // 1 extraction + 2 evaluations; the second run extracted from cache
        assert_eq!(reasoner.call_count(), 3);
    }

    #[tokio::test]
    async fn test_report_is_complete_under_total_failure() {
        // Reasoning service down for everything: extraction falls back to
        // rules, every evaluation errors
        let reasoner = Arc::new(MockReasoner::new());
        let output = make_pipeline(reasoner, Arc::new(MockSearch::new()))
            .verify("The unemployment rate fell to 3.4 percent in January.")
            .await;

        assert!(!output.claims.is_empty());
        assert_eq!(output.report.verdicts.len(), output.claims.len());
        assert!(
            output
                .report
                .verdicts
                .iter()
                .all(|v| v.assessment == Assessment::Error && v.confidence == 0)
        );
        assert_eq!(output.report.overall_score, 0);
    }
}
