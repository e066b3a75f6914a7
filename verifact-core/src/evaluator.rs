//! Claim evaluation.
//!
//! Judges one claim against its retrieved sources via the reasoning
//! service. The structured path parses a verdict object out of the reply;
//! when that fails, a keyword heuristic infers the verdict from the free
//! text. Evaluation never raises: transport failures become an `Error`
//! verdict so the report stays complete.

use crate::config::LlmConfig;
use crate::error::LlmError;
use crate::normalize;
use crate::reasoner::ReasoningProvider;
use crate::sentence;
use crate::types::{Assessment, Claim, Source, Verdict};
use regex::Regex;
use std::sync::{Arc, LazyLock};
use tracing::{debug, warn};

const SYSTEM_PROMPT: &str = "You are a meticulous fact-checker. You judge a single claim \
    against the provided sources and reply with pure JSON only.";

/// Fallback summary when the reasoning service provided none.
const DEFAULT_SUMMARY: &str = "No detailed explanation was provided.";
/// Maximum length of a summary inferred from free text.
const SUMMARY_MAX_LEN: usize = 150;

static CONFIDENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,3})\s*%\s*confiden").unwrap());

const ERROR_PHRASES: &[&str] = &[
    "an error occurred",
    "error:",
    "failed to evaluate",
    "unable to process",
    "cannot process",
];
const TRUE_PHRASES: &[&str] = &[
    "is true",
    "is accurate",
    "is correct",
    "appears to be true",
    "claim is supported",
    "claim holds",
];
const NEGATION_PHRASES: &[&str] = &["not true", "untrue", "false", "incorrect", "inaccurate"];
const FALSE_PHRASES: &[&str] = &[
    "is false",
    "is incorrect",
    "is inaccurate",
    "not true",
    "untrue",
    "is wrong",
    "is contradicted",
];
const PARTIAL_PHRASES: &[&str] = &[
    "partially true",
    "partly true",
    "partially correct",
    "half true",
];
const UNVERIFIABLE_PHRASES: &[&str] = &[
    "unverifiable",
    "cannot verify",
    "cannot be verified",
    "could not verify",
    "insufficient evidence",
    "no evidence",
];
const CONTEXT_PHRASES: &[&str] = &[
    "needs context",
    "needs more context",
    "requires context",
    "lacks context",
    "out of context",
];
const SUMMARY_MARKERS: &[&str] = &["in summary", "in conclusion", "the claim is"];

/// Judges claims against retrieved evidence.
pub struct ClaimEvaluator {
    reasoner: Arc<dyn ReasoningProvider>,
    llm: LlmConfig,
}

impl ClaimEvaluator {
    pub fn new(reasoner: Arc<dyn ReasoningProvider>, llm: LlmConfig) -> Self {
        Self { reasoner, llm }
    }

    /// Evaluate one claim. Never fails; unrecoverable problems yield an
    /// `Error` verdict.
    pub async fn evaluate(&self, claim: &Claim, sources: &[Source]) -> Verdict {
        let prompt = evaluation_prompt(claim, sources);

        match self
            .reasoner
            .complete(
                SYSTEM_PROMPT,
                &prompt,
                self.llm.max_tokens,
                self.llm.temperature,
            )
            .await
        {
            Ok(raw) => parse_verdict(claim, &raw, sources.len()),
            Err(LlmError::RateLimited { retry_after_secs }) => {
                warn!(claim = %claim.text, "Evaluation rate-limited");
                Verdict::error(
                    &claim.text,
                    format!(
                        "Verification was rate-limited by the reasoning service; retry after {retry_after_secs}s."
                    ),
                )
            }
            Err(e) => {
                warn!(claim = %claim.text, error = %e, "Evaluation failed");
                Verdict::error(&claim.text, format!("Verification failed: {e}"))
            }
        }
    }
}

/// Render sources into the numbered evidence block the prompt embeds.
fn evidence_block(sources: &[Source]) -> String {
    if sources.is_empty() {
        return "No sources were found for this claim.".to_string();
    }
    sources
        .iter()
        .enumerate()
        .map(|(i, s)| {
            format!(
                "Source {}:\nTitle: {}\nURL: {}\nSnippet: {}",
                i + 1,
                s.title,
                s.url,
                s.snippet
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn evaluation_prompt(claim: &Claim, sources: &[Source]) -> String {
    format!(
        "Judge the following claim against the sources.\n\n\
         Claim: {}\n\n\
         {}\n\n\
         Respond with ONLY a single JSON object, no prose:\n\
         {{\"assessment\": \"<one of: true, false, partially_true, unverifiable, needs_context>\", \
         \"confidence\": <0-100>, \
         \"summary\": \"<one sentence>\", \
         \"supporting_sources\": [<source numbers as listed above>]}}",
        claim.text,
        evidence_block(sources)
    )
}

/// Structured parse first, keyword inference second.
fn parse_verdict(claim: &Claim, raw: &str, source_count: usize) -> Verdict {
    let normalized = normalize::extract_object(raw);
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(&normalized) {
        let assessment = value
            .get("assessment")
            .and_then(|v| v.as_str())
            .and_then(Assessment::from_wire);
        if let Some(assessment) = assessment {
            debug!(claim = %claim.text, %assessment, "Structured verdict parsed");
            return build_structured_verdict(claim, assessment, &value, source_count);
        }
    }

    debug!(claim = %claim.text, "Structured parse failed; inferring verdict from free text");
    infer_from_text(claim, raw)
}

fn build_structured_verdict(
    claim: &Claim,
    assessment: Assessment,
    value: &serde_json::Value,
    source_count: usize,
) -> Verdict {
    let confidence = value
        .get("confidence")
        .and_then(|v| v.as_f64())
        .map(|f| f.round() as i64)
        .unwrap_or_else(|| assessment.default_confidence() as i64);

    let summary = value
        .get("summary")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_SUMMARY)
        .to_string();

    // The prompt lists sources 1-based; convert and drop anything out of
    // range rather than trusting the reasoning service.
    let supporting_sources = value
        .get("supporting_sources")
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|n| n.as_u64())
                .filter(|&n| n >= 1 && (n as usize) <= source_count)
                .map(|n| (n - 1) as usize)
                .collect()
        })
        .unwrap_or_default();

    Verdict::new(&claim.text, assessment, confidence, summary, supporting_sources)
}

/// Keyword-based verdict inference for replies that defeated the
/// normalizer. Phrase checks run in priority order; an indeterminate reply
/// defaults to `Unverifiable` rather than `Error` since an indeterminate
/// judgment is still renderable.
fn infer_from_text(claim: &Claim, raw: &str) -> Verdict {
    let lower = raw.to_lowercase();

    let assessment = if contains_any(&lower, ERROR_PHRASES) {
        Assessment::Error
    } else if contains_any(&lower, TRUE_PHRASES) && !contains_any(&lower, NEGATION_PHRASES) {
        Assessment::True
    } else if contains_any(&lower, FALSE_PHRASES) && !lower.contains("not false") {
        Assessment::False
    } else if contains_any(&lower, PARTIAL_PHRASES) {
        Assessment::PartiallyTrue
    } else if contains_any(&lower, UNVERIFIABLE_PHRASES) {
        Assessment::Unverifiable
    } else if contains_any(&lower, CONTEXT_PHRASES) {
        Assessment::NeedsContext
    } else {
        Assessment::Unverifiable
    };

    let confidence = CONFIDENCE
        .captures(&lower)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<i64>().ok())
        .unwrap_or_else(|| assessment.default_confidence() as i64);

    Verdict::new(
        &claim.text,
        assessment,
        confidence,
        infer_summary(raw),
        Vec::new(),
    )
}

fn contains_any(haystack: &str, phrases: &[&str]) -> bool {
    phrases.iter().any(|p| haystack.contains(p))
}

/// Pick the most conclusion-like sentence of the reply as the summary.
fn infer_summary(raw: &str) -> String {
    let sentences = sentence::split(raw);
    if sentences.is_empty() {
        return DEFAULT_SUMMARY.to_string();
    }

    let chosen = sentences
        .iter()
        .find(|s| {
            let lower = s.to_lowercase();
            SUMMARY_MARKERS.iter().any(|m| lower.contains(m))
        })
        .unwrap_or(&sentences[0]);

    truncate_chars(chosen, SUMMARY_MAX_LEN)
}

fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reasoner::MockReasoner;
    use crate::types::ClaimCategory;

    fn claim() -> Claim {
        Claim::new(
            "Ford was founded in 1903.",
            "",
            ClaimCategory::Historical,
        )
    }

    fn sources(n: usize) -> Vec<Source> {
        (0..n)
            .map(|i| Source {
                title: format!("Source {i}"),
                url: format!("https://example.com/{i}"),
                snippet: format!("Snippet {i}"),
            })
            .collect()
    }

    fn make_evaluator(mock: Arc<MockReasoner>) -> ClaimEvaluator {
        ClaimEvaluator::new(mock, LlmConfig::default())
    }

    #[tokio::test]
    async fn test_structured_verdict() {
        let mock = Arc::new(MockReasoner::new());
        mock.queue_ok(
            r#"{"assessment": "true", "confidence": 92, "summary": "Well documented.", "supporting_sources": [1, 2]}"#,
        );
        let evaluator = make_evaluator(mock);

        let verdict = evaluator.evaluate(&claim(), &sources(3)).await;
        assert_eq!(verdict.assessment, Assessment::True);
        assert_eq!(verdict.confidence, 92);
        assert_eq!(verdict.summary, "Well documented.");
        assert_eq!(verdict.supporting_sources, vec![0, 1]);
        assert_eq!(verdict.claim_text, "Ford was founded in 1903.");
    }

    #[tokio::test]
    async fn test_structured_verdict_clamps_and_defaults() {
        let mock = Arc::new(MockReasoner::new());
        mock.queue_ok(r#"{"assessment": "false", "confidence": 250}"#);
        let evaluator = make_evaluator(mock);

        let verdict = evaluator.evaluate(&claim(), &sources(1)).await;
        assert_eq!(verdict.assessment, Assessment::False);
        assert_eq!(verdict.confidence, 100);
        assert_eq!(verdict.summary, DEFAULT_SUMMARY);
        assert!(verdict.supporting_sources.is_empty());
    }

    #[tokio::test]
    async fn test_structured_verdict_drops_out_of_range_sources() {
        let mock = Arc::new(MockReasoner::new());
        mock.queue_ok(
            r#"{"assessment": "true", "confidence": 80, "summary": "ok", "supporting_sources": [0, 1, 7]}"#,
        );
        let evaluator = make_evaluator(mock);

        let verdict = evaluator.evaluate(&claim(), &sources(2)).await;
        // 0 is not a listed source number, 7 is out of range; only 1 survives
        assert_eq!(verdict.supporting_sources, vec![0]);
    }

    #[tokio::test]
    async fn test_fenced_structured_verdict() {
        let mock = Arc::new(MockReasoner::new());
        mock.queue_ok("```json\n{\"assessment\": \"needs_context\", \"confidence\": 55, \"summary\": \"Depends on timeframe.\"}\n```");
        let evaluator = make_evaluator(mock);

        let verdict = evaluator.evaluate(&claim(), &sources(1)).await;
        assert_eq!(verdict.assessment, Assessment::NeedsContext);
        assert_eq!(verdict.confidence, 55);
    }

    #[tokio::test]
    async fn test_illegal_assessment_falls_back_to_heuristics() {
        let mock = Arc::new(MockReasoner::new());
        // Parses as JSON but "probably" is not a legal assessment; the raw
        // text carries no decisive phrase either.
        mock.queue_ok(r#"{"assessment": "probably", "confidence": 50}"#);
        let evaluator = make_evaluator(mock);

        let verdict = evaluator.evaluate(&claim(), &sources(1)).await;
        assert_eq!(verdict.assessment, Assessment::Unverifiable);
        assert_eq!(verdict.confidence, 30);
    }

    #[tokio::test]
    async fn test_plain_text_true_inference() {
        let mock = Arc::new(MockReasoner::new());
        mock.queue_ok("I believe this claim is true based on the sources.");
        let evaluator = make_evaluator(mock);

        let verdict = evaluator.evaluate(&claim(), &sources(2)).await;
        assert_eq!(verdict.assessment, Assessment::True);
        assert_eq!(verdict.confidence, 75);
        assert!(verdict.summary.contains("claim is true"));
    }

    #[tokio::test]
    async fn test_rate_limit_becomes_error_verdict() {
        let mock = Arc::new(MockReasoner::new());
        mock.queue_err(LlmError::RateLimited {
            retry_after_secs: 30,
        });
        let evaluator = make_evaluator(mock);

        let verdict = evaluator.evaluate(&claim(), &sources(1)).await;
        assert_eq!(verdict.assessment, Assessment::Error);
        assert_eq!(verdict.confidence, 0);
        assert!(verdict.summary.contains("rate-limited"));
    }

    #[tokio::test]
    async fn test_connection_failure_becomes_error_verdict() {
        let mock = Arc::new(MockReasoner::new());
        mock.queue_err(LlmError::Connection {
            message: "refused".into(),
        });
        let evaluator = make_evaluator(mock);

        let verdict = evaluator.evaluate(&claim(), &sources(1)).await;
        assert_eq!(verdict.assessment, Assessment::Error);
        assert!(verdict.summary.contains("Verification failed"));
        assert!(!verdict.summary.contains("rate-limited"));
    }

    #[test]
    fn test_infer_false_with_negation() {
        let v = infer_from_text(&claim(), "The sources show the claim is false.");
        assert_eq!(v.assessment, Assessment::False);
        assert_eq!(v.confidence, 75);
    }

    #[test]
    fn test_infer_true_not_fooled_by_negation() {
        let v = infer_from_text(&claim(), "This is not true; the sources say otherwise.");
        assert_eq!(v.assessment, Assessment::False);
    }

    #[test]
    fn test_infer_partially_true() {
        let v = infer_from_text(&claim(), "The claim is partially true: the year is right.");
        assert_eq!(v.assessment, Assessment::PartiallyTrue);
        assert_eq!(v.confidence, 60);
    }

    #[test]
    fn test_infer_unverifiable() {
        let v = infer_from_text(&claim(), "I cannot verify this with the given sources.");
        assert_eq!(v.assessment, Assessment::Unverifiable);
        assert_eq!(v.confidence, 30);
    }

    #[test]
    fn test_infer_needs_context() {
        let v = infer_from_text(&claim(), "This statement needs more context to judge.");
        assert_eq!(v.assessment, Assessment::NeedsContext);
        assert_eq!(v.confidence, 40);
    }

    #[test]
    fn test_infer_error_phrase() {
        let v = infer_from_text(&claim(), "An error occurred while evaluating the claim.");
        assert_eq!(v.assessment, Assessment::Error);
        assert_eq!(v.confidence, 0);
    }

    #[test]
    fn test_infer_default_is_unverifiable() {
        let v = infer_from_text(&claim(), "Interesting question about automobiles.");
        assert_eq!(v.assessment, Assessment::Unverifiable);
    }

    #[test]
    fn test_infer_explicit_confidence() {
        let v = infer_from_text(
            &claim(),
            "The claim is accurate. I would say 90% confidence here.",
        );
        assert_eq!(v.assessment, Assessment::True);
        assert_eq!(v.confidence, 90);
    }

    #[test]
    fn test_infer_summary_prefers_conclusion_sentence() {
        let v = infer_from_text(
            &claim(),
            "Many sources discuss this. In conclusion, the record supports it. More detail follows.",
        );
        assert!(v.summary.starts_with("In conclusion"));
    }

    #[test]
    fn test_infer_summary_truncates() {
        let long = format!("The claim is supported. {}", "detail ".repeat(60));
        let v = infer_from_text(&claim(), &long);
        assert!(v.summary.chars().count() <= SUMMARY_MAX_LEN);
    }

    #[test]
    fn test_evidence_block_numbering() {
        let block = evidence_block(&sources(2));
        assert!(block.contains("Source 1:"));
        assert!(block.contains("Source 2:"));
        assert!(block.contains("https://example.com/1"));
    }

    #[test]
    fn test_evidence_block_empty() {
        assert!(evidence_block(&[]).contains("No sources"));
    }
}
