//! Claim extraction.
//!
//! Turns free-form text into discrete, verifiable claims. The primary path
//! asks the reasoning service for a JSON array and survives its habit of
//! returning prose; the fallback path is a deterministic rule-based
//! extractor over sentence splits. Extraction never fails: the worst case
//! is a single synthetic claim built from the head of the input.

use crate::cache::{VerificationCache, cache_key};
use crate::config::LlmConfig;
use crate::normalize;
use crate::reasoner::ReasoningProvider;
use crate::sentence;
use crate::types::{Claim, ClaimCategory};
use regex::Regex;
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use tracing::{debug, warn};

const SYSTEM_PROMPT: &str = "You are a fact-checking assistant. You extract discrete, \
    independently verifiable factual claims from text and reply with pure JSON only.";

/// Minimum character length for a claim accepted from the reasoning service.
const MIN_CLAIM_LEN: usize = 10;
/// Minimum sentence length for the rule-based extractor.
const FALLBACK_MIN_LEN: usize = 20;
/// Looser minimum used when the first fallback pass keeps nothing.
const FALLBACK_LOOSE_MIN_LEN: usize = 10;
/// Length of the synthetic last-resort claim.
const SYNTHETIC_CLAIM_LEN: usize = 200;

static PERCENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?\s*(?:%|percent)").unwrap());
static YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(?:1[5-9]\d{2}|20\d{2})\b").unwrap());

// "may" is omitted: indistinguishable from the modal verb.
const MONTHS: &[&str] = &[
    "january",
    "february",
    "march",
    "april",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];
const SCIENTIFIC_KEYWORDS: &[&str] = &["study", "studies", "research", "researchers", "data", "survey", "experiment"];
const TECH_KEYWORDS: &[&str] = &["ai", "software", "algorithm", "computer", "technology", "internet", "robot"];

/// Extracts verifiable claims from input text, memoizing by content hash.
pub struct ClaimExtractor {
    reasoner: Arc<dyn ReasoningProvider>,
    cache: Arc<dyn VerificationCache>,
    llm: LlmConfig,
}

impl ClaimExtractor {
    pub fn new(
        reasoner: Arc<dyn ReasoningProvider>,
        cache: Arc<dyn VerificationCache>,
        llm: LlmConfig,
    ) -> Self {
        Self {
            reasoner,
            cache,
            llm,
        }
    }

    /// Extract claims from `text`. Never fails; always returns at least
    /// one claim for non-empty input.
    pub async fn extract(&self, text: &str) -> Vec<Claim> {
        let key = cache_key(text);
        if let Some(claims) = self.cache.get(&key) {
            debug!(claims = claims.len(), "Extraction cache hit");
            return claims;
        }

        let claims = match self.extract_via_reasoner(text).await {
            Some(claims) => claims,
            None => {
                warn!("Reasoning-service extraction exhausted; using rule-based fallback");
                self.extract_rule_based(text)
            }
        };

        // Cache even fallback results so problematic input does not trigger
        // repeated reasoning-service attempts.
        self.cache.set(&key, claims.clone());
        claims
    }

    /// Primary path: ask the reasoning service, bounded attempts with a
    /// fixed inter-attempt delay. Returns `None` when no attempt produced
    /// a non-empty valid claim list.
    async fn extract_via_reasoner(&self, text: &str) -> Option<Vec<Claim>> {
        let attempts = self.llm.retry.max_retries + 1;
        let delay = Duration::from_millis(self.llm.retry.initial_backoff_ms);
        let prompt = extraction_prompt(text);

        for attempt in 0..attempts {
            if attempt > 0 {
                tokio::time::sleep(delay).await;
            }
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
                Ok(raw) => {
                    let claims = parse_claim_array(&raw);
                    if !claims.is_empty() {
                        debug!(
                            attempt = attempt + 1,
                            claims = claims.len(),
                            "Extraction succeeded"
                        );
                        return Some(claims);
                    }
                    debug!(attempt = attempt + 1, "Extraction attempt yielded no valid claims");
                }
                Err(e) => {
                    warn!(attempt = attempt + 1, error = %e, "Extraction attempt failed");
                }
            }
        }
        None
    }

    /// Deterministic fallback: sentence split plus keyword classification.
    fn extract_rule_based(&self, text: &str) -> Vec<Claim> {
        let sentences = sentence::split(text);

        let mut claims = rule_based_pass(&sentences, FALLBACK_MIN_LEN);
        if claims.is_empty() {
            claims = rule_based_pass(&sentences, FALLBACK_LOOSE_MIN_LEN);
        }
        if claims.is_empty() {
            claims.push(synthetic_claim(text));
        }
        claims
    }
}

fn extraction_prompt(text: &str) -> String {
    format!(
        "Extract every independently verifiable factual claim from the text below.\n\
         Respond with ONLY a JSON array, no prose, of objects shaped as:\n\
         {{\"claim\": \"<the assertion as a full sentence>\", \
         \"original_text\": \"<the passage it came from>\", \
         \"type\": \"<one of: statistical, historical, scientific, technological, general>\"}}\n\n\
         Text:\n{text}"
    )
}

/// Normalize, parse, and validate a reasoning-service reply into claims.
///
/// Entries missing a non-empty `claim` field, or whose trimmed claim is 10
/// characters or shorter, are dropped.
fn parse_claim_array(raw: &str) -> Vec<Claim> {
    let normalized = normalize::extract_array(raw);
    let Ok(serde_json::Value::Array(entries)) = serde_json::from_str(&normalized) else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| {
            let claim_text = entry.get("claim")?.as_str()?.trim();
            if claim_text.len() <= MIN_CLAIM_LEN {
                return None;
            }
            let span = entry
                .get("original_text")
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .trim();
            let category = entry
                .get("type")
                .and_then(|v| v.as_str())
                .map(ClaimCategory::from_wire)
                .unwrap_or(ClaimCategory::General);
            Some(Claim::new(
                ensure_terminal_punctuation(claim_text),
                span,
                category,
            ))
        })
        .collect()
}

fn rule_based_pass(sentences: &[String], min_len: usize) -> Vec<Claim> {
    sentences
        .iter()
        .filter(|s| s.len() > min_len && s.chars().any(|c| c.is_alphanumeric()))
        .map(|s| {
            let text = ensure_terminal_punctuation(s);
            let category = classify_sentence(s);
            Claim::new(text, s.clone(), category)
        })
        .collect()
}

/// Last resort: one claim from the head of the raw input.
fn synthetic_claim(text: &str) -> Claim {
    let head: String = text.chars().take(SYNTHETIC_CLAIM_LEN).collect();
    Claim::new(
        ensure_terminal_punctuation(head.trim()),
        text.trim(),
        ClaimCategory::General,
    )
}

/// Classify a sentence into a claim category by keyword rules.
///
/// Percentages win over years so "50% of jobs by 2030" reads as
/// statistical; bare numbers are the lowest-priority statistical signal so
/// dated sentences still classify as historical.
fn classify_sentence(sentence: &str) -> ClaimCategory {
    let lower = sentence.to_lowercase();

    if PERCENT.is_match(&lower) {
        return ClaimCategory::Statistical;
    }
    if YEAR.is_match(&lower) || MONTHS.iter().any(|m| contains_word(&lower, m)) {
        return ClaimCategory::Historical;
    }
    if SCIENTIFIC_KEYWORDS.iter().any(|k| contains_word(&lower, k)) {
        return ClaimCategory::Scientific;
    }
    if TECH_KEYWORDS.iter().any(|k| contains_word(&lower, k)) {
        return ClaimCategory::Technological;
    }
    if sentence.chars().any(|c| c.is_ascii_digit()) {
        return ClaimCategory::Statistical;
    }
    ClaimCategory::General
}

/// Whole-word containment, so "ai" does not match "said".
fn contains_word(haystack: &str, word: &str) -> bool {
    haystack
        .split(|c: char| !c.is_alphanumeric())
        .any(|token| token == word)
}

fn ensure_terminal_punctuation(text: &str) -> String {
    let trimmed = text.trim_end();
    if trimmed.ends_with(['.', '!', '?']) {
        trimmed.to_string()
    } else {
        format!("{trimmed}.")
    }
}
