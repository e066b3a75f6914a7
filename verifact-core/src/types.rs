//! Fundamental types for the verification pipeline.
//!
//! Claims, sources, verdicts, and the final verification report. All types
//! serialize with `serde` so callers can render or persist them directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Category of a factual claim, used to steer evidence retrieval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimCategory {
    /// Contains figures, percentages, or quantified comparisons.
    Statistical,
    /// References dated events, years, or named periods.
    Historical,
    /// References studies, research findings, or scientific results.
    Scientific,
    /// References software, AI, algorithms, or technical systems.
    Technological,
    /// Anything else.
    General,
}

impl ClaimCategory {
    /// Parse the wire name used in extraction prompts. Unknown values map
    /// to `General` since the reasoning service is untrusted.
    pub fn from_wire(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "statistical" => Self::Statistical,
            "historical" => Self::Historical,
            "scientific" => Self::Scientific,
            "technological" => Self::Technological,
            _ => Self::General,
        }
    }
}

impl std::fmt::Display for ClaimCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Statistical => "statistical",
            Self::Historical => "historical",
            Self::Scientific => "scientific",
            Self::Technological => "technological",
            Self::General => "general",
        };
        write!(f, "{s}")
    }
}

/// A single, independently verifiable factual assertion extracted from
/// input text. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    /// The verifiable assertion. Always longer than 10 characters and ends
    /// in terminal punctuation.
    pub text: String,
    /// The original text the claim was derived from.
    pub source_span: String,
    /// Claim category.
    pub category: ClaimCategory,
}

impl Claim {
    /// Create a claim. An empty `source_span` defaults to the claim text.
    pub fn new(text: impl Into<String>, source_span: impl Into<String>, category: ClaimCategory) -> Self {
        let text = text.into();
        let source_span = source_span.into();
        let source_span = if source_span.trim().is_empty() {
            text.clone()
        } else {
            source_span
        };
        Self {
            text,
            source_span,
            category,
        }
    }
}

/// A candidate evidence document returned by the search backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// Truth assessment for a single claim. A closed set: the evaluator never
/// emits an arbitrary string here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Assessment {
    True,
    False,
    PartiallyTrue,
    Unverifiable,
    NeedsContext,
    Error,
}

impl Assessment {
    /// All assessment kinds, in report order.
    pub const ALL: [Assessment; 6] = [
        Assessment::True,
        Assessment::False,
        Assessment::PartiallyTrue,
        Assessment::Unverifiable,
        Assessment::NeedsContext,
        Assessment::Error,
    ];

    /// Parse the wire name used in evaluation prompts.
    pub fn from_wire(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "true" => Some(Self::True),
            "false" => Some(Self::False),
            "partially_true" => Some(Self::PartiallyTrue),
            "unverifiable" => Some(Self::Unverifiable),
            "needs_context" => Some(Self::NeedsContext),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    /// Default confidence used when the reasoning service does not state
    /// one explicitly.
    pub fn default_confidence(self) -> u8 {
        match self {
            Self::True | Self::False => 75,
            Self::PartiallyTrue => 60,
            Self::NeedsContext => 40,
            Self::Unverifiable => 30,
            Self::Error => 0,
        }
    }
}

impl std::fmt::Display for Assessment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::True => "true",
            Self::False => "false",
            Self::PartiallyTrue => "partially_true",
            Self::Unverifiable => "unverifiable",
            Self::NeedsContext => "needs_context",
            Self::Error => "error",
        };
        write!(f, "{s}")
    }
}

/// The structured judgment produced for one claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    /// The claim text this verdict applies to.
    pub claim_text: String,
    pub assessment: Assessment,
    /// Confidence in the assessment, 0-100.
    pub confidence: u8,
    /// One-sentence rationale.
    pub summary: String,
    /// Indexes into the source list the claim was judged against.
    pub supporting_sources: Vec<usize>,
}

impl Verdict {
    /// Create a verdict, clamping confidence to [0, 100].
    pub fn new(
        claim_text: impl Into<String>,
        assessment: Assessment,
        confidence: i64,
        summary: impl Into<String>,
        supporting_sources: Vec<usize>,
    ) -> Self {
        Self {
            claim_text: claim_text.into(),
            assessment,
            confidence: confidence.clamp(0, 100) as u8,
            summary: summary.into(),
            supporting_sources,
        }
    }

    /// Build the verdict used when verification of a claim failed outright.
    pub fn error(claim_text: impl Into<String>, summary: impl Into<String>) -> Self {
        Self::new(claim_text, Assessment::Error, 0, summary, Vec::new())
    }
}

/// The aggregate result of verifying every claim in a passage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationReport {
    pub id: Uuid,
    /// One verdict per claim, in claim extraction order.
    pub verdicts: Vec<Verdict>,
    /// Count per assessment kind. All six kinds are always present.
    pub summary_counts: BTreeMap<Assessment, usize>,
    /// Evidence-weighted reliability score, 0-100.
    pub overall_score: u8,
    pub generated_at: DateTime<Utc>,
}

/// Everything the pipeline hands back to the caller: the ordered claim
/// list and the completed report, suitable for direct rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineOutput {
    pub claims: Vec<Claim>,
    pub report: VerificationReport,
}
