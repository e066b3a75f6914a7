//! Verdict aggregation.
//!
//! Folds the per-claim verdicts into a `VerificationReport`: counts per
//! assessment kind plus a single evidence-weighted reliability score.
//! `Error` verdicts are excluded from the score's denominator — the score
//! reflects evidentiary support, not infrastructure flakiness.

use crate::types::{Assessment, VerificationReport, Verdict};
use chrono::Utc;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Weight an assessment contributes to the overall score.
fn weight(assessment: Assessment) -> Option<f64> {
    match assessment {
        Assessment::True => Some(1.0),
        Assessment::PartiallyTrue => Some(0.5),
        Assessment::NeedsContext => Some(0.5),
        Assessment::Unverifiable => Some(0.3),
        Assessment::False => Some(0.0),
        Assessment::Error => None,
    }
}

/// Build the final report from a completed verdict list.
///
/// Verdict order is preserved (claim extraction order). All six summary
/// counts are always present, zero included.
pub fn aggregate(verdicts: Vec<Verdict>) -> VerificationReport {
    let mut summary_counts: BTreeMap<Assessment, usize> =
        Assessment::ALL.iter().map(|a| (*a, 0)).collect();
    for verdict in &verdicts {
        *summary_counts.entry(verdict.assessment).or_insert(0) += 1;
    }

    let overall_score = compute_score(&summary_counts);

    VerificationReport {
        id: Uuid::new_v4(),
        verdicts,
        summary_counts,
        overall_score,
        generated_at: Utc::now(),
    }
}

fn compute_score(counts: &BTreeMap<Assessment, usize>) -> u8 {
    let mut weighted = 0.0;
    let mut denominator = 0usize;
    for (assessment, count) in counts {
        if let Some(w) = weight(*assessment) {
            weighted += w * *count as f64;
            denominator += count;
        }
    }
    if denominator == 0 {
        return 0;
    }
    (100.0 * weighted / denominator as f64).round() as u8
}
