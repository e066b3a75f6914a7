//! Human-readable rendering of verification results.

use verifact_core::{Assessment, PipelineOutput};

/// Render the pipeline output as terminal-friendly text.
pub fn render_text(output: &PipelineOutput) -> String {
    let report = &output.report;
    let mut out = String::new();

    out.push_str(&format!(
        "Verified {} claim{} — overall reliability {}%\n\n",
        output.claims.len(),
        if output.claims.len() == 1 { "" } else { "s" },
        report.overall_score
    ));

    for (i, verdict) in report.verdicts.iter().enumerate() {
        out.push_str(&format!(
            "{}. [{} {}%] {}\n   {}\n",
            i + 1,
            assessment_label(verdict.assessment),
            verdict.confidence,
            verdict.claim_text,
            verdict.summary
        ));
    }

    out.push('\n');
    let counts = &report.summary_counts;
    out.push_str(&format!(
        "true: {}  false: {}  partially true: {}  unverifiable: {}  needs context: {}  errors: {}\n",
        counts[&Assessment::True],
        counts[&Assessment::False],
        counts[&Assessment::PartiallyTrue],
        counts[&Assessment::Unverifiable],
        counts[&Assessment::NeedsContext],
        counts[&Assessment::Error],
    ));

    out
}

fn assessment_label(assessment: Assessment) -> &'static str {
    match assessment {
        Assessment::True => "TRUE",
        Assessment::False => "FALSE",
        Assessment::PartiallyTrue => "PARTLY TRUE",
        Assessment::Unverifiable => "UNVERIFIABLE",
        Assessment::NeedsContext => "NEEDS CONTEXT",
        Assessment::Error => "ERROR",
    }
}
