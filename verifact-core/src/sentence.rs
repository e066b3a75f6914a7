//! Abbreviation-aware sentence splitting.
//!
//! Naive punctuation-splitting terminates sentences at abbreviation periods
//! ("Dr. Smith" becomes two fragments). The splitter substitutes a fixed
//! table of known abbreviations with placeholder tokens that carry no
//! terminal punctuation, splits on `[.!?]+` sequences, then restores the
//! abbreviations in each segment.

use regex::Regex;
use std::sync::LazyLock;

/// Placeholder for an abbreviation period during the split pass.
const DOT_TOKEN: &str = "<prd>";

/// Known abbreviations whose periods must not terminate a sentence.
const ABBREVIATIONS: &[&str] = &[
    "Mr.", "Mrs.", "Ms.", "Dr.", "Prof.", "Sr.", "Jr.", "St.", "Gen.", "Rep.", "Sen.", "Gov.",
    "U.S.", "U.K.", "U.N.", "E.U.", "D.C.", "a.m.", "p.m.", "e.g.", "i.e.", "etc.", "vs.", "Inc.",
    "Ltd.", "Corp.", "Co.", "No.", "Vol.", "Fig.", "approx.",
];

static TERMINATOR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.!?]+").unwrap());

/// Split text into sentence-like units, preserving terminal punctuation.
///
/// Segments are trimmed; empty segments are dropped.
pub fn split(text: &str) -> Vec<String> {
    let mut substituted = text.to_string();
    for abbr in ABBREVIATIONS {
        if substituted.contains(abbr) {
            substituted = substituted.replace(abbr, &abbr.replace('.', DOT_TOKEN));
        }
    }

    let mut sentences = Vec::new();
    let mut last = 0;
    for m in TERMINATOR.find_iter(&substituted) {
        push_segment(&substituted[last..m.end()], &mut sentences);
        last = m.end();
    }
    if last < substituted.len() {
        push_segment(&substituted[last..], &mut sentences);
    }
    sentences
}

fn push_segment(segment: &str, sentences: &mut Vec<String>) {
    let restored = segment.replace(DOT_TOKEN, ".");
    let trimmed = restored.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed.to_string());
    }
}
