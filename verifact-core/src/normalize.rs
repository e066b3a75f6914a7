//! Response normalizer for untrusted reasoning-service output.
//!
//! The reasoning service is asked for pure JSON but cannot be trusted to
//! deliver it: replies arrive wrapped in prose, fenced in markdown, or
//! prefixed with commentary. This module is the single place that tolerance
//! lives. Both the claim extractor and the claim evaluator feed raw replies
//! through here before parsing.
//!
//! `extract_array` and `extract_object` always return a string that parses
//! as JSON of the requested shape, falling back to `"[]"` / `"{}"` when
//! nothing recoverable is found.

use serde_json::Value;

/// Key that must appear in a recovered claim-extraction payload.
const ARRAY_KEY: &str = "\"claim\"";
/// Key that must appear in a recovered evaluation payload.
const OBJECT_KEY: &str = "\"assessment\"";

/// Known reply prefixes the reasoning service likes to add.
const PREAMBLES: &[&str] = &[
    "here is the json",
    "here is the array",
    "here is",
    "here's",
    "json:",
    "output:",
    "result:",
    "response:",
    "answer:",
    "sure,",
    "sure!",
    "certainly,",
];

/// Extract a JSON array from an arbitrary text blob.
///
/// Ordered strategies, first success wins: fence/preamble stripping, a
/// balanced-literal scan verified by parsing (preferring candidates that
/// mention the `claim` key), wrapping a bare claim object as a one-element
/// array, parsing the whole cleaned string, and finally `"[]"`.
///
/// Idempotent: re-running on its own output returns the same output.
pub fn extract_array(raw: &str) -> String {
    let cleaned = strip_wrappers(raw);

    // Balanced array literals, claim-bearing candidates first.
    for require_key in [true, false] {
        for candidate in balanced_candidates(&cleaned, '[', ']') {
            if require_key && !candidate.contains(ARRAY_KEY) {
                continue;
            }
            if let Ok(value @ Value::Array(_)) = serde_json::from_str::<Value>(candidate) {
                return serialize(&value);
            }
        }
    }

    // A bare claim object; the caller asked for an array, so wrap it.
    for candidate in balanced_candidates(&cleaned, '{', '}') {
        if !candidate.contains(ARRAY_KEY) {
            continue;
        }
        if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(candidate) {
            return serialize(&Value::Array(vec![value]));
        }
    }

    // The whole cleaned string may already be the payload.
    if let Ok(value @ Value::Array(_)) = serde_json::from_str::<Value>(cleaned.trim()) {
        return serialize(&value);
    }

    "[]".to_string()
}

/// Extract a JSON object containing an `assessment` key from an arbitrary
/// text blob. Same layering as [`extract_array`]; falls back to `"{}"`.
pub fn extract_object(raw: &str) -> String {
    let cleaned = strip_wrappers(raw);

    for candidate in balanced_candidates(&cleaned, '{', '}') {
        if !candidate.contains(OBJECT_KEY) {
            continue;
        }
        if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(candidate) {
            return serialize(&value);
        }
    }

    if let Ok(value) = serde_json::from_str::<Value>(cleaned.trim()) {
        if value.is_object() && value.get("assessment").is_some() {
            return serialize(&value);
        }
    }

    "{}".to_string()
}

fn serialize(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "[]".to_string())
}

/// Remove markdown code fences and known LLM preambles.
fn strip_wrappers(raw: &str) -> String {
    let defenced = raw
        .replace("```json", "")
        .replace("```JSON", "")
        .replace("```", "");
    let mut s = defenced.trim();

    // Preambles can stack ("Sure, here is the JSON: ..."), so strip until
    // none match.
    loop {
        let mut stripped = false;
        for preamble in PREAMBLES {
            if let Some(prefix) = s.get(..preamble.len()) {
                if prefix.eq_ignore_ascii_case(preamble) {
                    s = s[preamble.len()..].trim_start_matches([':', ' ', '\t', '\n', '\r']);
                    stripped = true;
                }
            }
        }
        if !stripped {
            break;
        }
    }

    s.to_string()
}

/// Every balanced `open`..`close` substring of `text`, in order of start
/// position. String literals and escapes are respected so braces inside
/// JSON strings do not unbalance the scan.
fn balanced_candidates(text: &str, open: char, close: char) -> Vec<&str> {
    let mut candidates = Vec::new();
    for (start, ch) in text.char_indices() {
        if ch != open {
            continue;
        }
        let mut depth = 0usize;
        let mut in_string = false;
        let mut escaped = false;
        for (offset, c) in text[start..].char_indices() {
            if escaped {
                escaped = false;
                continue;
            }
            match c {
                '\\' if in_string => escaped = true,
                '"' => in_string = !in_string,
                c if c == open && !in_string => depth += 1,
                c if c == close && !in_string => {
                    depth -= 1;
                    if depth == 0 {
                        candidates.push(&text[start..start + offset + c.len_utf8()]);
                        break;
                    }
                }
                _ => {}
            }
        }
    }
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_array_plain() {
        let raw = r#"[{"claim": "The earth orbits the sun.", "type": "scientific"}]"#;
        let out = extract_array(raw);
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_extract_array_fenced() {
        let raw = "```json\n[{\"claim\": \"Water boils at 100C.\"}]\n```";
        let out = extract_array(raw);
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed[0]["claim"], "Water boils at 100C.");
    }

    #[test]
    fn test_extract_array_with_preamble() {
        let raw = "Sure, here is the JSON: [{\"claim\": \"Paris is in France.\"}]";
        let out = extract_array(raw);
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed[0]["claim"], "Paris is in France.");
    }

    #[test]
    fn test_extract_array_embedded_in_prose() {
        let raw = "I found these claims for you.\n\n[{\"claim\": \"X is Y.\"}]\n\nLet me know!";
        let out = extract_array(raw);
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed[0]["claim"], "X is Y.");
    }

    #[test]
    fn test_extract_array_wraps_bare_object() {
        let raw = r#"{"claim": "Only one claim here.", "type": "general"}"#;
        let out = extract_array(raw);
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert!(parsed.is_array());
        assert_eq!(parsed[0]["claim"], "Only one claim here.");
    }

    #[test]
    fn test_extract_array_ignores_unparseable_candidate() {
        // First bracket pair is not valid JSON; the real array follows.
        let raw = "[broken [{\"claim\": \"Valid claim text.\"}] tail]";
        let out = extract_array(raw);
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed[0]["claim"], "Valid claim text.");
    }

    #[test]
    fn test_extract_array_garbage_falls_back() {
        assert_eq!(extract_array("no structure here at all"), "[]");
        assert_eq!(extract_array(""), "[]");
    }

    #[test]
    fn test_extract_array_idempotent() {
        let inputs = [
            "```json\n[{\"claim\": \"A claim sentence.\"}]\n```",
            r#"{"claim": "Wrapped object."}"#,
            "garbage",
            r#"[1, 2, 3]"#,
        ];
        for raw in inputs {
            let once = extract_array(raw);
            let twice = extract_array(&once);
            assert_eq!(once, twice, "not idempotent for input: {raw}");
        }
    }

    #[test]
    fn test_extract_object_plain() {
        let raw = r#"{"assessment": "true", "confidence": 85}"#;
        let out = extract_object(raw);
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed["assessment"], "true");
    }

    #[test]
    fn test_extract_object_fenced_with_prose() {
        let raw = "Here is my verdict:\n```json\n{\"assessment\": \"false\", \"confidence\": 90, \"summary\": \"Contradicted.\"}\n```\nHope that helps.";
        let out = extract_object(raw);
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed["assessment"], "false");
        assert_eq!(parsed["confidence"], 90);
    }

    #[test]
    fn test_extract_object_requires_assessment_key() {
        let raw = r#"{"verdict": "true"}"#;
        assert_eq!(extract_object(raw), "{}");
    }

    #[test]
    fn test_extract_object_skips_earlier_irrelevant_object() {
        let raw = r#"{"note": "thinking"} {"assessment": "unverifiable", "confidence": 20}"#;
        let out = extract_object(raw);
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed["assessment"], "unverifiable");
    }

    #[test]
    fn test_extract_object_garbage_falls_back() {
        assert_eq!(extract_object("the claim seems plausible to me"), "{}");
    }

    #[test]
    fn test_braces_inside_strings_do_not_unbalance() {
        let raw = r#"{"assessment": "true", "summary": "Uses } and { inside a string."}"#;
        let out = extract_object(raw);
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed["summary"], "Uses } and { inside a string.");
    }

    #[test]
    fn test_nested_array_recovered_whole() {
        let value = json!([
            {"claim": "First claim text.", "original_text": "span", "type": "general"},
            {"claim": "Second claim text.", "type": "historical"}
        ]);
        let raw = format!("Output: {value}");
        let out = extract_array(&raw);
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 2);
    }
}
