//! Structured-payload recovery from degraded oracle output
//!
//! Reasoning services wrap JSON in markdown fences, surround it with prose,
//! or truncate it mid-structure. Recovery runs a fixed ladder: fenced block,
//! balanced-brace scan (with closing-bracket synthesis for truncated
//! output), then single-field extraction marked as partial.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

/// Outcome of the recovery ladder.
#[derive(Debug, Clone)]
pub struct Recovered {
    pub value: Value,
    /// True when only isolated fields could be pulled out.
    pub partial: bool,
}

/// Recover a structured object from raw oracle text, if possible.
pub fn recover_structured(raw: &str) -> Option<Recovered> {
    if let Some(block) = fenced_block(raw) {
        if let Some(value) = balanced_object(block) {
            return Some(Recovered {
                value,
                partial: false,
            });
        }
    }

    if let Some(value) = balanced_object(raw) {
        return Some(Recovered {
            value,
            partial: false,
        });
    }

    partial_fields(raw).map(|value| Recovered {
        value,
        partial: true,
    })
}

/// Extract the body of the first fenced code block, tolerating a language
/// tag after the opening fence and a missing closing fence.
fn fenced_block(raw: &str) -> Option<&str> {
    let fence = "```";
    let start = raw.find(fence)?;
    let after_fence = &raw[start + fence.len()..];
    let body = after_fence.trim_start_matches(|c: char| c.is_alphanumeric() || c == '_');
    let block = match body.find(fence) {
        Some(end) => &body[..end],
        // Truncated output often loses the closing fence; take the rest.
        None => body,
    };
    if block.contains('{') {
        Some(block)
    } else {
        None
    }
}

/// Locate the outermost balanced object starting at the first `{`, tracking
/// nesting depth and string state. If the input ends before the structure
/// closes, synthesize the missing closing brackets to the correct depth.
fn balanced_object(text: &str) -> Option<Value> {
    let start = text.find('{')?;
    let body = &text[start..];

    let mut stack: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (idx, ch) in body.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => stack.push('}'),
            '[' => stack.push(']'),
            '}' | ']' => {
                stack.pop();
                if stack.is_empty() {
                    let candidate = &body[..idx + ch.len_utf8()];
                    return serde_json::from_str(candidate).ok();
                }
            }
            _ => {}
        }
    }

    // Ran off the end of the text with open structures left.
    let mut candidate = body.to_string();
    if in_string {
        candidate.push('"');
    }
    let mut completed = candidate.trim_end().trim_end_matches(',').to_string();
    while let Some(closer) = stack.pop() {
        completed.push(closer);
    }
    serde_json::from_str(&completed).ok()
}

static SHOULD_ACT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""should_?[aA]ct"\s*:\s*(true|false)"#).expect("valid regex"));
static TARGET_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""(?:target|selector|target_ref|targetRef)"\s*:\s*"([^"]*)""#)
        .expect("valid regex")
});
static ACTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""action"\s*:\s*"([^"]*)""#).expect("valid regex"));
static REASONING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""reasoning"\s*:\s*"([^"]*)""#).expect("valid regex"));
static CONFIDENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""confidence"\s*:\s*([0-9]*\.?[0-9]+)"#).expect("valid regex"));

/// Last-resort extraction of individual classification fields.
fn partial_fields(raw: &str) -> Option<Value> {
    let mut fields = Map::new();

    if let Some(caps) = SHOULD_ACT_RE.captures(raw) {
        fields.insert("should_act".into(), Value::Bool(&caps[1] == "true"));
    }
    if let Some(caps) = TARGET_RE.captures(raw) {
        fields.insert("target".into(), Value::String(caps[1].to_string()));
    }
    if let Some(caps) = ACTION_RE.captures(raw) {
        fields.insert("action".into(), Value::String(caps[1].to_string()));
    }
    if let Some(caps) = REASONING_RE.captures(raw) {
        fields.insert("reasoning".into(), Value::String(caps[1].to_string()));
    }
    if let Some(caps) = CONFIDENCE_RE.captures(raw) {
        if let Ok(number) = caps[1].parse::<f64>() {
            if let Some(value) = serde_json::Number::from_f64(number) {
                fields.insert("confidence".into(), Value::Number(value));
            }
        }
    }

    if fields.is_empty() {
        None
    } else {
        Some(Value::Object(fields))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovers_fenced_block() {
        let raw = "Here is my decision:\n```json\n{\"should_act\": true, \"target\": \"#nav\"}\n```\nDone.";
        let recovered = recover_structured(raw).expect("recovered");
        assert!(!recovered.partial);
        assert_eq!(recovered.value["target"], "#nav");
    }

    #[test]
    fn recovers_inline_object_with_prose() {
        let raw = "I think {\"confidence\": 0.7, \"nested\": {\"a\": 1}} is right";
        let recovered = recover_structured(raw).expect("recovered");
        assert!(!recovered.partial);
        assert_eq!(recovered.value["nested"]["a"], 1);
    }

    #[test]
    fn synthesizes_missing_closers_for_truncated_output() {
        let raw = "```json\n{\"rankings\": [{\"index\": 0, \"score\": 0.9}, {\"index\": 1, \"score\": 0.4";
        let recovered = recover_structured(raw).expect("recovered");
        assert!(!recovered.partial);
        let rankings = recovered.value["rankings"].as_array().unwrap();
        assert_eq!(rankings.len(), 2);
        assert_eq!(rankings[1]["index"], 1);
    }

    #[test]
    fn closes_dangling_string_before_brackets() {
        let raw = "{\"target\": \"#repo";
        let recovered = recover_structured(raw).expect("recovered");
        assert_eq!(recovered.value["target"], "#repo");
    }

    #[test]
    fn ignores_braces_inside_strings() {
        let raw = "{\"reasoning\": \"matches {brace} text\", \"confidence\": 1}";
        let recovered = recover_structured(raw).expect("recovered");
        assert_eq!(recovered.value["confidence"], 1);
    }

    #[test]
    fn falls_back_to_partial_field_extraction() {
        let raw = "broken \"should_act\": true garbage \"confidence\": 0.55 ::";
        let recovered = recover_structured(raw).expect("recovered");
        assert!(recovered.partial);
        assert_eq!(recovered.value["should_act"], true);
        assert_eq!(recovered.value["confidence"], 0.55);
    }

    #[test]
    fn gives_up_on_pure_prose() {
        assert!(recover_structured("no structure here at all").is_none());
    }
}
