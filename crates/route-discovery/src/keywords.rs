//! Keyword extraction and the deterministic relevance scorer
//!
//! The single scoring unit every heuristic path goes through: a pure
//! function from `(keywords, candidate)` to a score, with the constants
//! exposed as configurable defaults.

use changescout_core_types::{tokenize, ChangeContext};
use serde::{Deserialize, Serialize};

/// Scoring constants. Empirically chosen defaults; override via
/// configuration rather than editing call sites.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Base added to any candidate with at least one keyword match.
    pub base: f64,
    /// Weight of the match ratio on top of the base.
    pub span: f64,
    /// Score assigned to candidates with no keyword match at all.
    pub floor: f64,
    /// Candidates at or below this score are dropped from rankings.
    pub cutoff: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            base: 0.2,
            span: 0.8,
            floor: 0.1,
            cutoff: 0.3,
        }
    }
}

/// Extract the deduplicated keyword set of a change context: title words,
/// changed-file path segments and component name words.
pub fn extract_keywords(change: &ChangeContext) -> Vec<String> {
    let mut keywords: Vec<String> = Vec::new();

    let mut push_all = |tokens: Vec<String>| {
        for token in tokens {
            if !keywords.contains(&token) {
                keywords.push(token);
            }
        }
    };

    push_all(tokenize(&change.title));
    for file in &change.files {
        push_all(tokenize(&file.filename));
    }
    for component in &change.components {
        push_all(tokenize(&component.name));
    }

    keywords
}

/// Score a candidate against a keyword set.
///
/// `match_count > 0` maps the match ratio into `[base, base + span]`;
/// unmatched candidates get the floor score so an empty result set is
/// distinguishable from "nothing scored".
pub fn relevance_score(keywords: &[String], candidate: &str, config: &ScoringConfig) -> f64 {
    if keywords.is_empty() {
        return config.floor;
    }
    let candidate = candidate.to_lowercase();
    let match_count = keywords
        .iter()
        .filter(|keyword| candidate.contains(keyword.as_str()))
        .count();
    if match_count == 0 {
        return config.floor;
    }
    (match_count as f64 / keywords.len() as f64) * config.span + config.base
}

#[cfg(test)]
mod tests {
    use super::*;
    use changescout_core_types::{ChangedFile, ComponentRef, FileStatus};

    fn change() -> ChangeContext {
        ChangeContext::new("Refactor billing invoice view", "refactor/billing")
            .with_file(ChangedFile::new(
                "src/billing/InvoiceView.tsx",
                FileStatus::Modified,
                120,
            ))
            .with_component(ComponentRef::new("InvoiceView", "src/billing/InvoiceView.tsx"))
    }

    #[test]
    fn keywords_are_deduplicated() {
        let keywords = extract_keywords(&change());
        assert!(keywords.contains(&"invoice".to_string()));
        assert!(keywords.contains(&"billing".to_string()));
        let invoice_count = keywords.iter().filter(|k| *k == "invoice").count();
        assert_eq!(invoice_count, 1);
    }

    #[test]
    fn unmatched_candidates_score_the_floor() {
        let keywords = extract_keywords(&change());
        let config = ScoringConfig::default();
        assert_eq!(relevance_score(&keywords, "Settings", &config), 0.1);
        assert_eq!(relevance_score(&keywords, "Dashboard", &config), 0.1);
    }

    #[test]
    fn matched_candidates_scale_with_ratio() {
        let keywords = vec!["invoice".to_string(), "billing".to_string()];
        let config = ScoringConfig::default();
        let one_match = relevance_score(&keywords, "Invoice list", &config);
        let two_matches = relevance_score(&keywords, "Billing invoice page", &config);
        assert!((one_match - 0.6).abs() < 1e-9);
        assert!((two_matches - 1.0).abs() < 1e-9);
    }

    #[test]
    fn scoring_is_deterministic() {
        let keywords = extract_keywords(&change());
        let config = ScoringConfig::default();
        let first = relevance_score(&keywords, "Invoice overview", &config);
        for _ in 0..10 {
            assert_eq!(relevance_score(&keywords, "Invoice overview", &config), first);
        }
    }
}
