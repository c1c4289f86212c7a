//! Candidate ranking engine

use std::cmp::Ordering;
use std::sync::Arc;

use context_store::{ComponentAssociation, ContextStore, DiscoveredRoute, DiscoveryMethod};
use changescout_core_types::tokenize;
use oracle_gateway::prompt::build_ranking_prompt;
use oracle_gateway::{DecisionOracle, QueryOptions};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::keywords::{extract_keywords, relevance_score, ScoringConfig};

/// Only this many top-ranked candidates are expanded into deep exploration
/// per session; the rest are still recorded for future reuse.
pub const MAX_EXPLORATION_ROUTES: usize = 3;

/// Candidate navigation target collected from the current page or from
/// previously discovered routes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteCandidate {
    pub name: String,
    pub url: String,
}

impl RouteCandidate {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }

    fn describe(&self) -> String {
        format!("{} ({})", self.name, self.url)
    }
}

/// Candidate with its relevance estimate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedRoute {
    pub name: String,
    pub url: String,
    pub score: f64,
    pub method: DiscoveryMethod,
    pub reason: Option<String>,
}

/// Shape of the oracle's ranking payload.
#[derive(Debug, Deserialize)]
struct RankingPayload {
    #[serde(default)]
    rankings: Vec<RankingEntry>,
}

#[derive(Debug, Deserialize)]
struct RankingEntry {
    index: usize,
    #[serde(default)]
    score: f64,
    #[serde(default)]
    reason: Option<String>,
}

/// Ranks candidate routes against the session's change context.
pub struct RouteDiscovery {
    oracle: Arc<dyn DecisionOracle>,
    store: Arc<ContextStore>,
    scoring: ScoringConfig,
}

impl RouteDiscovery {
    pub fn new(
        oracle: Arc<dyn DecisionOracle>,
        store: Arc<ContextStore>,
        scoring: ScoringConfig,
    ) -> Self {
        Self {
            oracle,
            store,
            scoring,
        }
    }

    /// Produce a ranked, deduplicated list of candidates. The oracle path is
    /// tried first; any failure or unusable answer falls back to the
    /// deterministic keyword scorer.
    pub async fn rank_candidates(&self, candidates: &[RouteCandidate]) -> Vec<RankedRoute> {
        let candidates = dedup_candidates(candidates);
        if candidates.is_empty() {
            return Vec::new();
        }
        let Some(change) = self.store.change_context() else {
            warn!("no change context set; ranking falls back to keyword floor");
            return self.fallback_rank(&candidates);
        };

        if self.oracle.is_available().await {
            let descriptions: Vec<String> = candidates.iter().map(|c| c.describe()).collect();
            let prompt = build_ranking_prompt(&change, &descriptions);
            match self.oracle.query(&prompt, &QueryOptions::default()).await {
                Ok(response) if response.success => {
                    if let Some(ranked) = map_oracle_ranking(&candidates, response.data.as_ref()) {
                        info!(count = ranked.len(), "oracle ranked candidates");
                        return ranked;
                    }
                    debug!("oracle response carried no usable ranking");
                }
                Ok(response) => {
                    debug!(error = ?response.error, "oracle ranking unsuccessful");
                }
                Err(err) => {
                    warn!(error = %err, "oracle ranking failed; using keyword fallback");
                }
            }
        }

        self.fallback_rank(&candidates)
    }

    /// Deterministic keyword-overlap ranking. Reproducible for a fixed
    /// change context and candidate list.
    fn fallback_rank(&self, candidates: &[RouteCandidate]) -> Vec<RankedRoute> {
        let keywords = self
            .store
            .change_context()
            .map(|change| extract_keywords(&change))
            .unwrap_or_default();

        let mut ranked: Vec<RankedRoute> = candidates
            .iter()
            .map(|candidate| {
                let score = relevance_score(&keywords, &candidate.describe(), &self.scoring);
                RankedRoute {
                    name: candidate.name.clone(),
                    url: candidate.url.clone(),
                    score,
                    method: DiscoveryMethod::Keyword,
                    reason: None,
                }
            })
            .filter(|ranked| ranked.score > self.scoring.cutoff)
            .collect();
        sort_by_score(&mut ranked);
        ranked
    }

    /// Record every ranked route into the store and return the top slice
    /// selected for deep exploration.
    pub fn select_for_exploration(&self, ranked: &[RankedRoute], max: usize) -> Vec<RankedRoute> {
        let components = self
            .store
            .change_context()
            .map(|change| change.components)
            .unwrap_or_default();

        for route in ranked {
            let mut discovered =
                DiscoveredRoute::new(route.name.clone(), route.url.clone(), route.method);
            for component in &components {
                let tokens = tokenize(&component.name);
                let haystack = format!("{} {}", route.name, route.url);
                let score = relevance_score(&tokens, &haystack, &self.scoring);
                if score > self.scoring.cutoff {
                    discovered = discovered
                        .with_component(ComponentAssociation::new(component.name.clone(), score));
                }
            }
            self.store.record_route(discovered);
        }

        ranked.iter().take(max).cloned().collect()
    }
}

fn dedup_candidates(candidates: &[RouteCandidate]) -> Vec<RouteCandidate> {
    let mut seen: Vec<RouteCandidate> = Vec::new();
    for candidate in candidates {
        if !seen
            .iter()
            .any(|c| c.name == candidate.name && c.url == candidate.url)
        {
            seen.push(candidate.clone());
        }
    }
    seen
}

fn map_oracle_ranking(
    candidates: &[RouteCandidate],
    data: Option<&serde_json::Value>,
) -> Option<Vec<RankedRoute>> {
    let payload: RankingPayload = serde_json::from_value(data?.clone()).ok()?;
    if payload.rankings.is_empty() {
        return None;
    }

    let mut ranked: Vec<RankedRoute> = payload
        .rankings
        .into_iter()
        .filter_map(|entry| {
            let candidate = candidates.get(entry.index)?;
            Some(RankedRoute {
                name: candidate.name.clone(),
                url: candidate.url.clone(),
                score: entry.score,
                method: DiscoveryMethod::Oracle,
                reason: entry.reason,
            })
        })
        .collect();
    if ranked.is_empty() {
        return None;
    }
    sort_by_score(&mut ranked);
    Some(ranked)
}

fn sort_by_score(ranked: &mut [RankedRoute]) {
    ranked.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.name.cmp(&b.name))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use changescout_core_types::{ChangeContext, ChangedFile, ComponentRef, FileStatus};
    use oracle_gateway::MockOracle;
    use serde_json::json;

    fn store_with_change() -> Arc<ContextStore> {
        let store = Arc::new(ContextStore::default());
        store.set_change_context(
            ChangeContext::new("Refactor billing invoice view", "refactor/billing")
                .with_file(ChangedFile::new(
                    "src/billing/InvoiceView.tsx",
                    FileStatus::Modified,
                    80,
                ))
                .with_component(ComponentRef::new("InvoiceView", "src/billing/InvoiceView.tsx")),
        );
        store
    }

    fn discovery(oracle: MockOracle, store: Arc<ContextStore>) -> RouteDiscovery {
        RouteDiscovery::new(Arc::new(oracle), store, ScoringConfig::default())
    }

    #[tokio::test]
    async fn oracle_ranking_maps_indices_back_to_candidates() {
        let oracle = MockOracle::new();
        oracle.push_value(json!({
            "rankings": [
                {"index": 1, "score": 0.9, "reason": "invoice page"},
                {"index": 0, "score": 0.2},
            ]
        }));
        let engine = discovery(oracle, store_with_change());

        let ranked = engine
            .rank_candidates(&[
                RouteCandidate::new("Settings", "/settings"),
                RouteCandidate::new("Invoices", "/invoices"),
            ])
            .await;

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].url, "/invoices");
        assert_eq!(ranked[0].method, DiscoveryMethod::Oracle);
        assert_eq!(ranked[0].reason.as_deref(), Some("invoice page"));
    }

    #[tokio::test]
    async fn unavailable_oracle_falls_back_deterministically() {
        let engine = discovery(MockOracle::unavailable(), store_with_change());
        let candidates = vec![
            RouteCandidate::new("Invoice list", "/invoices"),
            RouteCandidate::new("Billing settings", "/billing/settings"),
            RouteCandidate::new("Dashboard", "/dashboard"),
        ];

        let first = engine.rank_candidates(&candidates).await;
        let second = engine.rank_candidates(&candidates).await;

        assert!(!first.is_empty());
        assert!(first.iter().all(|r| r.method == DiscoveryMethod::Keyword));
        assert!(first.iter().all(|r| r.score > 0.3));
        let order: Vec<&str> = first.iter().map(|r| r.url.as_str()).collect();
        let order_again: Vec<&str> = second.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(order, order_again);
        // Dashboard shares no keyword with the change and is filtered out.
        assert!(!order.contains(&"/dashboard"));
    }

    #[tokio::test]
    async fn no_keyword_overlap_yields_empty_ranking_not_error() {
        let engine = discovery(MockOracle::unavailable(), store_with_change());
        let ranked = engine
            .rank_candidates(&[
                RouteCandidate::new("Settings", "/settings"),
                RouteCandidate::new("Dashboard", "/dashboard"),
            ])
            .await;
        assert!(ranked.is_empty());
    }

    #[tokio::test]
    async fn malformed_oracle_ranking_falls_back() {
        let oracle = MockOracle::new();
        oracle.push_value(json!({"rankings": "not-a-list"}));
        let engine = discovery(oracle, store_with_change());

        let ranked = engine
            .rank_candidates(&[RouteCandidate::new("Invoice list", "/invoices")])
            .await;
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].method, DiscoveryMethod::Keyword);
    }

    #[tokio::test]
    async fn selection_records_all_routes_but_returns_top_slice() {
        let store = store_with_change();
        let engine = discovery(MockOracle::unavailable(), store.clone());
        let ranked: Vec<RankedRoute> = (0..5)
            .map(|i| RankedRoute {
                name: format!("Invoice {i}"),
                url: format!("/invoices/{i}"),
                score: 0.9 - (i as f64) * 0.1,
                method: DiscoveryMethod::Keyword,
                reason: None,
            })
            .collect();

        let selected = engine.select_for_exploration(&ranked, MAX_EXPLORATION_ROUTES);

        assert_eq!(selected.len(), 3);
        assert_eq!(store.routes().len(), 5);
        let recorded = store.routes();
        let invoice0 = recorded.iter().find(|r| r.url == "/invoices/0").unwrap();
        assert!(invoice0
            .components
            .iter()
            .any(|a| a.component == "InvoiceView"));
    }

    #[tokio::test]
    async fn duplicate_candidates_are_ranked_once() {
        let engine = discovery(MockOracle::unavailable(), store_with_change());
        let ranked = engine
            .rank_candidates(&[
                RouteCandidate::new("Invoice list", "/invoices"),
                RouteCandidate::new("Invoice list", "/invoices"),
            ])
            .await;
        assert_eq!(ranked.len(), 1);
    }
}
