//! Exploration session orchestration
//!
//! One session: set the change context, open the entry page, rank candidate
//! routes, expand the selected routes into a navigate/discover/test plan,
//! execute it, and package the trace for downstream issue detectors.

use std::sync::Arc;

use browser_driver::{BrowserDriver, ElementHandle, NavigateOptions};
use changescout_core_types::ChangeContext;
use context_store::{ContextStore, SnapshotElement, StoreExport};
use oracle_gateway::DecisionOracle;
use route_discovery::{RankedRoute, RouteCandidate, RouteDiscovery};
use serde::{Deserialize, Serialize};
use step_executor::{
    ArtifactKind, ArtifactSink, ExplorationPlan, Step, StepAction, StepExecutor, StepResult,
    RunSummary,
};
use tracing::info;

use crate::config::ExploreConfig;
use crate::errors::ScoutError;

/// Read-only snapshot of one finished session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplorationReport {
    pub summary: RunSummary,
    pub results: Vec<StepResult>,

    /// Every ranked route, including those below the exploration cap.
    pub routes: Vec<RankedRoute>,

    /// Full session knowledge for cross-session reuse.
    pub store: StoreExport,
}

/// Wires the store, route discovery and the executor into one run.
pub struct ExplorationSession {
    driver: Arc<dyn BrowserDriver>,
    store: Arc<ContextStore>,
    discovery: RouteDiscovery,
    executor: StepExecutor,
    config: ExploreConfig,
}

impl ExplorationSession {
    pub fn new(
        driver: Arc<dyn BrowserDriver>,
        oracle: Arc<dyn DecisionOracle>,
        config: ExploreConfig,
    ) -> Self {
        let store = Arc::new(ContextStore::new(config.caps));
        let discovery = RouteDiscovery::new(oracle.clone(), store.clone(), config.scoring);
        let executor = StepExecutor::new(
            driver.clone(),
            oracle,
            store.clone(),
            config.executor.clone(),
        );
        Self {
            driver,
            store,
            discovery,
            executor,
            config,
        }
    }

    /// Route captured artifacts into the given sink.
    pub fn with_sink(mut self, sink: Arc<dyn ArtifactSink>) -> Self {
        self.executor = self.executor.with_sink(sink);
        self
    }

    /// Shared handle to the session's knowledge store.
    pub fn store(&self) -> Arc<ContextStore> {
        self.store.clone()
    }

    /// Run a full exploration for the given change. Only entry-page
    /// navigation failure aborts the run; everything after that is
    /// contained in step results.
    pub async fn run(&self, change: ChangeContext) -> Result<ExplorationReport, ScoutError> {
        info!(title = %change.title, branch = %change.branch, "starting exploration session");
        let plan_name = format!("explore: {}", change.title);
        self.store.set_change_context(change);

        self.driver
            .navigate(&self.config.base_url, &NavigateOptions::default())
            .await?;

        let elements = self.driver.interactive_elements().await?;
        self.store.record_snapshot(
            self.driver.current_url().await?,
            self.driver.page_title().await?,
            elements
                .iter()
                .map(|element| SnapshotElement {
                    selector: element.selector.clone(),
                    tag: element.tag.clone(),
                    text: element.text.clone(),
                })
                .collect(),
        );
        let candidates = candidates_from_elements(&elements);
        info!(candidates = candidates.len(), "collected entry-page candidates");

        let ranked = self.discovery.rank_candidates(&candidates).await;
        let selected = self
            .discovery
            .select_for_exploration(&ranked, self.config.max_routes);
        info!(
            ranked = ranked.len(),
            selected = selected.len(),
            "routes selected for deep exploration"
        );

        let plan = build_plan(plan_name, &selected);
        let execution = self.executor.execute(plan).await;

        Ok(ExplorationReport {
            summary: execution.summary,
            results: execution.results,
            routes: ranked,
            store: self.store.export(),
        })
    }
}

/// Anchor-like elements with a target become route candidates.
fn candidates_from_elements(elements: &[ElementHandle]) -> Vec<RouteCandidate> {
    elements
        .iter()
        .filter_map(|element| {
            let href = element.href.as_deref()?;
            if href.is_empty() || href.starts_with('#') {
                return None;
            }
            let name = if element.text.trim().is_empty() {
                element.selector.clone()
            } else {
                element.text.trim().to_string()
            };
            Some(RouteCandidate::new(name, href))
        })
        .collect()
}

/// Expand selected routes into navigate/discover/test triples. The entry
/// snapshot step comes first so the store has a baseline page.
fn build_plan(name: String, selected: &[RankedRoute]) -> ExplorationPlan {
    let mut plan = ExplorationPlan::new(name);
    plan.push_step(Step::new(StepAction::CaptureState));

    for route in selected {
        plan.push_step(
            Step::new(StepAction::Navigate)
                .with_url(route.url.clone())
                .with_reasoning(format!(
                    "route '{}' ranked {:.2} for this change",
                    route.name, route.score
                ))
                .with_artifact(ArtifactKind::Screenshot),
        );
        plan.push_step(
            Step::new(StepAction::OracleDiscover)
                .with_value(route.name.clone())
                .optional(),
        );
        plan.push_step(
            Step::new(StepAction::TestInteractions)
                .with_value(route.name.clone())
                .optional()
                .with_artifact(ArtifactKind::ConsoleLog)
                .with_artifact(ArtifactKind::NetworkLog),
        );
    }
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use context_store::DiscoveryMethod;

    fn ranked(name: &str, url: &str) -> RankedRoute {
        RankedRoute {
            name: name.to_string(),
            url: url.to_string(),
            score: 0.8,
            method: DiscoveryMethod::Keyword,
            reason: None,
        }
    }

    #[test]
    fn candidates_skip_fragment_and_empty_targets() {
        let elements = vec![
            ElementHandle::new("#a", "a").with_text("Invoices").with_href("/invoices"),
            ElementHandle::new("#b", "a").with_text("Top").with_href("#top"),
            ElementHandle::new("#c", "button").with_text("Save"),
        ];
        let candidates = candidates_from_elements(&elements);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].name, "Invoices");
        assert_eq!(candidates[0].url, "/invoices");
    }

    #[test]
    fn plan_expands_each_route_into_three_steps() {
        let plan = build_plan(
            "explore".to_string(),
            &[ranked("Invoices", "/invoices"), ranked("Reports", "/reports")],
        );
        // 1 capture + 2 routes x (navigate + discover + test).
        assert_eq!(plan.len(), 7);
        let actions: Vec<String> = plan
            .steps
            .iter()
            .map(|step| step.action.label().to_string())
            .collect();
        assert_eq!(actions[0], "capture_state");
        assert_eq!(actions[1], "navigate");
        assert_eq!(actions[2], "oracle_discover");
        assert_eq!(actions[3], "test_interactions");
        // Navigation is required; discovery and probing are optional.
        assert!(!plan.steps[1].optional);
        assert!(plan.steps[2].optional);
        assert!(plan.steps[3].optional);
    }
}
