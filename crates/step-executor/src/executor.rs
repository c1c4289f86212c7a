//! Sequential step executor
//!
//! Steps run strictly one after another. Oracle-backed actions walk a
//! three-tier strategy chain: oracle decision, deterministic element
//! matching, then "nothing relevant found" as an empty success. All driver
//! and oracle errors are converted into result fields at the step boundary.

use std::collections::VecDeque;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use browser_driver::{BrowserDriver, DriverError, ElementHandle, NavigateOptions, WaitCondition, WaitState};
use changescout_core_types::tokenize;
use chrono::Utc;
use context_store::{
    ComponentAssociation, ContextStore, DecisionQuery, DiscoveredRoute, DiscoveryMethod,
    InteractionPattern, NavigationOutcome, NavigationStep, OracleDecision, SnapshotElement,
};
use oracle_gateway::prompt::{build_decision_prompt, build_step_generation_prompt};
use oracle_gateway::{DecisionOracle, DecisionPayload, QueryOptions};
use route_discovery::{extract_keywords, infer_route, relevance_score, ScoringConfig};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, info, warn};

use crate::errors::ExecutorError;
use crate::sink::{ArtifactSink, NullSink};
use crate::types::{
    ArtifactKind, CapturedArtifact, ExecutionReport, ExplorationPlan, RunSummary, Step,
    StepAction, StepResult, StepStatus,
};

/// Safety margin added on top of a step's own timeout before the executor
/// gives up on the dispatch future.
const STEP_TIMEOUT_GRACE_MS: u64 = 100;

/// Upper bound on steps appended by one generation step.
const MAX_GENERATED_STEPS: usize = 5;

/// How many elements a test-interactions step exercises at most.
const MAX_TEST_TARGETS: usize = 3;

/// Executor tuning knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Timeout applied to a step that does not carry its own.
    pub default_timeout_ms: u64,

    /// Settle pause inserted after every step.
    pub inter_step_pause_ms: u64,

    /// Oracle decisions below this confidence are not acted on.
    pub confidence_threshold: f64,

    pub scoring: ScoringConfig,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: 10_000,
            inter_step_pause_ms: 500,
            confidence_threshold: 0.6,
            scoring: ScoringConfig::default(),
        }
    }
}

/// Internal dispatch outcome before the optional/required rule is applied.
enum Dispatch {
    Done(Value),
    Skip(String),
}

/// Runs exploration plans against the browser driver.
pub struct StepExecutor {
    driver: Arc<dyn BrowserDriver>,
    oracle: Arc<dyn DecisionOracle>,
    store: Arc<ContextStore>,
    sink: Arc<dyn ArtifactSink>,
    config: ExecutorConfig,
}

impl StepExecutor {
    pub fn new(
        driver: Arc<dyn BrowserDriver>,
        oracle: Arc<dyn DecisionOracle>,
        store: Arc<ContextStore>,
        config: ExecutorConfig,
    ) -> Self {
        Self {
            driver,
            oracle,
            store,
            sink: Arc::new(NullSink),
            config,
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn ArtifactSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Execute a plan to completion. A failed required step aborts the
    /// remaining queue; everything else is contained and recorded.
    pub async fn execute(&self, plan: ExplorationPlan) -> ExecutionReport {
        info!(plan = %plan.name, steps = plan.len(), "executing exploration plan");
        let started_at = Utc::now();
        let ExplorationPlan {
            id: plan_id,
            mut steps,
            ..
        } = plan;

        let mut results: Vec<StepResult> = Vec::new();
        let mut aborted = false;

        while let Some(step) = steps.pop_front() {
            if aborted {
                let mut result = StepResult::new(&step);
                result.finalize(
                    StepStatus::Skipped,
                    Some("plan aborted after required step failure".to_string()),
                );
                results.push(result);
                continue;
            }

            let result = self.run_step(&step, &mut steps).await;
            if result.status == StepStatus::Failed {
                warn!(step = %step.id, action = %step.action, "required step failed; aborting remaining plan");
                aborted = true;
            }
            results.push(result);

            if self.config.inter_step_pause_ms > 0 {
                sleep(Duration::from_millis(self.config.inter_step_pause_ms)).await;
            }
        }

        let mut summary = RunSummary {
            total: results.len(),
            succeeded: results
                .iter()
                .filter(|r| r.status == StepStatus::Success)
                .count(),
            failed: results
                .iter()
                .filter(|r| r.status == StepStatus::Failed)
                .count(),
            skipped: results
                .iter()
                .filter(|r| r.status == StepStatus::Skipped)
                .count(),
            duration_ms: Utc::now()
                .signed_duration_since(started_at)
                .num_milliseconds()
                .max(0) as u64,
            final_url: None,
            final_title: None,
        };
        summary.final_url = self.driver.current_url().await.ok();
        summary.final_title = self.driver.page_title().await.ok();

        info!(
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            skipped = summary.skipped,
            "plan finished"
        );

        ExecutionReport {
            plan_id,
            results,
            summary,
        }
    }

    async fn run_step(&self, step: &Step, queue: &mut VecDeque<Step>) -> StepResult {
        debug!(step = %step.id, action = %step.action, "dispatching step");
        let mut result = StepResult::new(step);

        let timeout_ms = step
            .params
            .timeout_ms
            .unwrap_or(self.config.default_timeout_ms);
        let budget = Duration::from_millis(timeout_ms + STEP_TIMEOUT_GRACE_MS);

        let outcome = match timeout(budget, self.dispatch(step, queue)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(ExecutorError::Timeout { timeout_ms }),
        };

        match outcome {
            Ok(Dispatch::Done(data)) => {
                result.data = data;
                self.capture_artifacts(step, &mut result).await;
                result.finalize(StepStatus::Success, None);
            }
            Ok(Dispatch::Skip(reason)) => {
                warn!(step = %step.id, reason = %reason, "step skipped");
                result.finalize(StepStatus::Skipped, Some(reason));
            }
            Err(err) => {
                // Keep failures debuggable: grab a diagnostic screenshot
                // before finalizing.
                self.capture_diagnostic(&mut result).await;
                self.store.record_navigation(
                    NavigationStep::new(
                        step.action.label(),
                        step_target(step),
                        NavigationOutcome::Failed,
                    )
                    .with_reasoning(err.to_string()),
                );
                if step.optional {
                    result.finalize(
                        StepStatus::Skipped,
                        Some(format!("optional step failed: {err}")),
                    );
                } else {
                    result.finalize(StepStatus::Failed, Some(err.to_string()));
                }
            }
        }

        if let Some(wait_after) = step.params.wait_after_ms {
            sleep(Duration::from_millis(wait_after)).await;
        }
        result
    }

    async fn dispatch(
        &self,
        step: &Step,
        queue: &mut VecDeque<Step>,
    ) -> Result<Dispatch, ExecutorError> {
        match &step.action {
            StepAction::Navigate => self.do_navigate(step).await,
            StepAction::Wait => self.do_wait(step).await,
            StepAction::Click => self.do_element_action(step, "click").await,
            StepAction::TypeText => self.do_element_action(step, "type").await,
            StepAction::Select => self.do_element_action(step, "select").await,
            StepAction::Hover => self.do_element_action(step, "hover").await,
            StepAction::Keyboard => {
                let key = step
                    .params
                    .key
                    .as_deref()
                    .ok_or_else(|| ExecutorError::missing_param("keyboard", "key"))?;
                self.driver.press_key(key).await?;
                Ok(Dispatch::Done(json!({ "key": key })))
            }
            StepAction::Screenshot => {
                let bytes = self.driver.screenshot().await?;
                Ok(Dispatch::Done(json!({
                    "bytes": bytes.len(),
                    "base64": BASE64.encode(&bytes),
                })))
            }
            StepAction::Resize => {
                let width = step
                    .params
                    .width
                    .ok_or_else(|| ExecutorError::missing_param("resize", "width"))?;
                let height = step
                    .params
                    .height
                    .ok_or_else(|| ExecutorError::missing_param("resize", "height"))?;
                self.driver.resize(width, height).await?;
                Ok(Dispatch::Done(json!({ "width": width, "height": height })))
            }
            StepAction::Scroll => {
                let dx = step.params.scroll_x.unwrap_or(0);
                let dy = step.params.scroll_y.unwrap_or(600);
                self.driver.scroll_by(dx, dy).await?;
                Ok(Dispatch::Done(json!({ "dx": dx, "dy": dy })))
            }
            StepAction::CaptureState => {
                let (url, title, element_count) = self.snapshot_page().await?;
                Ok(Dispatch::Done(json!({
                    "url": url,
                    "title": title,
                    "element_count": element_count,
                })))
            }
            StepAction::DiscoverComponent => self.do_discover_component(step).await,
            StepAction::TestInteractions => self.do_test_interactions(step).await,
            StepAction::OracleNavigate | StepAction::OracleDiscover | StepAction::OracleTest => {
                self.run_oracle_cascade(step).await
            }
            StepAction::OracleGenerateSteps => self.do_generate_steps(step, queue).await,
            StepAction::Other(name) => Ok(Dispatch::Skip(format!(
                "unrecognized action '{name}'; step skipped"
            ))),
        }
    }

    async fn do_navigate(&self, step: &Step) -> Result<Dispatch, ExecutorError> {
        let url = step
            .params
            .url
            .as_deref()
            .ok_or_else(|| ExecutorError::missing_param("navigate", "url"))?;
        let options = NavigateOptions {
            timeout_ms: step
                .params
                .timeout_ms
                .unwrap_or(self.config.default_timeout_ms),
        };
        self.driver.navigate(url, &options).await?;
        self.store.record_navigation(
            NavigationStep::new("navigate", url, NavigationOutcome::Success)
                .with_reasoning(step.meta.reasoning.clone().unwrap_or_default()),
        );
        let (final_url, title, element_count) = self.snapshot_page().await?;
        Ok(Dispatch::Done(json!({
            "url": final_url,
            "title": title,
            "element_count": element_count,
        })))
    }

    async fn do_wait(&self, step: &Step) -> Result<Dispatch, ExecutorError> {
        let timeout_ms = step.params.timeout_ms.unwrap_or(1_000);
        if let Some(selector) = step.params.selector.as_deref() {
            let condition = WaitCondition::Selector {
                selector: selector.to_string(),
                state: WaitState::Visible,
            };
            self.driver.wait_for(&condition, timeout_ms).await?;
            return Ok(Dispatch::Done(json!({ "waited_for": selector })));
        }
        sleep(Duration::from_millis(timeout_ms)).await;
        Ok(Dispatch::Done(json!({ "waited_ms": timeout_ms })))
    }

    /// Click/type/select/hover share the find-then-act shape. An absent
    /// element is an expected exploration outcome, not a failure.
    async fn do_element_action(
        &self,
        step: &Step,
        interaction: &str,
    ) -> Result<Dispatch, ExecutorError> {
        let selector = step
            .params
            .selector
            .as_deref()
            .ok_or_else(|| ExecutorError::missing_param("element action", "selector"))?;

        let Some(element) = self.driver.find(selector).await? else {
            debug!(selector, "target element absent; resolving as empty success");
            return Ok(Dispatch::Done(json!({ "found": false, "selector": selector })));
        };

        let acted = match &step.action {
            StepAction::Click => self.driver.click(&element).await,
            StepAction::TypeText => {
                let value = step
                    .params
                    .value
                    .as_deref()
                    .ok_or_else(|| ExecutorError::missing_param("type_text", "value"))?;
                self.driver.type_text(&element, value).await
            }
            StepAction::Select => {
                let value = step
                    .params
                    .value
                    .as_deref()
                    .ok_or_else(|| ExecutorError::missing_param("select", "value"))?;
                self.driver.select_option(&element, value).await
            }
            StepAction::Hover => self.driver.hover(&element).await,
            _ => Err(DriverError::protocol("unsupported element action")),
        };

        match acted {
            Ok(()) => {
                self.store.record_pattern(InteractionPattern::new(
                    "interaction",
                    true,
                    element.tag.clone(),
                    interaction,
                ));
                self.store.record_navigation(NavigationStep::new(
                    interaction,
                    describe_element(&element),
                    NavigationOutcome::Success,
                ));
                Ok(Dispatch::Done(json!({
                    "found": true,
                    "selector": element.selector,
                    "tag": element.tag,
                })))
            }
            Err(err) => {
                self.store.record_pattern(InteractionPattern::new(
                    "interaction",
                    false,
                    element.tag.clone(),
                    interaction,
                ));
                Err(err.into())
            }
        }
    }

    async fn do_discover_component(&self, step: &Step) -> Result<Dispatch, ExecutorError> {
        let component = step.params.value.clone().unwrap_or_default();
        let current_url = self.driver.current_url().await?;

        // Known routes first; a hit means the component already has a home.
        if let Some(route) = infer_route(&component, &self.store.routes()) {
            return Ok(Dispatch::Done(json!({
                "matched": true,
                "source": "known_route",
                "route": { "name": route.name, "url": route.url },
            })));
        }

        let matches = self.match_elements(&component).await?;
        if matches.is_empty() {
            debug!(component, "no matching elements on current page");
            return Ok(Dispatch::Done(json!({ "matched": false })));
        }

        let mut route = DiscoveredRoute::new(
            if component.is_empty() {
                matches[0].0.text.clone()
            } else {
                component.clone()
            },
            current_url.clone(),
            DiscoveryMethod::Category,
        );
        if !component.is_empty() {
            route = route.with_component(ComponentAssociation::new(component.clone(), matches[0].1));
        }
        self.store.record_route(route);

        let found: Vec<Value> = matches
            .iter()
            .map(|(element, score)| {
                json!({ "selector": element.selector, "score": score })
            })
            .collect();
        Ok(Dispatch::Done(json!({
            "matched": true,
            "source": "page_elements",
            "elements": found,
        })))
    }

    async fn do_test_interactions(&self, step: &Step) -> Result<Dispatch, ExecutorError> {
        let component = step.params.value.clone().unwrap_or_default();
        let matches = self.match_elements(&component).await?;
        if matches.is_empty() {
            return Ok(Dispatch::Done(json!({ "tested": 0 })));
        }

        let mut tested = Vec::new();
        for (element, score) in matches.iter().take(MAX_TEST_TARGETS) {
            let hover_ok = match self.driver.hover(element).await {
                Ok(()) => true,
                Err(err) => {
                    warn!(selector = %element.selector, error = %err, "hover probe failed");
                    false
                }
            };
            self.store.record_pattern(InteractionPattern::new(
                "probe",
                hover_ok,
                element.tag.clone(),
                "hover",
            ));
            tested.push(json!({
                "selector": element.selector,
                "score": score,
                "hover_ok": hover_ok,
            }));
        }

        // Click only the best candidate, and only if it is a safe target.
        let (best, _) = &matches[0];
        if matches!(best.tag.as_str(), "a" | "button") {
            let click_ok = match self.driver.click(best).await {
                Ok(()) => true,
                Err(err) => {
                    warn!(selector = %best.selector, error = %err, "click probe failed");
                    false
                }
            };
            self.store.record_pattern(InteractionPattern::new(
                "probe",
                click_ok,
                best.tag.clone(),
                "click",
            ));
            self.store.record_navigation(NavigationStep::new(
                "click",
                describe_element(best),
                if click_ok {
                    NavigationOutcome::Success
                } else {
                    NavigationOutcome::Failed
                },
            ));
        }

        Ok(Dispatch::Done(json!({
            "tested": tested.len(),
            "targets": tested,
        })))
    }

    /// Three-tier cascade for oracle-backed actions: oracle decision,
    /// deterministic element matching, then empty success.
    async fn run_oracle_cascade(&self, step: &Step) -> Result<Dispatch, ExecutorError> {
        let component = step.params.value.clone().unwrap_or_default();

        if self.oracle.is_available().await {
            if let Some(data) = self.try_oracle_tier(step, &component).await? {
                return Ok(Dispatch::Done(data));
            }
        } else {
            debug!("oracle unavailable; skipping straight to heuristic tier");
        }

        if let Some(data) = self.try_heuristic_tier(step, &component).await? {
            return Ok(Dispatch::Done(data));
        }

        // Nothing relevant found: a valid outcome, not a failure.
        debug!(action = %step.action, "cascade exhausted without a match");
        Ok(Dispatch::Done(json!({ "tier": "none", "matched": false })))
    }

    async fn try_oracle_tier(
        &self,
        step: &Step,
        component: &str,
    ) -> Result<Option<Value>, ExecutorError> {
        let query = DecisionQuery {
            component: (!component.is_empty()).then(|| component.to_string()),
            current_url: self.driver.current_url().await.ok(),
            include_history: true,
        };
        let context = self.store.build_decision_context(&query);
        let question = match &step.action {
            StepAction::OracleNavigate => format!(
                "Which navigation target should be opened next to verify the \
                 '{component}' component? Answer with a url or selector."
            ),
            StepAction::OracleDiscover => format!(
                "Which element on the current page most likely renders the \
                 '{component}' component?"
            ),
            _ => format!(
                "Which interaction on the current page best exercises the \
                 '{component}' component?"
            ),
        };
        let prompt = build_decision_prompt(&question, &context);

        let response = match self.oracle.query(&prompt, &QueryOptions::default()).await {
            Ok(response) if response.success => response,
            Ok(response) => {
                debug!(error = ?response.error, "oracle gave no usable payload");
                return Ok(None);
            }
            Err(err) => {
                warn!(error = %err, "oracle query failed; falling back");
                return Ok(None);
            }
        };

        let Some(decision) = response.decision() else {
            debug!("oracle payload did not parse into a decision");
            return Ok(None);
        };
        self.store.record_decision(OracleDecision::new(
            component,
            response.data.clone().unwrap_or(Value::Null),
            step.action.label(),
            decision.confidence,
        ));

        if !decision.meets(self.config.confidence_threshold) {
            debug!(
                confidence = decision.confidence,
                threshold = self.config.confidence_threshold,
                "decision below confidence threshold; discarded"
            );
            return Ok(None);
        }
        if !decision.should_act {
            debug!("oracle advised against acting");
            return Ok(None);
        }

        self.act_on_decision(step, component, &decision).await
    }

    async fn act_on_decision(
        &self,
        step: &Step,
        component: &str,
        decision: &DecisionPayload,
    ) -> Result<Option<Value>, ExecutorError> {
        let target = decision.target.trim();
        if target.is_empty() {
            return Ok(None);
        }

        if looks_like_url(target) {
            self.driver
                .navigate(target, &NavigateOptions::default())
                .await?;
            self.store.record_navigation(
                NavigationStep::new("navigate", target, NavigationOutcome::Success)
                    .with_confidence(decision.confidence)
                    .with_reasoning(decision.reasoning.clone()),
            );
            self.snapshot_page().await?;
            return Ok(Some(json!({
                "tier": "oracle",
                "target": target,
                "acted": "navigate",
            })));
        }

        let Some(element) = self.driver.find(target).await? else {
            debug!(target, "oracle target not present; falling through");
            return Ok(None);
        };

        match &step.action {
            StepAction::OracleDiscover => {
                let current_url = self.driver.current_url().await?;
                let name = if component.is_empty() {
                    element.text.clone()
                } else {
                    component.to_string()
                };
                let mut route = DiscoveredRoute::new(name, current_url, DiscoveryMethod::Oracle);
                if !component.is_empty() {
                    route = route.with_component(ComponentAssociation::new(
                        component,
                        decision.confidence,
                    ));
                }
                self.store.record_route(route);
            }
            _ => {
                self.driver.click(&element).await?;
                self.store.record_navigation(
                    NavigationStep::new("click", describe_element(&element), NavigationOutcome::Success)
                        .with_confidence(decision.confidence)
                        .with_reasoning(decision.reasoning.clone()),
                );
                self.store.record_pattern(InteractionPattern::new(
                    "oracle",
                    true,
                    element.tag.clone(),
                    "click",
                ));
            }
        }

        Ok(Some(json!({
            "tier": "oracle",
            "target": element.selector,
            "acted": step.action.label(),
        })))
    }

    async fn try_heuristic_tier(
        &self,
        step: &Step,
        component: &str,
    ) -> Result<Option<Value>, ExecutorError> {
        let matches = self.match_elements(component).await?;
        let Some((element, score)) = matches.first() else {
            return Ok(None);
        };

        match &step.action {
            StepAction::OracleDiscover => {
                let current_url = self.driver.current_url().await?;
                let name = if component.is_empty() {
                    element.text.clone()
                } else {
                    component.to_string()
                };
                let mut route = DiscoveredRoute::new(name, current_url, DiscoveryMethod::Keyword);
                if !component.is_empty() {
                    route = route.with_component(ComponentAssociation::new(component, *score));
                }
                self.store.record_route(route);
            }
            _ => {
                if let Some(href) = element.href.as_deref() {
                    self.driver
                        .navigate(href, &NavigateOptions::default())
                        .await?;
                    self.store.record_navigation(
                        NavigationStep::new("navigate", href, NavigationOutcome::Success)
                            .with_confidence(*score)
                            .with_reasoning("keyword fallback match"),
                    );
                    self.snapshot_page().await?;
                } else {
                    self.driver.click(element).await?;
                    self.store.record_navigation(
                        NavigationStep::new("click", describe_element(element), NavigationOutcome::Success)
                            .with_confidence(*score)
                            .with_reasoning("keyword fallback match"),
                    );
                }
                self.store.record_pattern(InteractionPattern::new(
                    "fallback",
                    true,
                    element.tag.clone(),
                    "click",
                ));
            }
        }

        Ok(Some(json!({
            "tier": "heuristic",
            "target": element.selector,
            "score": score,
        })))
    }

    /// Score current page elements against change-context keywords plus the
    /// component name; descending, cutoff-filtered, deterministic.
    async fn match_elements(
        &self,
        component: &str,
    ) -> Result<Vec<(ElementHandle, f64)>, ExecutorError> {
        let mut keywords = self
            .store
            .change_context()
            .map(|change| extract_keywords(&change))
            .unwrap_or_default();
        for token in tokenize(component) {
            if !keywords.contains(&token) {
                keywords.push(token);
            }
        }
        if keywords.is_empty() {
            return Ok(Vec::new());
        }

        let elements = self.driver.interactive_elements().await?;
        let mut scored: Vec<(ElementHandle, f64)> = elements
            .into_iter()
            .map(|element| {
                let text = describe_element(&element);
                let score = relevance_score(&keywords, &text, &self.config.scoring);
                (element, score)
            })
            .filter(|(_, score)| *score > self.config.scoring.cutoff)
            .collect();
        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.selector.cmp(&b.0.selector))
        });
        Ok(scored)
    }

    async fn do_generate_steps(
        &self,
        step: &Step,
        queue: &mut VecDeque<Step>,
    ) -> Result<Dispatch, ExecutorError> {
        if step.generated {
            return Ok(Dispatch::Skip(
                "nested step generation is not allowed".to_string(),
            ));
        }
        let component = step.params.value.clone().unwrap_or_default();

        if self.oracle.is_available().await {
            let query = DecisionQuery {
                component: (!component.is_empty()).then(|| component.clone()),
                current_url: self.driver.current_url().await.ok(),
                include_history: true,
            };
            let context = self.store.build_decision_context(&query);
            let prompt = build_step_generation_prompt(&component, &context);

            match self.oracle.query(&prompt, &QueryOptions::default()).await {
                Ok(response) if response.success => {
                    if let Some(decision) = response.decision() {
                        self.store.record_decision(OracleDecision::new(
                            &component,
                            response.data.clone().unwrap_or(Value::Null),
                            step.action.label(),
                            decision.confidence,
                        ));
                        if decision.meets(self.config.confidence_threshold) {
                            let generated = parse_generated_steps(&decision.next_steps);
                            if !generated.is_empty() {
                                let count = generated.len();
                                for new_step in generated {
                                    queue.push_back(new_step);
                                }
                                info!(count, "appended oracle-generated steps");
                                return Ok(Dispatch::Done(json!({
                                    "tier": "oracle",
                                    "generated": count,
                                })));
                            }
                        }
                    }
                }
                Ok(response) => {
                    debug!(error = ?response.error, "step generation got no usable payload")
                }
                Err(err) => warn!(error = %err, "step generation query failed"),
            }
        }

        // Static expansion: capture the page, look for the component, probe
        // its interactions.
        let statics = [
            Step::new(StepAction::CaptureState),
            Step::new(StepAction::DiscoverComponent).with_value(component.clone()),
            Step::new(StepAction::TestInteractions).with_value(component),
        ];
        let count = statics.len();
        for new_step in statics {
            queue.push_back(new_step.optional().generated());
        }
        Ok(Dispatch::Done(json!({
            "tier": "static",
            "generated": count,
        })))
    }

    async fn snapshot_page(&self) -> Result<(String, String, usize), DriverError> {
        let url = self.driver.current_url().await?;
        let title = self.driver.page_title().await?;
        let elements = self.driver.interactive_elements().await?;
        let count = elements.len();
        let snapshot: Vec<SnapshotElement> = elements
            .into_iter()
            .map(|element| SnapshotElement {
                selector: element.selector,
                tag: element.tag,
                text: element.text,
            })
            .collect();
        self.store.record_snapshot(&url, &title, snapshot);
        Ok((url, title, count))
    }

    async fn capture_artifacts(&self, step: &Step, result: &mut StepResult) {
        for kind in &step.artifacts {
            match self.capture_artifact(*kind).await {
                Ok(payload) => {
                    if let Err(err) = self.sink.emit(&step.id, *kind, &payload).await {
                        warn!(kind = ?kind, error = %err, "artifact sink emit failed");
                    }
                    result.artifacts.push(CapturedArtifact {
                        kind: *kind,
                        payload,
                    });
                }
                Err(err) => {
                    warn!(kind = ?kind, error = %err, "artifact capture failed");
                }
            }
        }
    }

    async fn capture_artifact(&self, kind: ArtifactKind) -> Result<Value, DriverError> {
        match kind {
            ArtifactKind::Screenshot => {
                let bytes = self.driver.screenshot().await?;
                Ok(json!({ "bytes": bytes.len(), "base64": BASE64.encode(&bytes) }))
            }
            ArtifactKind::ConsoleLog => {
                let entries = self.driver.console_logs().await?;
                Ok(serde_json::to_value(entries).unwrap_or(Value::Null))
            }
            ArtifactKind::NetworkLog => {
                let entries = self.driver.network_log().await?;
                Ok(serde_json::to_value(entries).unwrap_or(Value::Null))
            }
            ArtifactKind::PerformanceSnapshot => self
                .driver
                .performance_snapshot()
                .await,
            ArtifactKind::DomSnapshot => {
                let html = self.driver.dom_snapshot().await?;
                Ok(json!({ "html": html }))
            }
        }
    }

    async fn capture_diagnostic(&self, result: &mut StepResult) {
        match self.driver.screenshot().await {
            Ok(bytes) => {
                result.artifacts.push(CapturedArtifact {
                    kind: ArtifactKind::Screenshot,
                    payload: json!({
                        "diagnostic": true,
                        "bytes": bytes.len(),
                        "base64": BASE64.encode(&bytes),
                    }),
                });
            }
            Err(err) => debug!(error = %err, "diagnostic screenshot unavailable"),
        }
    }
}

fn step_target(step: &Step) -> String {
    step.params
        .url
        .clone()
        .or_else(|| step.params.selector.clone())
        .or_else(|| step.params.value.clone())
        .unwrap_or_default()
}

fn describe_element(element: &ElementHandle) -> String {
    format!(
        "{} {} {}",
        element.text,
        element.selector,
        element.href.as_deref().unwrap_or_default()
    )
}

fn looks_like_url(target: &str) -> bool {
    target.starts_with('/') || target.starts_with("http://") || target.starts_with("https://")
}

/// Parse `action|selector|value` strings from the oracle into steps. All
/// generated steps are optional and flagged so they cannot generate more.
fn parse_generated_steps(next_steps: &[String]) -> Vec<Step> {
    let mut steps = Vec::new();
    for entry in next_steps.iter().take(MAX_GENERATED_STEPS) {
        let mut parts = entry.splitn(3, '|');
        let action = parts.next().unwrap_or("").trim();
        if action.is_empty() {
            continue;
        }
        let mut step = Step::new(StepAction::from(action.to_string()))
            .optional()
            .generated();
        if let Some(selector) = parts.next().map(str::trim).filter(|s| !s.is_empty()) {
            step = step.with_selector(selector);
        }
        if let Some(value) = parts.next().map(str::trim).filter(|s| !s.is_empty()) {
            step = step.with_value(value);
        }
        steps.push(step);
    }
    steps
}
