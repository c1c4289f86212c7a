//! Plan, step and result types

use std::collections::VecDeque;
use std::fmt;

use changescout_core_types::{PlanId, StepId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Closed set of step action kinds. Unknown names deserialize into
/// [`StepAction::Other`] and resolve as skipped at dispatch, so plans from
/// newer producers never break execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StepAction {
    Navigate,
    Wait,
    Click,
    TypeText,
    Select,
    Keyboard,
    Screenshot,
    Resize,
    Scroll,
    Hover,
    CaptureState,
    DiscoverComponent,
    TestInteractions,
    OracleNavigate,
    OracleDiscover,
    OracleTest,
    OracleGenerateSteps,
    Other(String),
}

impl StepAction {
    pub fn label(&self) -> &str {
        match self {
            StepAction::Navigate => "navigate",
            StepAction::Wait => "wait",
            StepAction::Click => "click",
            StepAction::TypeText => "type_text",
            StepAction::Select => "select",
            StepAction::Keyboard => "keyboard",
            StepAction::Screenshot => "screenshot",
            StepAction::Resize => "resize",
            StepAction::Scroll => "scroll",
            StepAction::Hover => "hover",
            StepAction::CaptureState => "capture_state",
            StepAction::DiscoverComponent => "discover_component",
            StepAction::TestInteractions => "test_interactions",
            StepAction::OracleNavigate => "oracle_navigate",
            StepAction::OracleDiscover => "oracle_discover",
            StepAction::OracleTest => "oracle_test",
            StepAction::OracleGenerateSteps => "oracle_generate_steps",
            StepAction::Other(name) => name,
        }
    }
}

impl From<String> for StepAction {
    fn from(value: String) -> Self {
        match value.as_str() {
            "navigate" => StepAction::Navigate,
            "wait" => StepAction::Wait,
            "click" => StepAction::Click,
            "type_text" => StepAction::TypeText,
            "select" => StepAction::Select,
            "keyboard" => StepAction::Keyboard,
            "screenshot" => StepAction::Screenshot,
            "resize" => StepAction::Resize,
            "scroll" => StepAction::Scroll,
            "hover" => StepAction::Hover,
            "capture_state" => StepAction::CaptureState,
            "discover_component" => StepAction::DiscoverComponent,
            "test_interactions" => StepAction::TestInteractions,
            "oracle_navigate" => StepAction::OracleNavigate,
            "oracle_discover" => StepAction::OracleDiscover,
            "oracle_test" => StepAction::OracleTest,
            "oracle_generate_steps" => StepAction::OracleGenerateSteps,
            _ => StepAction::Other(value),
        }
    }
}

impl From<StepAction> for String {
    fn from(action: StepAction) -> Self {
        action.label().to_string()
    }
}

impl fmt::Display for StepAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Step parameters. Which fields matter depends on the action kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StepParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,

    /// Input value (typed text, select option, component name...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,

    /// Extra settle time after the step completes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wait_after_ms: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub scroll_x: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub scroll_y: Option<i64>,
}

/// Why the step exists, as far as the planner could say.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StepMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
}

/// Artifact kinds a step can request. Captured after the primary action
/// completes; capture never changes the step status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Screenshot,
    ConsoleLog,
    NetworkLog,
    PerformanceSnapshot,
    DomSnapshot,
}

/// One planned action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    pub id: StepId,
    pub action: StepAction,

    #[serde(default)]
    pub params: StepParams,

    /// Optional steps can only end as success or skipped; their failures
    /// never abort the plan.
    #[serde(default)]
    pub optional: bool,

    #[serde(default)]
    pub artifacts: Vec<ArtifactKind>,

    #[serde(default)]
    pub meta: StepMeta,

    /// Set on steps appended mid-run. Generated steps may not generate
    /// further steps.
    #[serde(default)]
    pub generated: bool,
}

impl Step {
    pub fn new(action: StepAction) -> Self {
        Self {
            id: StepId::new(),
            action,
            params: StepParams::default(),
            optional: false,
            artifacts: Vec::new(),
            meta: StepMeta::default(),
            generated: false,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.params.url = Some(url.into());
        self
    }

    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.params.selector = Some(selector.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.params.value = Some(value.into());
        self
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.params.key = Some(key.into());
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.params.timeout_ms = Some(timeout_ms);
        self
    }

    pub fn with_wait_after_ms(mut self, wait_after_ms: u64) -> Self {
        self.params.wait_after_ms = Some(wait_after_ms);
        self
    }

    pub fn with_artifact(mut self, kind: ArtifactKind) -> Self {
        self.artifacts.push(kind);
        self
    }

    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.meta.reasoning = Some(reasoning.into());
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn generated(mut self) -> Self {
        self.generated = true;
        self
    }
}

/// Step lifecycle. Transitions only move forward from `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Success,
    Failed,
    Skipped,
}

/// Artifact captured for one step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapturedArtifact {
    pub kind: ArtifactKind,
    pub payload: Value,
}

/// Outcome of one executed step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub step_id: StepId,
    pub action: String,
    pub status: StepStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub duration_ms: u64,

    #[serde(default)]
    pub artifacts: Vec<CapturedArtifact>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Free-form result data produced by the dispatch handler.
    #[serde(default)]
    pub data: Value,
}

impl StepResult {
    pub fn new(step: &Step) -> Self {
        Self {
            step_id: step.id.clone(),
            action: step.action.label().to_string(),
            status: StepStatus::Pending,
            started_at: Utc::now(),
            finished_at: None,
            duration_ms: 0,
            artifacts: Vec::new(),
            error: None,
            data: Value::Null,
        }
    }

    /// Move to a terminal status. A result already finalized stays as it
    /// is; terminal statuses are never re-opened.
    pub fn finalize(&mut self, status: StepStatus, error: Option<String>) {
        if self.status != StepStatus::Pending {
            return;
        }
        self.status = status;
        self.error = error;
        let finished = Utc::now();
        self.duration_ms = finished
            .signed_duration_since(self.started_at)
            .num_milliseconds()
            .max(0) as u64;
        self.finished_at = Some(finished);
    }

    pub fn is_terminal(&self) -> bool {
        self.status != StepStatus::Pending
    }
}

/// Ordered, extensible work queue of steps.
///
/// The executor consumes from the front; dynamically generated steps are
/// appended to the back without disturbing completed work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplorationPlan {
    pub id: PlanId,
    pub name: String,
    pub steps: VecDeque<Step>,
}

impl ExplorationPlan {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: PlanId::new(),
            name: name.into(),
            steps: VecDeque::new(),
        }
    }

    pub fn push_step(&mut self, step: Step) {
        self.steps.push_back(step);
    }

    pub fn with_step(mut self, step: Step) -> Self {
        self.push_step(step);
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Plan-level rollup handed to issue detectors alongside the step results.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub duration_ms: u64,
    pub final_url: Option<String>,
    pub final_title: Option<String>,
}

/// Aggregate result of a plan run: ordered step results plus the summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub plan_id: PlanId,
    pub results: Vec<StepResult>,
    pub summary: RunSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_action_round_trips_through_serde() {
        let json = "\"frobnicate\"";
        let action: StepAction = serde_json::from_str(json).unwrap();
        assert_eq!(action, StepAction::Other("frobnicate".to_string()));
        assert_eq!(serde_json::to_string(&action).unwrap(), json);
    }

    #[test]
    fn known_actions_use_snake_case_labels() {
        let action: StepAction = serde_json::from_str("\"oracle_generate_steps\"").unwrap();
        assert_eq!(action, StepAction::OracleGenerateSteps);
        assert_eq!(StepAction::TypeText.label(), "type_text");
    }

    #[test]
    fn result_status_only_moves_forward() {
        let step = Step::new(StepAction::Click);
        let mut result = StepResult::new(&step);
        assert!(!result.is_terminal());

        result.finalize(StepStatus::Failed, Some("boom".into()));
        assert_eq!(result.status, StepStatus::Failed);

        // A second finalize must not re-open or overwrite the result.
        result.finalize(StepStatus::Success, None);
        assert_eq!(result.status, StepStatus::Failed);
        assert_eq!(result.error.as_deref(), Some("boom"));
    }

    #[test]
    fn step_builder_sets_params() {
        let step = Step::new(StepAction::TypeText)
            .with_selector("#search")
            .with_value("invoices")
            .with_timeout_ms(5_000)
            .with_artifact(ArtifactKind::Screenshot)
            .optional();

        assert_eq!(step.params.selector.as_deref(), Some("#search"));
        assert_eq!(step.params.timeout_ms, Some(5_000));
        assert!(step.optional);
        assert_eq!(step.artifacts, vec![ArtifactKind::Screenshot]);
    }
}
