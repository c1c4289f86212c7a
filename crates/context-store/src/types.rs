//! Record types accumulated by the context store

use changescout_core_types::{clamp_confidence, ChangeContext};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome of a single recorded navigation action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NavigationOutcome {
    Success,
    NoChange,
    Failed,
}

/// One navigation or interaction the session performed. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationStep {
    /// Action kind, e.g. `navigate` or `click`.
    pub action: String,

    /// Human-readable description of the target element or url.
    pub target: String,

    pub outcome: NavigationOutcome,

    /// Confidence of the decision that produced this step, in `[0, 1]`.
    pub confidence: f64,

    /// Why the step was taken.
    pub reasoning: String,

    pub timestamp: DateTime<Utc>,

    /// Milliseconds since the session clock started; filled in by the store.
    #[serde(default)]
    pub session_offset_ms: u64,
}

impl NavigationStep {
    pub fn new(
        action: impl Into<String>,
        target: impl Into<String>,
        outcome: NavigationOutcome,
    ) -> Self {
        Self {
            action: action.into(),
            target: target.into(),
            outcome,
            confidence: 1.0,
            reasoning: String::new(),
            timestamp: Utc::now(),
            session_offset_ms: 0,
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = clamp_confidence(confidence);
        self
    }

    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = reasoning.into();
        self
    }
}

/// Interactive element captured in a page snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SnapshotElement {
    pub selector: String,
    pub tag: String,
    #[serde(default)]
    pub text: String,
}

/// Captured state of one distinct url.
///
/// Re-capturing the same url overwrites the snapshot body but preserves and
/// increments the visit count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSnapshot {
    pub url: String,
    pub title: String,
    pub visit_count: u32,
    #[serde(default)]
    pub elements: Vec<SnapshotElement>,
    pub timestamp: DateTime<Utc>,
}

/// Decision returned by the oracle (or synthesized by a heuristic fallback).
/// Append-only log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleDecision {
    /// Component the decision was about.
    pub component: String,

    /// Raw decision payload as recovered from the oracle.
    pub payload: Value,

    /// Action kind the decision selected.
    pub action: String,

    pub confidence: f64,

    pub timestamp: DateTime<Utc>,
}

impl OracleDecision {
    pub fn new(
        component: impl Into<String>,
        payload: Value,
        action: impl Into<String>,
        confidence: f64,
    ) -> Self {
        Self {
            component: component.into(),
            payload,
            action: action.into(),
            confidence: clamp_confidence(confidence),
            timestamp: Utc::now(),
        }
    }
}

/// How a route entered the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryMethod {
    Oracle,
    Keyword,
    Category,
    Manual,
}

/// Association between a route and a component believed to live on it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComponentAssociation {
    pub component: String,
    pub confidence: f64,
}

impl ComponentAssociation {
    pub fn new(component: impl Into<String>, confidence: f64) -> Self {
        Self {
            component: component.into(),
            confidence: clamp_confidence(confidence),
        }
    }
}

/// Navigation target discovered during exploration. Keyed by `(name, url)`;
/// repeated discovery merges component associations instead of duplicating.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveredRoute {
    pub name: String,
    pub url: String,

    /// Ordered sub-actions needed to reach the route from the entry page.
    #[serde(default)]
    pub path: Vec<String>,

    #[serde(default)]
    pub components: Vec<ComponentAssociation>,

    pub method: DiscoveryMethod,
}

impl DiscoveredRoute {
    pub fn new(name: impl Into<String>, url: impl Into<String>, method: DiscoveryMethod) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            path: Vec::new(),
            components: Vec::new(),
            method,
        }
    }

    pub fn with_component(mut self, association: ComponentAssociation) -> Self {
        self.components.push(association);
        self
    }

    pub fn with_path(mut self, path: Vec<String>) -> Self {
        self.path = path;
        self
    }
}

/// Outcome of one attempted interaction, kept for similarity lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionPattern {
    /// Broad category, e.g. `navigation` or `form`.
    pub category: String,

    pub success: bool,

    /// Tag or type of the element interacted with.
    pub component_type: String,

    /// Interaction kind, e.g. `click` or `type`.
    pub interaction_type: String,

    pub timestamp: DateTime<Utc>,
}

impl InteractionPattern {
    pub fn new(
        category: impl Into<String>,
        success: bool,
        component_type: impl Into<String>,
        interaction_type: impl Into<String>,
    ) -> Self {
        Self {
            category: category.into(),
            success,
            component_type: component_type.into(),
            interaction_type: interaction_type.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Parameters for [`crate::ContextStore::build_decision_context`].
#[derive(Debug, Clone, Default)]
pub struct DecisionQuery {
    /// Component the caller is deciding about, if any.
    pub component: Option<String>,

    /// Url the browser is currently on.
    pub current_url: Option<String>,

    /// Include the recent navigation slice.
    pub include_history: bool,
}

/// Size-bounded view of accumulated knowledge handed to decision makers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DecisionContext {
    pub change_context: Option<ChangeContext>,

    /// Snapshot of the current url, when one has been captured.
    pub current_page: Option<PageSnapshot>,

    /// Up to 3 other snapshots sharing the current url's origin.
    #[serde(default)]
    pub related_pages: Vec<PageSnapshot>,

    /// Up to 5 most recent navigation steps, newest first.
    #[serde(default)]
    pub recent_navigation: Vec<NavigationStep>,

    /// Up to 3 most recent oracle decisions, newest first.
    #[serde(default)]
    pub recent_decisions: Vec<OracleDecision>,

    /// Known route for the queried component.
    pub known_route: Option<DiscoveredRoute>,

    /// Up to 3 component names similar to the queried one.
    #[serde(default)]
    pub similar_components: Vec<String>,
}
