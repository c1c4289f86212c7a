//! Bounded store implementation

use std::collections::VecDeque;

use changescout_core_types::{tokenize, ChangeContext, SessionId};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::types::{
    ComponentAssociation, DecisionContext, DecisionQuery, DiscoveredRoute, InteractionPattern,
    NavigationStep, OracleDecision, PageSnapshot, SnapshotElement,
};

const RELATED_PAGE_LIMIT: usize = 3;
const RECENT_NAVIGATION_LIMIT: usize = 5;
const RECENT_DECISION_LIMIT: usize = 3;
const SIMILAR_COMPONENT_LIMIT: usize = 3;
const PATTERN_RESULT_LIMIT: usize = 5;

/// Maximum sizes of the bounded collections. Tunable defaults, not
/// load-bearing constants.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreCaps {
    pub navigation: usize,
    pub snapshots: usize,
    pub decisions: usize,
    pub patterns: usize,
}

impl Default for StoreCaps {
    fn default() -> Self {
        Self {
            navigation: 20,
            snapshots: 10,
            decisions: 15,
            patterns: 25,
        }
    }
}

struct StoreState {
    session_id: SessionId,
    session_started: DateTime<Utc>,
    change_context: Option<ChangeContext>,
    navigation: VecDeque<NavigationStep>,
    snapshots: VecDeque<PageSnapshot>,
    decisions: VecDeque<OracleDecision>,
    routes: Vec<DiscoveredRoute>,
    patterns: VecDeque<InteractionPattern>,
}

impl StoreState {
    fn fresh() -> Self {
        Self {
            session_id: SessionId::new(),
            session_started: Utc::now(),
            change_context: None,
            navigation: VecDeque::new(),
            snapshots: VecDeque::new(),
            decisions: VecDeque::new(),
            routes: Vec::new(),
            patterns: VecDeque::new(),
        }
    }
}

/// Serialized form of the full store state. Every field round-trips; missing
/// fields default to their empty/initial value on import.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StoreExport {
    pub session_id: SessionId,
    pub session_started: Option<DateTime<Utc>>,
    pub change_context: Option<ChangeContext>,
    pub navigation: Vec<NavigationStep>,
    pub snapshots: Vec<PageSnapshot>,
    pub decisions: Vec<OracleDecision>,
    pub routes: Vec<DiscoveredRoute>,
    pub patterns: Vec<InteractionPattern>,
}

/// Session-scoped knowledge store.
///
/// Shared as `Arc<ContextStore>` between the route discovery engine and the
/// step executor. Mutations go through an interior write lock so the
/// eviction invariants hold even when a caller parallelizes exploration.
pub struct ContextStore {
    caps: StoreCaps,
    inner: RwLock<StoreState>,
}

impl Default for ContextStore {
    fn default() -> Self {
        Self::new(StoreCaps::default())
    }
}

impl ContextStore {
    pub fn new(caps: StoreCaps) -> Self {
        Self {
            caps,
            inner: RwLock::new(StoreState::fresh()),
        }
    }

    pub fn session_id(&self) -> SessionId {
        self.inner.read().session_id.clone()
    }

    pub fn change_context(&self) -> Option<ChangeContext> {
        self.inner.read().change_context.clone()
    }

    /// Store the change context for this session. Re-invocation replaces the
    /// previous context wholesale.
    pub fn set_change_context(&self, ctx: ChangeContext) {
        let mut state = self.inner.write();
        if state.change_context.is_some() {
            debug!(title = %ctx.title, "replacing change context");
        }
        state.change_context = Some(ctx);
    }

    /// Append a navigation step, filling in the session-relative offset.
    pub fn record_navigation(&self, mut step: NavigationStep) {
        let mut state = self.inner.write();
        step.session_offset_ms = step
            .timestamp
            .signed_duration_since(state.session_started)
            .num_milliseconds()
            .max(0) as u64;
        push_capped(&mut state.navigation, self.caps.navigation, step);
    }

    /// Capture a page snapshot. One entry per distinct url: re-capture
    /// overwrites the body and increments the visit count.
    pub fn record_snapshot(
        &self,
        url: impl Into<String>,
        title: impl Into<String>,
        elements: Vec<SnapshotElement>,
    ) {
        let url = url.into();
        let mut state = self.inner.write();
        if let Some(existing) = state.snapshots.iter_mut().find(|s| s.url == url) {
            existing.visit_count += 1;
            existing.title = title.into();
            existing.elements = elements;
            existing.timestamp = Utc::now();
            return;
        }
        let snapshot = PageSnapshot {
            url,
            title: title.into(),
            visit_count: 1,
            elements,
            timestamp: Utc::now(),
        };
        push_capped(&mut state.snapshots, self.caps.snapshots, snapshot);
    }

    pub fn record_decision(&self, decision: OracleDecision) {
        let mut state = self.inner.write();
        push_capped(&mut state.decisions, self.caps.decisions, decision);
    }

    /// Record a discovered route. Routes are keyed by `(name, url)`; a
    /// repeat discovery merges component associations into the existing
    /// entry, keeping the higher confidence per component.
    pub fn record_route(&self, route: DiscoveredRoute) {
        let mut state = self.inner.write();
        if let Some(existing) = state
            .routes
            .iter_mut()
            .find(|r| r.name == route.name && r.url == route.url)
        {
            for association in route.components {
                merge_association(&mut existing.components, association);
            }
            return;
        }
        state.routes.push(route);
    }

    pub fn record_pattern(&self, pattern: InteractionPattern) {
        let mut state = self.inner.write();
        push_capped(&mut state.patterns, self.caps.patterns, pattern);
    }

    pub fn routes(&self) -> Vec<DiscoveredRoute> {
        self.inner.read().routes.clone()
    }

    /// Build the filtered, size-bounded view consumers use to make
    /// decisions.
    pub fn build_decision_context(&self, query: &DecisionQuery) -> DecisionContext {
        let state = self.inner.read();
        let mut context = DecisionContext {
            change_context: state.change_context.clone(),
            ..DecisionContext::default()
        };

        if let Some(current_url) = query.current_url.as_deref() {
            context.current_page = state
                .snapshots
                .iter()
                .find(|s| s.url == current_url)
                .cloned();

            if let Some(origin) = origin_of(current_url) {
                context.related_pages = state
                    .snapshots
                    .iter()
                    .rev()
                    .filter(|s| {
                        s.url != current_url && origin_of(&s.url).as_deref() == Some(origin.as_str())
                    })
                    .take(RELATED_PAGE_LIMIT)
                    .cloned()
                    .collect();
            }
        }

        if query.include_history {
            context.recent_navigation = state
                .navigation
                .iter()
                .rev()
                .take(RECENT_NAVIGATION_LIMIT)
                .cloned()
                .collect();
        }

        context.recent_decisions = state
            .decisions
            .iter()
            .rev()
            .take(RECENT_DECISION_LIMIT)
            .cloned()
            .collect();

        if let Some(component) = query.component.as_deref() {
            context.known_route = state
                .routes
                .iter()
                .find(|route| {
                    route
                        .components
                        .iter()
                        .any(|a| a.component.eq_ignore_ascii_case(component))
                })
                .cloned();
            context.similar_components = similar_components(&state.routes, component);
        }

        context
    }

    /// Successful interaction patterns, newest first, optionally filtered by
    /// component type (bidirectional substring) and exact interaction type.
    pub fn find_successful_patterns(
        &self,
        component_type: Option<&str>,
        interaction_type: Option<&str>,
    ) -> Vec<InteractionPattern> {
        let state = self.inner.read();
        state
            .patterns
            .iter()
            .rev()
            .filter(|p| p.success)
            .filter(|p| match component_type {
                Some(hint) => contains_either(&p.component_type, hint),
                None => true,
            })
            .filter(|p| match interaction_type {
                Some(kind) => p.interaction_type == kind,
                None => true,
            })
            .take(PATTERN_RESULT_LIMIT)
            .cloned()
            .collect()
    }

    /// Serialize the full store state.
    pub fn export(&self) -> StoreExport {
        let state = self.inner.read();
        StoreExport {
            session_id: state.session_id.clone(),
            session_started: Some(state.session_started),
            change_context: state.change_context.clone(),
            navigation: state.navigation.iter().cloned().collect(),
            snapshots: state.snapshots.iter().cloned().collect(),
            decisions: state.decisions.iter().cloned().collect(),
            routes: state.routes.clone(),
            patterns: state.patterns.iter().cloned().collect(),
        }
    }

    /// Replace all in-memory state with the imported data. Collections that
    /// exceed the configured caps keep their most recent entries.
    pub fn import(&self, data: StoreExport) {
        let mut state = self.inner.write();
        state.session_id = data.session_id;
        state.session_started = data.session_started.unwrap_or_else(Utc::now);
        state.change_context = data.change_context;
        state.navigation = trim_to_cap(data.navigation, self.caps.navigation);
        state.snapshots = trim_to_cap(data.snapshots, self.caps.snapshots);
        state.decisions = trim_to_cap(data.decisions, self.caps.decisions);
        state.routes = data.routes;
        state.patterns = trim_to_cap(data.patterns, self.caps.patterns);
    }

    /// Reset every collection and restart the session clock. The change
    /// context is session identity, so it is cleared as well.
    pub fn clear(&self) {
        let mut state = self.inner.write();
        *state = StoreState::fresh();
    }
}

fn push_capped<T>(buffer: &mut VecDeque<T>, cap: usize, value: T) {
    while buffer.len() >= cap.max(1) {
        buffer.pop_front();
    }
    buffer.push_back(value);
}

fn trim_to_cap<T>(values: Vec<T>, cap: usize) -> VecDeque<T> {
    let mut buffer: VecDeque<T> = values.into();
    while buffer.len() > cap.max(1) {
        buffer.pop_front();
    }
    buffer
}

fn merge_association(existing: &mut Vec<ComponentAssociation>, incoming: ComponentAssociation) {
    if let Some(current) = existing
        .iter_mut()
        .find(|a| a.component.eq_ignore_ascii_case(&incoming.component))
    {
        if incoming.confidence > current.confidence {
            current.confidence = incoming.confidence;
        }
        return;
    }
    existing.push(incoming);
}

fn origin_of(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .map(|parsed| parsed.origin().ascii_serialization())
}

fn contains_either(a: &str, b: &str) -> bool {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    a.contains(&b) || b.contains(&a)
}

/// Deterministic similarity over all known component associations:
/// bidirectional substring containment, or any shared word token.
fn similar_components(routes: &[DiscoveredRoute], component: &str) -> Vec<String> {
    let target_tokens = tokenize(component);
    let mut found: Vec<String> = Vec::new();

    for route in routes {
        for association in &route.components {
            let candidate = association.component.as_str();
            if candidate.eq_ignore_ascii_case(component) {
                continue;
            }
            if found.iter().any(|f| f.eq_ignore_ascii_case(candidate)) {
                continue;
            }
            let token_overlap = tokenize(candidate)
                .iter()
                .any(|t| target_tokens.contains(t));
            if contains_either(candidate, component) || token_overlap {
                found.push(candidate.to_string());
                if found.len() == SIMILAR_COMPONENT_LIMIT {
                    return found;
                }
            }
        }
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DiscoveryMethod, NavigationOutcome};

    fn small_caps() -> StoreCaps {
        StoreCaps {
            navigation: 3,
            snapshots: 2,
            decisions: 3,
            patterns: 4,
        }
    }

    fn nav(action: &str) -> NavigationStep {
        NavigationStep::new(action, "target", NavigationOutcome::Success)
    }

    #[test]
    fn bounded_growth_keeps_most_recent_in_order() {
        let store = ContextStore::new(small_caps());
        for i in 0..7 {
            store.record_navigation(nav(&format!("step-{i}")));
        }

        let export = store.export();
        assert_eq!(export.navigation.len(), 3);
        let actions: Vec<&str> = export.navigation.iter().map(|s| s.action.as_str()).collect();
        assert_eq!(actions, vec!["step-4", "step-5", "step-6"]);
    }

    #[test]
    fn snapshot_recapture_preserves_visit_count() {
        let store = ContextStore::default();
        store.record_snapshot("https://app.test/reports", "Reports", Vec::new());
        store.record_snapshot(
            "https://app.test/reports",
            "Reports v2",
            vec![SnapshotElement {
                selector: "#chart".into(),
                tag: "div".into(),
                text: String::new(),
            }],
        );

        let export = store.export();
        assert_eq!(export.snapshots.len(), 1);
        assert_eq!(export.snapshots[0].visit_count, 2);
        assert_eq!(export.snapshots[0].title, "Reports v2");
        assert_eq!(export.snapshots[0].elements.len(), 1);
    }

    #[test]
    fn route_dedup_merges_component_associations() {
        let store = ContextStore::default();
        store.record_route(
            DiscoveredRoute::new("Reports", "/reports", DiscoveryMethod::Keyword)
                .with_component(ComponentAssociation::new("ReportTable", 0.5)),
        );
        store.record_route(
            DiscoveredRoute::new("Reports", "/reports", DiscoveryMethod::Oracle)
                .with_component(ComponentAssociation::new("ReportTable", 0.9))
                .with_component(ComponentAssociation::new("ReportChart", 0.7)),
        );

        let routes = store.routes();
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].components.len(), 2);
        let table = routes[0]
            .components
            .iter()
            .find(|a| a.component == "ReportTable")
            .unwrap();
        assert_eq!(table.confidence, 0.9);
        // First discovery wins the method tag.
        assert_eq!(routes[0].method, DiscoveryMethod::Keyword);
    }

    #[test]
    fn decision_context_filters_by_origin_and_component() {
        let store = ContextStore::default();
        store.record_snapshot("https://app.test/reports", "Reports", Vec::new());
        store.record_snapshot("https://app.test/settings", "Settings", Vec::new());
        store.record_snapshot("https://other.test/home", "Other", Vec::new());
        store.record_route(
            DiscoveredRoute::new("Reports", "/reports", DiscoveryMethod::Keyword)
                .with_component(ComponentAssociation::new("ReportChart", 0.8))
                .with_component(ComponentAssociation::new("ReportTable", 0.8))
                .with_component(ComponentAssociation::new("UserMenu", 0.4)),
        );

        let context = store.build_decision_context(&DecisionQuery {
            component: Some("ReportChart".into()),
            current_url: Some("https://app.test/reports".into()),
            include_history: true,
        });

        assert_eq!(
            context.current_page.as_ref().map(|p| p.url.as_str()),
            Some("https://app.test/reports")
        );
        assert_eq!(context.related_pages.len(), 1);
        assert_eq!(context.related_pages[0].url, "https://app.test/settings");
        assert!(context.known_route.is_some());
        // ReportTable shares the "report" token; UserMenu does not match.
        assert_eq!(context.similar_components, vec!["ReportTable".to_string()]);
    }

    #[test]
    fn successful_pattern_lookup_is_newest_first_and_capped() {
        let store = ContextStore::default();
        for i in 0..8 {
            store.record_pattern(InteractionPattern::new(
                format!("cat-{i}"),
                i % 2 == 0,
                "button",
                "click",
            ));
        }
        store.record_pattern(InteractionPattern::new("nav", true, "link", "click"));

        let hits = store.find_successful_patterns(Some("button"), Some("click"));
        assert!(hits.len() <= 5);
        assert!(hits.iter().all(|p| p.success && p.component_type == "button"));
        assert_eq!(hits[0].category, "cat-6");
    }

    #[test]
    fn export_import_round_trip() {
        let store = ContextStore::default();
        store.set_change_context(ChangeContext::new("Fix invoices", "fix/invoices"));
        store.record_navigation(nav("navigate"));
        store.record_snapshot("https://app.test/", "Home", Vec::new());
        store.record_decision(OracleDecision::new(
            "InvoiceView",
            serde_json::json!({"should_act": true}),
            "navigate",
            0.8,
        ));
        store.record_route(DiscoveredRoute::new(
            "Invoices",
            "/invoices",
            DiscoveryMethod::Oracle,
        ));
        store.record_pattern(InteractionPattern::new("nav", true, "link", "click"));

        let exported = store.export();
        let json = serde_json::to_string(&exported).unwrap();
        let parsed: StoreExport = serde_json::from_str(&json).unwrap();

        let restored = ContextStore::default();
        restored.import(parsed);
        let round = restored.export();

        assert_eq!(round.session_id, exported.session_id);
        assert_eq!(round.change_context, exported.change_context);
        assert_eq!(round.navigation.len(), 1);
        assert_eq!(round.snapshots.len(), 1);
        assert_eq!(round.decisions.len(), 1);
        assert_eq!(round.routes.len(), 1);
        assert_eq!(round.patterns.len(), 1);
    }

    #[test]
    fn import_defaults_missing_fields() {
        let store = ContextStore::default();
        let parsed: StoreExport = serde_json::from_str("{}").unwrap();
        store.import(parsed);

        let export = store.export();
        assert!(export.change_context.is_none());
        assert!(export.navigation.is_empty());
        assert!(export.session_started.is_some());
    }

    #[test]
    fn clear_resets_everything_including_context() {
        let store = ContextStore::default();
        let before = store.session_id();
        store.set_change_context(ChangeContext::new("t", "b"));
        store.record_navigation(nav("navigate"));

        store.clear();

        assert!(store.change_context().is_none());
        assert!(store.export().navigation.is_empty());
        assert_ne!(store.session_id(), before);
    }
}
