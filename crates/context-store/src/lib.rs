//! Session-scoped exploration knowledge store
//!
//! Single source of truth for everything learned while exploring one
//! application build: navigation history, page snapshots, oracle decisions,
//! discovered routes and interaction outcomes. All list collections are
//! bounded with oldest-first eviction so one long session cannot grow
//! without limit.

pub mod store;
pub mod types;

pub use store::{ContextStore, StoreCaps, StoreExport};
pub use types::{
    ComponentAssociation, DecisionContext, DecisionQuery, DiscoveredRoute, DiscoveryMethod,
    InteractionPattern, NavigationOutcome, NavigationStep, OracleDecision, PageSnapshot,
    SnapshotElement,
};
