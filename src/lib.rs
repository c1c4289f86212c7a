//! Changescout - change-aware web application exploration
//!
//! Given a description of a recent code change (title, branch, changed
//! files, inferred affected components), changescout ranks the parts of a
//! running web application most likely affected and executes a bounded
//! navigate/discover/test plan against an abstract browser driver. The
//! executed trace (step results, telemetry, accumulated session knowledge)
//! is handed to downstream issue detectors.
//!
//! The workspace splits into a session-scoped knowledge store
//! ([`context_store`]), the decision oracle gateway ([`oracle_gateway`]),
//! relevance scoring and route discovery ([`route_discovery`]) and the step
//! executor ([`step_executor`]); this crate wires them into one
//! [`ExplorationSession`].

pub mod config;
pub mod errors;
pub mod session;
pub mod telemetry;

pub use config::ExploreConfig;
pub use errors::ScoutError;
pub use session::{ExplorationReport, ExplorationSession};
pub use telemetry::init_tracing;

pub use browser_driver::{BrowserDriver, DriverError, ElementHandle, NavigateOptions};
pub use changescout_core_types::{
    ChangeContext, ChangedFile, ComponentRef, FileStatus, SessionId,
};
pub use context_store::{ContextStore, StoreCaps, StoreExport};
pub use oracle_gateway::{
    DecisionOracle, DecisionPayload, HttpOracle, MockOracle, OracleConfig, OracleError,
};
pub use route_discovery::{RankedRoute, RouteCandidate, RouteDiscovery, ScoringConfig};
pub use step_executor::{
    ArtifactKind, ArtifactSink, ExecutionReport, ExecutorConfig, ExplorationPlan, MemorySink,
    RunSummary, Step, StepAction, StepExecutor, StepResult, StepStatus,
};
