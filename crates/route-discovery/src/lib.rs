//! Route discovery and relevance scoring
//!
//! Ranks candidate navigation targets against the change context driving a
//! session. The oracle provides the primary ranking; a deterministic
//! keyword-overlap scorer takes over whenever the oracle is unavailable,
//! errors out or returns nothing usable.

pub mod discovery;
pub mod infer;
pub mod keywords;

pub use discovery::{RankedRoute, RouteCandidate, RouteDiscovery, MAX_EXPLORATION_ROUTES};
pub use infer::infer_route;
pub use keywords::{extract_keywords, relevance_score, ScoringConfig};
