//! Decision oracle gateway
//!
//! Translates exploration questions plus accumulated session knowledge into
//! a single request against an external reasoning service, then recovers a
//! structured decision object even from degraded output (markdown fences,
//! truncated JSON, prose around the payload).

pub mod client;
pub mod errors;
pub mod mock;
pub mod prompt;
pub mod recover;
pub mod types;

pub use client::{HttpOracle, OracleConfig};
pub use errors::OracleError;
pub use mock::MockOracle;
pub use types::{DecisionOracle, DecisionPayload, OracleResponse, QueryOptions, RankedAlternative};
