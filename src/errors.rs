//! Top-level error type

use browser_driver::DriverError;
use oracle_gateway::OracleError;
use thiserror::Error;

/// Errors surfaced by the orchestration layer. Step-level problems never
/// reach this type; they are contained in step results. What remains is
/// configuration trouble and the unrecoverable pre-plan failures.
#[derive(Debug, Error)]
pub enum ScoutError {
    #[error("configuration error: {0}")]
    Config(String),

    /// Entry navigation or driver startup failed before any step ran.
    #[error(transparent)]
    Driver(#[from] DriverError),

    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error("exploration session failed: {0}")]
    Session(String),
}

impl ScoutError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}
