//! Oracle gateway error types

use thiserror::Error;

/// Errors emitted by the oracle gateway. All of them are non-fatal from the
/// plan's point of view: callers fall back to deterministic heuristics.
#[derive(Debug, Error, Clone)]
pub enum OracleError {
    /// The reasoning service cannot be reached at all.
    #[error("oracle unavailable: {0}")]
    Unavailable(String),

    /// The request exceeded its bounded timeout.
    #[error("oracle request timed out after {0}ms")]
    Timeout(u64),

    /// Transport-level failure (connection, TLS, non-success status).
    #[error("oracle transport error: {0}")]
    Transport(String),

    /// The response carried no recoverable structured payload.
    #[error("oracle response malformed: {0}")]
    Malformed(String),

    /// The gateway itself was misconfigured.
    #[error("invalid oracle configuration: {0}")]
    InvalidConfig(String),
}

impl OracleError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }
}
