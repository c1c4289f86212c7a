//! Driver error taxonomy

use thiserror::Error;

/// Errors surfaced by a browser driver implementation.
///
/// `find` reports an absent element as `Ok(None)`, not as an error; these
/// variants cover navigation/wait timeouts and hard driver faults.
#[derive(Debug, Error, Clone)]
pub enum DriverError {
    #[error("navigation to {url} timed out after {timeout_ms}ms")]
    NavigationTimeout { url: String, timeout_ms: u64 },

    #[error("wait condition not met within {timeout_ms}ms: {condition}")]
    WaitTimeout { condition: String, timeout_ms: u64 },

    /// Protocol or transport fault between driver and browser.
    #[error("driver protocol error: {0}")]
    Protocol(String),

    /// Script evaluation failed inside the page.
    #[error("script evaluation failed: {0}")]
    Evaluate(String),

    /// The browser could not be started or attached to at all. Aborts the
    /// run before any step executes.
    #[error("driver initialization failed: {0}")]
    Init(String),
}

impl DriverError {
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }
}
