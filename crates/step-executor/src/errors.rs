//! Executor error types

use browser_driver::DriverError;
use thiserror::Error;

/// Errors raised while executing a single step. They are converted into
/// [`crate::StepResult`] status/error fields at the step boundary and never
/// unwind past the executor.
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error(transparent)]
    Driver(#[from] DriverError),

    #[error("step timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("step action '{action}' requires parameter '{param}'")]
    MissingParam {
        action: &'static str,
        param: &'static str,
    },

    #[error("internal executor error: {0}")]
    Internal(String),
}

impl ExecutorError {
    pub fn missing_param(action: &'static str, param: &'static str) -> Self {
        Self::MissingParam { action, param }
    }
}
