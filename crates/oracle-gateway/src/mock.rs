//! Deterministic oracle used for tests and offline development.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::errors::OracleError;
use crate::recover::recover_structured;
use crate::types::{DecisionOracle, DecisionPayload, OracleResponse, QueryOptions};

/// Scripted oracle: answers queries from a FIFO queue of prepared outcomes.
/// An exhausted queue behaves like an unreachable service.
pub struct MockOracle {
    responses: Mutex<VecDeque<Result<OracleResponse, OracleError>>>,
    available: bool,
    queries: AtomicU64,
}

impl Default for MockOracle {
    fn default() -> Self {
        Self::new()
    }
}

impl MockOracle {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            available: true,
            queries: AtomicU64::new(0),
        }
    }

    /// An oracle that reports itself down and fails every query.
    pub fn unavailable() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            available: false,
            queries: AtomicU64::new(0),
        }
    }

    /// Queue a fully-formed response.
    pub fn push_response(&self, response: OracleResponse) {
        self.responses.lock().push_back(Ok(response));
    }

    /// Queue a decision payload as a successful structured response.
    pub fn push_decision(&self, decision: &DecisionPayload) {
        let value = serde_json::to_value(decision).expect("decision serializes");
        let raw = value.to_string();
        self.push_response(OracleResponse::recovered(value, raw, false));
    }

    /// Queue an arbitrary JSON value as a successful structured response.
    pub fn push_value(&self, value: Value) {
        let raw = value.to_string();
        self.push_response(OracleResponse::recovered(value, raw, false));
    }

    /// Queue raw model text; it is run through the same recovery ladder the
    /// HTTP client uses.
    pub fn push_raw(&self, text: impl Into<String>) {
        let text = text.into();
        let response = match recover_structured(&text) {
            Some(recovered) => {
                OracleResponse::recovered(recovered.value, text, recovered.partial)
            }
            None => OracleResponse::failure("no structured object recovered from response", text),
        };
        self.push_response(response);
    }

    /// Queue a typed failure.
    pub fn push_error(&self, error: OracleError) {
        self.responses.lock().push_back(Err(error));
    }

    /// How many queries have been issued against this mock.
    pub fn query_count(&self) -> u64 {
        self.queries.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl DecisionOracle for MockOracle {
    async fn query(
        &self,
        _prompt: &str,
        _options: &QueryOptions,
    ) -> Result<OracleResponse, OracleError> {
        self.queries.fetch_add(1, Ordering::Relaxed);
        if !self.available {
            return Err(OracleError::unavailable("mock oracle configured as down"));
        }
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(OracleError::unavailable("mock oracle response queue empty")))
    }

    async fn is_available(&self) -> bool {
        self.available
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_responses_drain_in_order() {
        let oracle = MockOracle::new();
        oracle.push_raw("{\"confidence\": 0.9}");
        oracle.push_error(OracleError::Timeout(1000));

        let first = oracle.query("q1", &QueryOptions::default()).await.unwrap();
        assert!(first.success);
        assert!(matches!(
            oracle.query("q2", &QueryOptions::default()).await,
            Err(OracleError::Timeout(1000))
        ));
        assert!(matches!(
            oracle.query("q3", &QueryOptions::default()).await,
            Err(OracleError::Unavailable(_))
        ));
        assert_eq!(oracle.query_count(), 3);
    }

    #[tokio::test]
    async fn unavailable_mock_fails_probes_and_queries() {
        let oracle = MockOracle::unavailable();
        assert!(!oracle.is_available().await);
        assert!(oracle.query("q", &QueryOptions::default()).await.is_err());
    }
}
