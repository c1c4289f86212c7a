//! Oracle request/response types

use async_trait::async_trait;
use changescout_core_types::clamp_confidence;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::OracleError;

/// Per-query tuning knobs. Unset fields fall back to the gateway
/// configuration defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl QueryOptions {
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Result of one oracle query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleResponse {
    /// Whether a structured payload was recovered at all.
    pub success: bool,

    /// The recovered structured object, when present.
    pub data: Option<Value>,

    /// Raw text the service returned, kept for diagnostics.
    pub raw_response: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// True when only a fragment of the payload could be extracted.
    #[serde(default)]
    pub partial: bool,
}

impl OracleResponse {
    pub fn recovered(data: Value, raw: impl Into<String>, partial: bool) -> Self {
        Self {
            success: true,
            data: Some(data),
            raw_response: raw.into(),
            error: None,
            partial,
        }
    }

    pub fn failure(error: impl Into<String>, raw: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            raw_response: raw.into(),
            error: Some(error.into()),
            partial: false,
        }
    }

    /// Parse the recovered payload into the closed decision type.
    pub fn decision(&self) -> Option<DecisionPayload> {
        self.data
            .as_ref()
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }
}

/// Closed decision payload callers pattern-match on instead of probing raw
/// JSON for optional keys. Unknown source keys are tolerated; missing ones
/// default to inert values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DecisionPayload {
    #[serde(default, alias = "shouldAct")]
    pub should_act: bool,

    /// Identifier or selector of the element/url to act on.
    #[serde(default, alias = "selector", alias = "targetRef", alias = "target_ref")]
    pub target: String,

    #[serde(default)]
    pub reasoning: String,

    #[serde(default)]
    pub confidence: f64,

    #[serde(default)]
    pub alternatives: Vec<RankedAlternative>,

    #[serde(default, alias = "nextSteps")]
    pub next_steps: Vec<String>,
}

impl DecisionPayload {
    /// Confidence gate; decisions below the threshold must not be acted on.
    pub fn meets(&self, threshold: f64) -> bool {
        clamp_confidence(self.confidence) >= threshold
    }
}

/// Lower-ranked option the oracle also considered.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RankedAlternative {
    #[serde(default)]
    pub target: String,
    #[serde(default)]
    pub score: f64,
}

/// Seam between exploration logic and the external reasoning service.
#[async_trait]
pub trait DecisionOracle: Send + Sync {
    /// Ask the oracle one question. Applies a bounded timeout; transport
    /// failures surface as typed errors, degraded output as a recovered or
    /// failed [`OracleResponse`].
    async fn query(
        &self,
        prompt: &str,
        options: &QueryOptions,
    ) -> Result<OracleResponse, OracleError>;

    /// Lightweight liveness probe used to gate oracle-backed paths.
    async fn is_available(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_payload_tolerates_aliases_and_defaults() {
        let value = serde_json::json!({
            "shouldAct": true,
            "selector": "#reports-link",
            "confidence": 0.82,
            "unknown_key": [1, 2, 3],
        });
        let payload: DecisionPayload = serde_json::from_value(value).unwrap();
        assert!(payload.should_act);
        assert_eq!(payload.target, "#reports-link");
        assert!(payload.meets(0.6));
        assert!(payload.reasoning.is_empty());
        assert!(payload.next_steps.is_empty());
    }

    #[test]
    fn confidence_gate_rejects_below_threshold() {
        let payload = DecisionPayload {
            should_act: true,
            confidence: 0.4,
            ..DecisionPayload::default()
        };
        assert!(!payload.meets(0.6));
        assert!(payload.meets(0.4));
    }
}
