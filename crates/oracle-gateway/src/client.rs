//! HTTP oracle client
//!
//! Speaks the chat-completions wire shape: one user message carrying the
//! prompt, JSON response body with a `choices[0].message.content` string.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::errors::OracleError;
use crate::recover::recover_structured;
use crate::types::{DecisionOracle, OracleResponse, QueryOptions};

/// Gateway configuration. Thresholds and limits are tunable defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    pub api_base: String,
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_ms: u64,
    pub probe_timeout_ms: u64,
    /// Decisions below this confidence must not be acted on.
    pub confidence_threshold: f64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:11434/v1".to_string(),
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            temperature: 0.2,
            max_tokens: 1024,
            timeout_ms: 30_000,
            probe_timeout_ms: 5_000,
            confidence_threshold: 0.6,
        }
    }
}

/// Reqwest-backed oracle gateway.
pub struct HttpOracle {
    client: Client,
    config: OracleConfig,
}

impl HttpOracle {
    pub fn new(config: OracleConfig) -> Result<Self, OracleError> {
        if config.api_base.trim().is_empty() {
            return Err(OracleError::InvalidConfig("api_base cannot be empty".into()));
        }
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|err| OracleError::InvalidConfig(format!("failed to build HTTP client: {err}")))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &OracleConfig {
        &self.config
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.api_base.trim_end_matches('/')
        )
    }

    fn models_url(&self) -> String {
        format!("{}/models", self.config.api_base.trim_end_matches('/'))
    }
}

#[async_trait]
impl DecisionOracle for HttpOracle {
    async fn query(
        &self,
        prompt: &str,
        options: &QueryOptions,
    ) -> Result<OracleResponse, OracleError> {
        let body = ChatCompletionRequest {
            model: self.config.model.clone(),
            temperature: options.temperature.unwrap_or(self.config.temperature),
            max_tokens: options.max_tokens.unwrap_or(self.config.max_tokens),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        let mut request = self.client.post(self.completions_url()).json(&body);
        if let Some(key) = self.config.api_key.as_deref() {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|err| {
            if err.is_timeout() {
                OracleError::Timeout(self.config.timeout_ms)
            } else if err.is_connect() {
                OracleError::unavailable(err.to_string())
            } else {
                OracleError::transport(err.to_string())
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "<response unavailable>".to_string());
            return Err(OracleError::transport(format!(
                "oracle returned {status}: {text}"
            )));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|err| OracleError::malformed(format!("response body invalid: {err}")))?;

        let content = completion
            .choices
            .first()
            .map(|choice| choice.message.content.clone())
            .ok_or_else(|| OracleError::malformed("response missing choices"))?;

        match recover_structured(&content) {
            Some(recovered) => {
                if recovered.partial {
                    warn!("oracle payload only partially recovered");
                }
                Ok(OracleResponse::recovered(
                    recovered.value,
                    content,
                    recovered.partial,
                ))
            }
            None => {
                debug!("oracle returned no recoverable structure");
                Ok(OracleResponse::failure(
                    "no structured object recovered from response",
                    content,
                ))
            }
        }
    }

    async fn is_available(&self) -> bool {
        let probe = self
            .client
            .get(self.models_url())
            .timeout(Duration::from_millis(self.config.probe_timeout_ms));
        match probe.send().await {
            Ok(response) => response.status().is_success(),
            Err(err) => {
                debug!(error = %err, "oracle liveness probe failed");
                false
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    temperature: f32,
    max_tokens: u32,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatCompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChoice {
    message: ChatCompletionMessage,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionMessage {
    #[serde(default)]
    content: String,
}
