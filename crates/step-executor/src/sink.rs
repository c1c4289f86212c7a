//! Artifact sink seam
//!
//! The executor emits captured artifacts; persistence lives outside this
//! core. Sink failures are logged and never affect step status.

use async_trait::async_trait;
use changescout_core_types::StepId;
use parking_lot::Mutex;
use serde_json::Value;
use thiserror::Error;

use crate::types::ArtifactKind;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("artifact sink failure: {0}")]
    Emit(String),
}

/// Receives `{step, artifact kind, payload}` tuples after each capture.
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    async fn emit(
        &self,
        step_id: &StepId,
        kind: ArtifactKind,
        payload: &Value,
    ) -> Result<(), SinkError>;
}

/// One artifact received by [`MemorySink`].
#[derive(Debug, Clone)]
pub struct EmittedArtifact {
    pub step_id: StepId,
    pub kind: ArtifactKind,
    pub payload: Value,
}

/// Collecting sink for tests and in-process consumers.
#[derive(Default)]
pub struct MemorySink {
    entries: Mutex<Vec<EmittedArtifact>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Vec<EmittedArtifact> {
        self.entries.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[async_trait]
impl ArtifactSink for MemorySink {
    async fn emit(
        &self,
        step_id: &StepId,
        kind: ArtifactKind,
        payload: &Value,
    ) -> Result<(), SinkError> {
        self.entries.lock().push(EmittedArtifact {
            step_id: step_id.clone(),
            kind,
            payload: payload.clone(),
        });
        Ok(())
    }
}

/// Sink that discards everything.
#[derive(Default)]
pub struct NullSink;

#[async_trait]
impl ArtifactSink for NullSink {
    async fn emit(
        &self,
        _step_id: &StepId,
        _kind: ArtifactKind,
        _payload: &Value,
    ) -> Result<(), SinkError> {
        Ok(())
    }
}
