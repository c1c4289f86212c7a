use std::fmt;

use thiserror::Error;
use uuid::Uuid;

mod text;

pub use text::tokenize;

/// Shared error type for workspace crates that need a plain message error.
#[derive(Debug, Error, Clone)]
pub enum CoreError {
    #[error("{message}")]
    Message { message: String },
}

impl CoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct StepId(pub String);

impl StepId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for StepId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct PlanId(pub String);

impl PlanId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for PlanId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Status of a file within a change context.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-full", serde(rename_all = "snake_case"))]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum FileStatus {
    Added,
    Modified,
    Removed,
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FileStatus::Added => "added",
            FileStatus::Modified => "modified",
            FileStatus::Removed => "removed",
        };
        write!(f, "{label}")
    }
}

/// Single file entry in a change context.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct ChangedFile {
    pub filename: String,
    pub status: FileStatus,
    /// Added plus removed line count reported by the change source.
    pub change_count: u32,
}

impl ChangedFile {
    pub fn new(filename: impl Into<String>, status: FileStatus, change_count: u32) -> Self {
        Self {
            filename: filename.into(),
            status,
            change_count,
        }
    }
}

/// UI component inferred to be affected by a change.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct ComponentRef {
    pub name: String,
    pub file: String,
}

impl ComponentRef {
    pub fn new(name: impl Into<String>, file: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            file: file.into(),
        }
    }
}

/// Description of a code change driving one exploration session.
///
/// Immutable once handed to the store; built once per session from the
/// external change source (PR metadata, branch diff, ...).
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChangeContext {
    pub title: String,
    pub branch: String,
    #[cfg_attr(feature = "serde-full", serde(default))]
    pub files: Vec<ChangedFile>,
    #[cfg_attr(feature = "serde-full", serde(default))]
    pub components: Vec<ComponentRef>,
}

impl ChangeContext {
    pub fn new(title: impl Into<String>, branch: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            branch: branch.into(),
            files: Vec::new(),
            components: Vec::new(),
        }
    }

    /// Add a changed file entry.
    pub fn with_file(mut self, file: ChangedFile) -> Self {
        self.files.push(file);
        self
    }

    /// Add an affected component.
    pub fn with_component(mut self, component: ComponentRef) -> Self {
        self.components.push(component);
        self
    }
}

/// Clamp a confidence value into the `[0, 1]` range.
pub fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        assert_ne!(SessionId::new(), SessionId::new());
        assert_ne!(StepId::new(), StepId::new());
    }

    #[test]
    fn confidence_is_clamped() {
        assert_eq!(clamp_confidence(1.4), 1.0);
        assert_eq!(clamp_confidence(-0.2), 0.0);
        assert_eq!(clamp_confidence(f64::NAN), 0.0);
        assert_eq!(clamp_confidence(0.65), 0.65);
    }

    #[test]
    fn change_context_builder() {
        let ctx = ChangeContext::new("Fix invoice totals", "fix/invoice-totals")
            .with_file(ChangedFile::new(
                "src/billing/invoice.ts",
                FileStatus::Modified,
                42,
            ))
            .with_component(ComponentRef::new("InvoiceView", "src/billing/invoice.ts"));

        assert_eq!(ctx.files.len(), 1);
        assert_eq!(ctx.components.len(), 1);
        assert_eq!(ctx.files[0].status, FileStatus::Modified);
    }
}
