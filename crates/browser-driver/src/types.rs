//! Driver-facing value types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle to an interactive element on the current page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ElementHandle {
    /// Selector that resolves this element again.
    pub selector: String,

    pub tag: String,

    /// Visible text, possibly truncated by the driver.
    #[serde(default)]
    pub text: String,

    /// Link target for anchor-like elements.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

impl ElementHandle {
    pub fn new(selector: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            tag: tag.into(),
            text: String::new(),
            href: None,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_href(mut self, href: impl Into<String>) -> Self {
        self.href = Some(href.into());
        self
    }
}

/// Options for a navigation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigateOptions {
    pub timeout_ms: u64,
}

impl Default for NavigateOptions {
    fn default() -> Self {
        Self { timeout_ms: 30_000 }
    }
}

/// Element state a wait can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitState {
    Attached,
    Visible,
    Hidden,
}

/// Conditions the driver can wait on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum WaitCondition {
    Selector { selector: String, state: WaitState },
    UrlContains(String),
    TitleContains(String),
}

impl fmt::Display for WaitCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaitCondition::Selector { selector, state } => {
                write!(f, "selector {selector} {state:?}")
            }
            WaitCondition::UrlContains(fragment) => write!(f, "url contains {fragment}"),
            WaitCondition::TitleContains(fragment) => write!(f, "title contains {fragment}"),
        }
    }
}

/// One console message drained from the page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleEntry {
    pub level: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// One network request observed by the driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkEntry {
    pub method: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default)]
    pub failed: bool,
}
