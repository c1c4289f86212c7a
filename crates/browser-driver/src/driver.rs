//! The driver trait

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::DriverError;
use crate::types::{ConsoleEntry, ElementHandle, NavigateOptions, NetworkEntry, WaitCondition};

/// Abstract browser capability set consumed by the step executor.
///
/// Implementations must be safe to share behind an `Arc`; the executor
/// issues calls strictly sequentially.
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    async fn navigate(&self, url: &str, options: &NavigateOptions) -> Result<(), DriverError>;

    async fn current_url(&self) -> Result<String, DriverError>;

    async fn page_title(&self) -> Result<String, DriverError>;

    /// Resolve a selector. An absent element is `Ok(None)`, not an error.
    async fn find(&self, selector: &str) -> Result<Option<ElementHandle>, DriverError>;

    async fn click(&self, element: &ElementHandle) -> Result<(), DriverError>;

    async fn type_text(&self, element: &ElementHandle, text: &str) -> Result<(), DriverError>;

    async fn select_option(&self, element: &ElementHandle, value: &str)
        -> Result<(), DriverError>;

    async fn press_key(&self, key: &str) -> Result<(), DriverError>;

    async fn hover(&self, element: &ElementHandle) -> Result<(), DriverError>;

    async fn scroll_by(&self, dx: i64, dy: i64) -> Result<(), DriverError>;

    async fn resize(&self, width: u32, height: u32) -> Result<(), DriverError>;

    async fn wait_for(&self, condition: &WaitCondition, timeout_ms: u64)
        -> Result<(), DriverError>;

    async fn screenshot(&self) -> Result<Vec<u8>, DriverError>;

    async fn evaluate(&self, script: &str) -> Result<Value, DriverError>;

    /// Interactive elements currently visible on the page.
    async fn interactive_elements(&self) -> Result<Vec<ElementHandle>, DriverError>;

    /// Drain console messages collected since the last call.
    async fn console_logs(&self) -> Result<Vec<ConsoleEntry>, DriverError>;

    /// Drain network activity collected since the last call.
    async fn network_log(&self) -> Result<Vec<NetworkEntry>, DriverError>;

    /// Current performance metrics as reported by the browser.
    async fn performance_snapshot(&self) -> Result<Value, DriverError>;

    /// Serialized DOM of the current page.
    async fn dom_snapshot(&self) -> Result<String, DriverError>;
}
