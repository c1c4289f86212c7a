//! End-to-end session flow against mock driver and oracle.

use std::sync::Arc;

use async_trait::async_trait;
use changescout::{
    ChangeContext, ChangedFile, ComponentRef, ExploreConfig, ExplorationSession, FileStatus,
    MemorySink, MockOracle, StepStatus,
};
use browser_driver::{
    BrowserDriver, ConsoleEntry, DriverError, ElementHandle, NavigateOptions, NetworkEntry,
    WaitCondition,
};
use chrono::Utc;
use parking_lot::Mutex;
use serde_json::{json, Value};

struct FakeApp {
    url: Mutex<String>,
    calls: Mutex<Vec<String>>,
}

impl FakeApp {
    fn new() -> Self {
        Self {
            url: Mutex::new("about:blank".to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl BrowserDriver for FakeApp {
    async fn navigate(&self, url: &str, _options: &NavigateOptions) -> Result<(), DriverError> {
        self.calls.lock().push(format!("navigate:{url}"));
        *self.url.lock() = url.to_string();
        Ok(())
    }

    async fn current_url(&self) -> Result<String, DriverError> {
        Ok(self.url.lock().clone())
    }

    async fn page_title(&self) -> Result<String, DriverError> {
        Ok("Fake App".to_string())
    }

    async fn find(&self, selector: &str) -> Result<Option<ElementHandle>, DriverError> {
        Ok(self
            .interactive_elements()
            .await?
            .into_iter()
            .find(|element| element.selector == selector))
    }

    async fn click(&self, element: &ElementHandle) -> Result<(), DriverError> {
        self.calls.lock().push(format!("click:{}", element.selector));
        Ok(())
    }

    async fn type_text(&self, element: &ElementHandle, text: &str) -> Result<(), DriverError> {
        self.calls
            .lock()
            .push(format!("type:{}:{}", element.selector, text));
        Ok(())
    }

    async fn select_option(&self, element: &ElementHandle, value: &str) -> Result<(), DriverError> {
        self.calls
            .lock()
            .push(format!("select:{}:{}", element.selector, value));
        Ok(())
    }

    async fn press_key(&self, key: &str) -> Result<(), DriverError> {
        self.calls.lock().push(format!("key:{key}"));
        Ok(())
    }

    async fn hover(&self, element: &ElementHandle) -> Result<(), DriverError> {
        self.calls.lock().push(format!("hover:{}", element.selector));
        Ok(())
    }

    async fn scroll_by(&self, _dx: i64, _dy: i64) -> Result<(), DriverError> {
        Ok(())
    }

    async fn resize(&self, _width: u32, _height: u32) -> Result<(), DriverError> {
        Ok(())
    }

    async fn wait_for(
        &self,
        _condition: &WaitCondition,
        _timeout_ms: u64,
    ) -> Result<(), DriverError> {
        Ok(())
    }

    async fn screenshot(&self) -> Result<Vec<u8>, DriverError> {
        Ok(vec![1, 2, 3, 4])
    }

    async fn evaluate(&self, _script: &str) -> Result<Value, DriverError> {
        Ok(Value::Null)
    }

    async fn interactive_elements(&self) -> Result<Vec<ElementHandle>, DriverError> {
        Ok(vec![
            ElementHandle::new("#nav-invoices", "a")
                .with_text("Invoices")
                .with_href("/invoices"),
            ElementHandle::new("#nav-billing", "a")
                .with_text("Billing settings")
                .with_href("/billing"),
            ElementHandle::new("#nav-dashboard", "a")
                .with_text("Dashboard")
                .with_href("/dashboard"),
            ElementHandle::new("#top", "a").with_text("Back to top").with_href("#main"),
            ElementHandle::new("#invoice-table", "table").with_text("Invoice rows"),
        ])
    }

    async fn console_logs(&self) -> Result<Vec<ConsoleEntry>, DriverError> {
        Ok(vec![ConsoleEntry {
            level: "warn".to_string(),
            text: "deprecated API".to_string(),
            timestamp: Utc::now(),
        }])
    }

    async fn network_log(&self) -> Result<Vec<NetworkEntry>, DriverError> {
        Ok(Vec::new())
    }

    async fn performance_snapshot(&self) -> Result<Value, DriverError> {
        Ok(json!({ "dom_content_loaded_ms": 85 }))
    }

    async fn dom_snapshot(&self) -> Result<String, DriverError> {
        Ok("<html><body>fake</body></html>".to_string())
    }
}

fn invoice_change() -> ChangeContext {
    ChangeContext::new("Fix invoice rounding in billing view", "fix/invoice-rounding")
        .with_file(ChangedFile::new(
            "src/billing/InvoiceView.tsx",
            FileStatus::Modified,
            64,
        ))
        .with_component(ComponentRef::new("InvoiceView", "src/billing/InvoiceView.tsx"))
}

fn fast_config() -> ExploreConfig {
    let mut config = ExploreConfig::default();
    config.base_url = "https://app.test/".to_string();
    config.executor.inter_step_pause_ms = 0;
    config
}

#[tokio::test]
async fn offline_session_explores_keyword_matched_routes() {
    let driver = Arc::new(FakeApp::new());
    let oracle = Arc::new(MockOracle::unavailable());
    let sink = Arc::new(MemorySink::new());
    let session = ExplorationSession::new(driver.clone(), oracle, fast_config())
        .with_sink(sink.clone());

    let report = session.run(invoice_change()).await.expect("session runs");

    // Invoices and Billing match the change keywords; Dashboard does not,
    // and the fragment link is never a candidate.
    assert_eq!(report.routes.len(), 2);
    assert!(report.routes.iter().all(|r| r.url != "/dashboard"));

    // 1 capture step + 2 routes x (navigate + discover + test).
    assert_eq!(report.summary.total, 7);
    assert_eq!(report.summary.failed, 0);
    assert!(report
        .results
        .iter()
        .all(|r| r.status != StepStatus::Failed));

    let calls = driver.calls();
    assert!(calls.iter().any(|c| c == "navigate:/invoices"));
    assert!(calls.iter().any(|c| c == "navigate:/billing"));

    // The store accumulated the trace and round-trips through the report.
    assert!(report.store.change_context.is_some());
    assert!(!report.store.navigation.is_empty());
    assert!(!report.store.snapshots.is_empty());
    assert!(report.store.routes.len() >= 2);

    // Screenshot plus console/network artifacts were emitted to the sink.
    assert!(!sink.is_empty());
}

#[tokio::test]
async fn oracle_guided_session_records_decisions() {
    let driver = Arc::new(FakeApp::new());
    let oracle = Arc::new(MockOracle::new());
    // Ranking answer for route discovery.
    oracle.push_value(json!({
        "rankings": [{ "index": 0, "score": 0.95, "reason": "invoice list page" }]
    }));
    // Discovery decision for the selected route.
    oracle.push_value(json!({
        "should_act": true,
        "target": "#invoice-table",
        "confidence": 0.9,
        "reasoning": "table renders the changed component",
    }));

    let session = ExplorationSession::new(driver.clone(), oracle, fast_config());
    let report = session.run(invoice_change()).await.expect("session runs");

    assert_eq!(report.routes.len(), 1);
    assert_eq!(report.routes[0].url, "/invoices");
    assert_eq!(report.summary.failed, 0);

    // The discovery decision was recorded into the session store.
    assert!(!report.store.decisions.is_empty());
    assert!(report
        .store
        .routes
        .iter()
        .any(|route| route.components.iter().any(|a| a.component == "Invoices")));
}

#[tokio::test]
async fn unrelated_change_yields_empty_route_list_not_error() {
    let driver = Arc::new(FakeApp::new());
    let oracle = Arc::new(MockOracle::unavailable());
    let session = ExplorationSession::new(driver, oracle, fast_config());

    let change = ChangeContext::new("Bump lint tooling", "chore/lint");
    let report = session.run(change).await.expect("session runs");

    assert!(report.routes.is_empty());
    // Only the baseline capture step runs.
    assert_eq!(report.summary.total, 1);
    assert_eq!(report.summary.succeeded, 1);
}
