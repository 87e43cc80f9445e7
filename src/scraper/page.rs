use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::app::Result;

/// One browser page, driven sequentially.
///
/// Every call must be awaited before the next one is issued; implementations
/// bound each call with a timeout so nothing blocks indefinitely.
#[async_trait]
pub trait PageSession: Send + Sync {
    /// Navigate and wait for the load to settle.
    async fn goto(&self, url: &str, timeout: Duration) -> Result<()>;

    /// Call a JavaScript function expression in the page with one JSON argument.
    async fn call_function(&self, function: &str, args: Value) -> Result<Value>;

    /// Click the first element matching `selector`.
    ///
    /// Returns `Ok(false)` when nothing matches.
    async fn click(&self, selector: &str, timeout: Duration) -> Result<bool>;

    /// Dispatch a mouse wheel event at the viewport centre.
    async fn wheel(&self, delta_y: f64) -> Result<()>;

    async fn press_key(&self, key: &str) -> Result<()>;

    /// Wait until `selector` matches at least one element.
    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<()>;

    async fn screenshot(&self, path: &Path, full_page: bool) -> Result<()>;

    /// Full serialized HTML of the current document.
    async fn html(&self) -> Result<String>;

    async fn close(&self) -> Result<()>;
}
