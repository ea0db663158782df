//! Browser-driver collaborator seam.
//!
//! The session manager treats the headless-browser driver purely as a
//! resource provider: it can open a page at a URL, evaluate script in it,
//! and close it. Replies posted by the page travel back over the message
//! receiver handed over at launch time; how the driver captures those
//! messages is its own business and not specified here.

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::error::Result;

/// A page freshly opened by the driver.
///
/// `incoming` carries every message the page posts to its own window; the
/// session's channel reader consumes it for reply correlation.
pub struct LaunchedPage {
    /// Handle for operating on the page.
    pub page: Box<dyn PageHandle>,
    /// Stream of messages posted by the page context.
    pub incoming: mpsc::UnboundedReceiver<Value>,
}

/// Provider of browser pages.
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    /// Opens a page, navigates it to `url`, and returns the handle plus the
    /// page's outbound message stream. The URL has already passed origin
    /// validation by the time this is called.
    async fn launch_page(&self, url: &str) -> Result<LaunchedPage>;
}

/// Exclusively-owned handle to one browser page.
#[async_trait]
pub trait PageHandle: Send + Sync {
    /// Evaluates a script in the page context and returns its value.
    async fn evaluate(&self, script: &str) -> Result<Value>;

    /// Delivers a message into the page context.
    ///
    /// The default implementation posts from inside the page so the message
    /// arrives with the page's own origin, which is what the executor's
    /// origin check requires. Drivers with a faster native path may override.
    async fn post_message(&self, message: &Value) -> Result<()> {
        let script = format!("window.postMessage({message}, window.location.origin)");
        self.evaluate(&script).await.map(|_| ())
    }

    /// Closes the page and releases its resources.
    async fn close(&self) -> Result<()>;
}
