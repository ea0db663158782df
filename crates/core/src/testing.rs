//! Scriptable fake driver for tests.
//!
//! `FakeDriver` stands in for the browser-driver collaborator: every
//! launched `FakePage` plays the executor's role according to a fixed
//! script, and records enough (injected scripts, command arrival order,
//! peak in-page concurrency) for tests to assert the session manager's
//! guarantees without a real browser.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use drover_protocol::{ChannelMessage, PROTOCOL_VERSION};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::sync::mpsc;

use crate::driver::{BrowserDriver, LaunchedPage, PageHandle};
use crate::error::{Error, Result};

/// How a fake page answers commands.
#[derive(Debug, Clone, Copy)]
pub enum PageScript {
    /// Reply success, matching the first candidate selector.
    Echo,
    /// Reply success after the given delay.
    DelayedEcho(Duration),
    /// Reply "Element not found" to every command.
    ElementMissing,
    /// Never reply.
    Silent,
    /// Swallow the first command, echo the rest.
    SilentOnce,
    /// Fail message delivery, as if the page had crashed.
    PostFails,
}

/// Fake browser-driver collaborator.
pub struct FakeDriver {
    script: PageScript,
    fail_launch: bool,
    fail_close: bool,
    launches: AtomicUsize,
    closes: Arc<AtomicUsize>,
    pages: Mutex<Vec<Arc<FakePage>>>,
}

impl FakeDriver {
    /// Driver whose pages follow `script`.
    pub fn new(script: PageScript) -> Arc<Self> {
        Arc::new(Self {
            script,
            fail_launch: false,
            fail_close: false,
            launches: AtomicUsize::new(0),
            closes: Arc::new(AtomicUsize::new(0)),
            pages: Mutex::new(Vec::new()),
        })
    }

    /// Driver that fails every launch.
    pub fn failing_launch() -> Arc<Self> {
        Arc::new(Self {
            script: PageScript::Echo,
            fail_launch: true,
            fail_close: false,
            launches: AtomicUsize::new(0),
            closes: Arc::new(AtomicUsize::new(0)),
            pages: Mutex::new(Vec::new()),
        })
    }

    /// Driver whose pages fail to close.
    pub fn with_failing_close(script: PageScript) -> Arc<Self> {
        Arc::new(Self {
            script,
            fail_launch: false,
            fail_close: true,
            launches: AtomicUsize::new(0),
            closes: Arc::new(AtomicUsize::new(0)),
            pages: Mutex::new(Vec::new()),
        })
    }

    /// Number of pages ever launched.
    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    /// Number of pages closed.
    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    /// Every page launched so far, in launch order.
    pub fn pages(&self) -> Vec<Arc<FakePage>> {
        self.pages.lock().clone()
    }
}

#[async_trait]
impl BrowserDriver for FakeDriver {
    async fn launch_page(&self, _url: &str) -> Result<LaunchedPage> {
        if self.fail_launch {
            return Err(Error::Driver("page launch failed".to_string()));
        }
        self.launches.fetch_add(1, Ordering::SeqCst);

        let (outgoing, incoming) = mpsc::unbounded_channel();
        let page = Arc::new(FakePage {
            script: self.script,
            fail_close: self.fail_close,
            outgoing,
            closes: Arc::clone(&self.closes),
            evaluated: Mutex::new(Vec::new()),
            arrivals: Mutex::new(Vec::new()),
            swallowed: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        });
        self.pages.lock().push(Arc::clone(&page));

        Ok(LaunchedPage {
            page: Box::new(FakePageHandle(page)),
            incoming,
        })
    }
}

/// A fake page playing the in-page executor according to its script.
pub struct FakePage {
    script: PageScript,
    fail_close: bool,
    outgoing: mpsc::UnboundedSender<Value>,
    closes: Arc<AtomicUsize>,
    evaluated: Mutex<Vec<String>>,
    arrivals: Mutex<Vec<u32>>,
    swallowed: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakePage {
    /// Scripts evaluated against this page, in order.
    pub fn evaluated(&self) -> Vec<String> {
        self.evaluated.lock().clone()
    }

    /// Command ids in the order they reached the page.
    pub fn arrivals(&self) -> Vec<u32> {
        self.arrivals.lock().clone()
    }

    /// Highest number of commands ever executing concurrently in this page.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Posts a raw message on the page→driver stream, as if the page
    /// volunteered it.
    pub fn post_raw(&self, message: Value) {
        let _ = self.outgoing.send(message);
    }

    fn handle_command(self: Arc<Self>, id: u32, first_selector: Option<String>) {
        self.arrivals.lock().push(id);

        match self.script {
            PageScript::Silent => return,
            PageScript::SilentOnce => {
                if self.swallowed.fetch_add(1, Ordering::SeqCst) == 0 {
                    return;
                }
            }
            _ => {}
        }

        let page = self;
        tokio::spawn(async move {
            let current = page.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            page.max_in_flight.fetch_max(current, Ordering::SeqCst);

            if let PageScript::DelayedEcho(delay) = page.script {
                tokio::time::sleep(delay).await;
            }

            page.in_flight.fetch_sub(1, Ordering::SeqCst);

            let reply = match page.script {
                PageScript::ElementMissing => json!({
                    "type": "error",
                    "id": id,
                    "v": PROTOCOL_VERSION,
                    "error": { "message": "Element not found", "name": "ElementNotFound" },
                }),
                _ => json!({
                    "type": "response",
                    "id": id,
                    "v": PROTOCOL_VERSION,
                    "result": { "matchedSelector": first_selector.unwrap_or_default() },
                }),
            };
            let _ = page.outgoing.send(reply);
        });
    }
}

struct FakePageHandle(Arc<FakePage>);

#[async_trait]
impl PageHandle for FakePageHandle {
    async fn evaluate(&self, script: &str) -> Result<Value> {
        self.0.evaluated.lock().push(script.to_string());
        Ok(Value::Null)
    }

    async fn post_message(&self, message: &Value) -> Result<()> {
        if matches!(self.0.script, PageScript::PostFails) {
            return Err(Error::Driver("page crashed".to_string()));
        }
        if let Ok(ChannelMessage::Command { id, command, .. }) =
            serde_json::from_value::<ChannelMessage>(message.clone())
        {
            Arc::clone(&self.0).handle_command(id, command.selectors.first().cloned());
        }
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.0.closes.fetch_add(1, Ordering::SeqCst);
        if self.0.fail_close {
            return Err(Error::Driver("page close failed".to_string()));
        }
        Ok(())
    }
}
