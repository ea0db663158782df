//! One logical browser session: a page, its channel, and its lifecycle.

use std::sync::Arc;
use std::time::Duration;

use drover_protocol::CommandPayload;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::time::Instant;
use url::Url;
use uuid::Uuid;

use crate::channel::PageChannel;
use crate::driver::{BrowserDriver, LaunchedPage, PageHandle};
use crate::error::{Error, Result};
use crate::executor::executor_script;

/// Session lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Accepting commands.
    Active,
    /// Teardown in progress; no new commands are accepted.
    Closing,
    /// Page released; the id is no longer resolvable.
    Closed,
}

impl SessionState {
    /// Returns the lowercase state name.
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Active => "active",
            SessionState::Closing => "closing",
            SessionState::Closed => "closed",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One isolated browser-page context addressable by an opaque id.
///
/// The session is the sole mutator of its own state and activity timestamp.
/// Command execution is serialized through a single fair in-flight slot:
/// `tokio::sync::Mutex` queues waiters FIFO, so commands against one page
/// run one at a time in submission order while different sessions proceed
/// fully in parallel.
pub struct Session {
    id: Arc<str>,
    page: Arc<dyn PageHandle>,
    channel: PageChannel,
    state: Mutex<SessionState>,
    last_activity: Mutex<Instant>,
    command_lock: tokio::sync::Mutex<()>,
}

impl Session {
    /// Acquires a page for `url`, injects the executor, and returns the
    /// running session. The URL has already passed origin validation.
    pub(crate) async fn open(driver: &dyn BrowserDriver, url: &Url) -> Result<Arc<Self>> {
        let LaunchedPage { page, incoming } = driver.launch_page(url.as_str()).await?;
        let page: Arc<dyn PageHandle> = Arc::from(page);

        if let Err(e) = page.evaluate(executor_script()).await {
            // Injection failed; release the page rather than leaking it.
            if let Err(close_err) = page.close().await {
                tracing::warn!(
                    target: "drover.session",
                    error = %close_err,
                    "failed to close page after injection failure"
                );
            }
            return Err(e);
        }

        let id: Arc<str> = Arc::from(Uuid::new_v4().to_string());
        tracing::debug!(target: "drover.session", session = %id, url = %url, "session opened");

        Ok(Arc::new(Self {
            id,
            channel: PageChannel::start(Arc::clone(&page), incoming),
            page,
            state: Mutex::new(SessionState::Active),
            last_activity: Mutex::new(Instant::now()),
            command_lock: tokio::sync::Mutex::new(()),
        }))
    }

    /// Returns the opaque session id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the current lifecycle state.
    pub fn state(&self) -> SessionState {
        *self.state.lock()
    }

    /// Time since the last successful command submission (or creation).
    pub fn idle_for(&self) -> Duration {
        self.last_activity.lock().elapsed()
    }

    fn touch(&self) {
        *self.last_activity.lock() = Instant::now();
    }

    /// Transitions `Active` → `Closing`. Returns false if another caller got
    /// there first, making removal single-winner.
    pub(crate) fn begin_close(&self) -> bool {
        let mut state = self.state.lock();
        if *state == SessionState::Active {
            *state = SessionState::Closing;
            true
        } else {
            false
        }
    }

    /// Executes one command against the page, serialized on the in-flight
    /// slot and bounded by `timeout`.
    pub(crate) async fn execute(&self, command: CommandPayload, timeout: Duration) -> Result<Value> {
        if self.state() != SessionState::Active {
            return Err(Error::SessionNotFound(self.id.to_string()));
        }

        let _slot = self.command_lock.lock().await;

        // The session may have closed while this command was queued.
        if self.state() != SessionState::Active {
            return Err(Error::SessionNotFound(self.id.to_string()));
        }

        self.touch();

        match tokio::time::timeout(timeout, self.channel.send_command(command)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::debug!(
                    target: "drover.session",
                    session = %self.id,
                    timeout_ms = timeout.as_millis() as u64,
                    "command timed out; freeing in-flight slot"
                );
                Err(Error::CommandTimeout {
                    duration_ms: timeout.as_millis() as u64,
                })
            }
        }
    }

    /// Tears the session down: waits (bounded by `grace`) for an in-flight
    /// command to reach a terminal state, shuts the channel down, releases
    /// the page, and transitions to `Closed`.
    pub(crate) async fn close(&self, grace: Duration) -> Result<()> {
        // Hold the slot through teardown so queued submissions observe
        // `Closed` instead of sending into a released page. Bounded: a stuck
        // command cannot block eviction past the command timeout.
        let slot = tokio::time::timeout(grace, self.command_lock.lock()).await.ok();
        if slot.is_none() {
            tracing::warn!(
                target: "drover.session",
                session = %self.id,
                "in-flight command did not finish within grace period; closing anyway"
            );
        }

        self.channel.shutdown();
        let result = self.page.close().await;
        *self.state.lock() = SessionState::Closed;

        tracing::debug!(target: "drover.session", session = %self.id, "session closed");
        result
    }
}
