//! Request/response correlation over the page message channel.
//!
//! The driver and the in-page executor run in separate execution contexts
//! with no shared memory, so commands are modeled as explicit message
//! passing:
//!
//! 1. The session submits a command; the channel assigns a unique id and
//!    registers a oneshot callback under it
//! 2. The command message is posted into the page context
//! 3. The executor resolves, acts, and posts a reply with the same id
//! 4. The reader task correlates the reply by id and completes the callback
//!
//! A reply whose id no longer has a callback (the submitter timed out and
//! its cancel guard removed the entry) is orphaned: logged and discarded.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::task::{Context, Poll};

use drover_protocol::{ChannelMessage, CommandPayload, ErrorPayload};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::driver::PageHandle;
use crate::error::{Error, Result};

/// Pending reply callbacks keyed by command id.
type CallbackMap = Arc<Mutex<HashMap<u32, oneshot::Sender<Result<Value>>>>>;

/// RAII guard ensuring callback cleanup when a reply future is dropped.
///
/// Dropping the future before completion (per-command timeout) must free the
/// correlation slot, otherwise a late reply would complete a wait that no
/// longer exists and the map would leak an entry per timed-out command.
struct CancelGuard {
    id: u32,
    callbacks: CallbackMap,
    completed: bool,
}

impl CancelGuard {
    fn new(id: u32, callbacks: CallbackMap) -> Self {
        Self {
            id,
            callbacks,
            completed: false,
        }
    }

    fn complete(&mut self) {
        self.completed = true;
    }
}

impl Drop for CancelGuard {
    fn drop(&mut self) {
        if self.completed {
            return;
        }
        if self.callbacks.lock().remove(&self.id).is_some() {
            tracing::debug!(target: "drover.channel", id = self.id, "removed orphaned callback");
        }
    }
}

/// Future returned by [`PageChannel::send_command`] with automatic
/// cancellation cleanup.
struct ReplyFuture {
    rx: oneshot::Receiver<Result<Value>>,
    guard: CancelGuard,
}

impl Future for ReplyFuture {
    type Output = Result<Value>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(result) => {
                self.guard.complete();
                Poll::Ready(result.map_err(|_| Error::ChannelClosed).and_then(|r| r))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Per-session command channel to one page.
///
/// Owns the id counter, the callback map, and the reader task draining the
/// page's outbound messages.
pub(crate) struct PageChannel {
    last_id: AtomicU32,
    callbacks: CallbackMap,
    page: Arc<dyn PageHandle>,
    reader: Mutex<Option<JoinHandle<()>>>,
}

impl PageChannel {
    /// Creates the channel and starts the reader over `incoming`.
    pub(crate) fn start(
        page: Arc<dyn PageHandle>,
        mut incoming: mpsc::UnboundedReceiver<Value>,
    ) -> Self {
        let callbacks: CallbackMap = Arc::new(Mutex::new(HashMap::new()));

        let reader_callbacks = Arc::clone(&callbacks);
        let reader = tokio::spawn(async move {
            while let Some(value) = incoming.recv().await {
                dispatch(&reader_callbacks, value);
            }
        });

        Self {
            last_id: AtomicU32::new(0),
            callbacks,
            page,
            reader: Mutex::new(Some(reader)),
        }
    }

    /// Sends a command into the page and awaits its terminal reply.
    pub(crate) async fn send_command(&self, command: CommandPayload) -> Result<Value> {
        let id = self.last_id.fetch_add(1, Ordering::SeqCst);

        tracing::debug!(
            target: "drover.channel",
            id,
            action = %command.action,
            candidates = command.selectors.len(),
            "sending command"
        );

        let (tx, rx) = oneshot::channel();
        self.callbacks.lock().insert(id, tx);
        let guard = CancelGuard::new(id, Arc::clone(&self.callbacks));

        let message = serde_json::to_value(ChannelMessage::command(id, command))?;
        self.page.post_message(&message).await?;

        ReplyFuture { rx, guard }.await
    }

    /// Stops the reader and fails every pending wait with `ChannelClosed`.
    pub(crate) fn shutdown(&self) {
        if let Some(reader) = self.reader.lock().take() {
            reader.abort();
        }
        let pending: Vec<_> = self.callbacks.lock().drain().collect();
        for (id, tx) in pending {
            tracing::debug!(target: "drover.channel", id, "failing pending command on shutdown");
            let _ = tx.send(Err(Error::ChannelClosed));
        }
    }
}

impl Drop for PageChannel {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Correlates one incoming page message to its pending callback.
fn dispatch(callbacks: &CallbackMap, value: Value) {
    let message = match serde_json::from_value::<ChannelMessage>(value) {
        Ok(message) => message,
        Err(e) => {
            tracing::debug!(
                target: "drover.channel",
                error = %e,
                "unknown message shape (forward-compatible, ignored)"
            );
            return;
        }
    };

    let (id, result) = match message {
        ChannelMessage::Response { id, result, .. } => (id, Ok(result)),
        ChannelMessage::Error { id, error, .. } => (id, Err(page_error(error))),
        ChannelMessage::Command { id, .. } => {
            tracing::debug!(target: "drover.channel", id, "command echo from page (ignored)");
            return;
        }
    };

    match callbacks.lock().remove(&id) {
        Some(tx) => {
            let _ = tx.send(result);
        }
        None => {
            tracing::debug!(target: "drover.channel", id, "reply for unknown command id (ignored)");
        }
    }
}

/// Converts an executor [`ErrorPayload`] into [`Error::Page`].
fn page_error(error: ErrorPayload) -> Error {
    Error::Page {
        name: error.name.unwrap_or_else(|| "Error".to_string()),
        message: error.message,
    }
}
