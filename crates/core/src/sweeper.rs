//! Idle-session eviction.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::registry::SessionRegistry;

/// Periodic task reclaiming resources from abandoned sessions.
///
/// Each tick evicts every session idle beyond the configured threshold.
/// `remove` waits for an in-flight command to reach a terminal state
/// (bounded by the command timeout) before releasing the page, so sweeping
/// never races command execution into a use-after-close.
pub struct LifecycleSweeper {
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl LifecycleSweeper {
    /// Spawns the sweeper over `registry` using its configured interval and
    /// idle threshold.
    pub fn spawn(registry: Arc<SessionRegistry>) -> Self {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let interval = registry.config().sweep_interval;
        let threshold = registry.config().idle_threshold;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick fires immediately; skip it so a fresh service
            // does not sweep before anything can be idle.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        sweep(&registry, threshold).await;
                    }
                    _ = shutdown_rx.changed() => {
                        tracing::debug!(target: "drover.sweeper", "sweeper stopping");
                        break;
                    }
                }
            }
        });

        Self {
            shutdown_tx,
            handle,
        }
    }

    /// Stops the sweeper and waits for the task to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        let _ = self.handle.await;
    }
}

async fn sweep(registry: &SessionRegistry, threshold: std::time::Duration) {
    let idle = registry.list_idle_older_than(threshold);
    if idle.is_empty() {
        return;
    }

    tracing::debug!(target: "drover.sweeper", count = idle.len(), "evicting idle sessions");

    for id in idle {
        match registry.remove(&id).await {
            Ok(()) => {
                tracing::info!(target: "drover.sweeper", session = %id, "evicted idle session");
            }
            Err(e) if e.is_not_found() => {
                // Removed concurrently between listing and eviction.
            }
            Err(e) => {
                // One failed close must not abort the sweep of the rest.
                tracing::warn!(
                    target: "drover.sweeper",
                    session = %id,
                    error = %e,
                    "failed to evict idle session"
                );
            }
        }
    }
}
