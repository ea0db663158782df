//! Concurrency-safe session registry.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::config::Config;
use crate::driver::BrowserDriver;
use crate::error::{Error, Result};
use crate::session::{Session, SessionState};

/// Point-in-time view of one registered session.
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub id: String,
    pub state: SessionState,
    pub idle_for: Duration,
}

/// Owner of every live [`Session`], keyed by opaque id.
///
/// Map mutation is serialized behind a single lock; per-session locks are
/// never taken while holding it, so unrelated sessions never serialize
/// behind one another.
pub struct SessionRegistry {
    driver: Arc<dyn BrowserDriver>,
    config: Config,
    sessions: Mutex<HashMap<Arc<str>, Arc<Session>>>,
}

impl SessionRegistry {
    /// Creates an empty registry over the given driver.
    pub fn new(driver: Arc<dyn BrowserDriver>, config: Config) -> Self {
        Self {
            driver,
            config,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the registry configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Validates `url` against the origin allow-list, acquires a page,
    /// injects the executor, and registers the new session.
    ///
    /// Validation happens before any driver resource is touched; a
    /// disallowed URL never reaches the browser.
    pub async fn create(&self, url: &str) -> Result<String> {
        let url = self.config.allowed_origins.permit(url)?;

        let session = Session::open(self.driver.as_ref(), &url).await?;
        let id = session.id().to_string();

        self.sessions
            .lock()
            .insert(Arc::from(id.as_str()), session);

        tracing::info!(target: "drover.registry", session = %id, url = %url, "session created");
        Ok(id)
    }

    /// Looks up a live session by id.
    pub fn get(&self, id: &str) -> Option<Arc<Session>> {
        self.sessions.lock().get(id).cloned()
    }

    /// Number of registered sessions.
    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    /// Returns true if no sessions are registered.
    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }

    /// Point-in-time view of all registered sessions.
    pub fn snapshot(&self) -> Vec<SessionInfo> {
        self.sessions
            .lock()
            .values()
            .map(|s| SessionInfo {
                id: s.id().to_string(),
                state: s.state(),
                idle_for: s.idle_for(),
            })
            .collect()
    }

    /// Ids of sessions idle longer than `threshold`.
    pub fn list_idle_older_than(&self, threshold: Duration) -> Vec<String> {
        self.sessions
            .lock()
            .values()
            .filter(|s| s.state() == SessionState::Active && s.idle_for() > threshold)
            .map(|s| s.id().to_string())
            .collect()
    }

    /// Removes a session: `Closing` → release page → `Closed` → drop the map
    /// entry. Unknown ids (including sessions another caller is already
    /// closing) report `SessionNotFound`.
    pub async fn remove(&self, id: &str) -> Result<()> {
        let session = self
            .get(id)
            .ok_or_else(|| Error::SessionNotFound(id.to_string()))?;

        if !session.begin_close() {
            // Another remove won the race; let it finish the teardown.
            return Err(Error::SessionNotFound(id.to_string()));
        }

        let result = session.close(self.config.command_timeout).await;
        self.sessions.lock().remove(id);

        tracing::info!(target: "drover.registry", session = %id, "session removed");
        result
    }

    /// Removes every session, logging per-session failures. Used at service
    /// shutdown.
    pub async fn drain(&self) {
        let ids: Vec<String> = self
            .sessions
            .lock()
            .keys()
            .map(|id| id.to_string())
            .collect();
        for id in ids {
            if let Err(e) = self.remove(&id).await {
                if !e.is_not_found() {
                    tracing::warn!(
                        target: "drover.registry",
                        session = %id,
                        error = %e,
                        "failed to close session during drain"
                    );
                }
            }
        }
    }
}
