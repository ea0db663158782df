//! HTTP surface for the drover session manager.
//!
//! The surrounding web application mounts [`AutomationService::router`] and
//! drives sessions over plain JSON endpoints:
//!
//! - `POST /sessions` - create a session for an allow-listed URL
//! - `POST /sessions/{id}/command` - run one command against a session
//! - `DELETE /sessions/{id}` - close a session
//! - `GET /sessions` - list live sessions
//!
//! Expected command failures (element not found, malformed targeting) come
//! back as `200` with `success: false`; channel-level failures (timeouts,
//! driver errors) map to distinct HTTP statuses so callers never conflate
//! the two.

pub mod logging;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use drover::{BrowserDriver, CommandDispatcher, Config, LifecycleSweeper, SessionRegistry};

use crate::routes::AppState;

/// Assembled session-manager service: registry, dispatcher, and sweeper.
pub struct AutomationService {
	registry: Arc<SessionRegistry>,
	dispatcher: Arc<CommandDispatcher>,
	sweeper: LifecycleSweeper,
}

impl AutomationService {
	/// Wires the service over a driver and starts the idle-session sweeper.
	pub fn new(driver: Arc<dyn BrowserDriver>, config: Config) -> Self {
		let registry = Arc::new(SessionRegistry::new(driver, config));
		let dispatcher = Arc::new(CommandDispatcher::new(Arc::clone(&registry)));
		let sweeper = LifecycleSweeper::spawn(Arc::clone(&registry));

		tracing::info!(target = "drover.http", "automation service started");

		Self {
			registry,
			dispatcher,
			sweeper,
		}
	}

	/// Returns the registry backing this service.
	pub fn registry(&self) -> &Arc<SessionRegistry> {
		&self.registry
	}

	/// Builds the router exposing the session endpoints.
	pub fn router(&self) -> Router {
		routes::router(AppState {
			registry: Arc::clone(&self.registry),
			dispatcher: Arc::clone(&self.dispatcher),
		})
	}

	/// Stops the sweeper and closes every remaining session.
	pub async fn shutdown(self) {
		self.sweeper.shutdown().await;
		self.registry.drain().await;
		tracing::info!(target = "drover.http", "automation service stopped");
	}
}
