//! Session endpoints and error-to-status mapping.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, post};
use axum::{Json, Router};
use drover::{CommandDispatcher, CommandRequest, Error, SessionRegistry};
use drover_protocol::{Action, CommandResult};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
	pub registry: Arc<SessionRegistry>,
	pub dispatcher: Arc<CommandDispatcher>,
}

/// Builds the session router.
pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/sessions", post(create_session).get(list_sessions))
		.route("/sessions/{id}/command", post(run_command))
		.route("/sessions/{id}", delete(delete_session))
		.with_state(state)
}

#[derive(Debug, Deserialize)]
struct CreateSessionRequest {
	url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateSessionResponse {
	session_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommandBody {
	action: String,
	#[serde(default)]
	target_description: Option<String>,
	#[serde(default)]
	selectors: Option<Vec<String>>,
	#[serde(default)]
	value: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionEntry {
	session_id: String,
	state: String,
	idle_ms: u64,
}

#[derive(Debug, Serialize)]
struct SessionList {
	sessions: Vec<SessionEntry>,
}

#[derive(Debug, Serialize)]
struct Deleted {
	success: bool,
}

/// Wraps a core error with its HTTP status.
struct ApiError(Error);

impl From<Error> for ApiError {
	fn from(error: Error) -> Self {
		Self(error)
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let status = match &self.0 {
			Error::Validation(_) => StatusCode::BAD_REQUEST,
			Error::SessionNotFound(_) => StatusCode::NOT_FOUND,
			Error::CommandTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
			Error::Driver(_) | Error::ChannelClosed => StatusCode::BAD_GATEWAY,
			Error::Page { .. } | Error::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
		};

		tracing::debug!(target = "drover.http", status = %status, error = %self.0, "request failed");

		let body = Json(json!({ "success": false, "error": self.0.to_string() }));
		(status, body).into_response()
	}
}

// POST /sessions
async fn create_session(
	State(state): State<AppState>,
	Json(request): Json<CreateSessionRequest>,
) -> Result<Json<CreateSessionResponse>, ApiError> {
	let session_id = state.registry.create(&request.url).await?;
	Ok(Json(CreateSessionResponse { session_id }))
}

// POST /sessions/{id}/command
async fn run_command(
	State(state): State<AppState>,
	Path(id): Path<String>,
	Json(body): Json<CommandBody>,
) -> Result<Json<CommandResult>, ApiError> {
	let action = match body.action.as_str() {
		"type" => Action::Type,
		"click" => Action::Click,
		other => {
			return Err(Error::Validation(format!("unknown action '{other}'")).into());
		}
	};

	let request = CommandRequest {
		action: Some(action),
		target_description: body.target_description,
		selectors: body.selectors,
		value: body.value,
	};

	let result = state.dispatcher.submit(&id, request).await?;
	Ok(Json(result))
}

// DELETE /sessions/{id}
async fn delete_session(
	State(state): State<AppState>,
	Path(id): Path<String>,
) -> Result<Json<Deleted>, ApiError> {
	state.registry.remove(&id).await?;
	Ok(Json(Deleted { success: true }))
}

// GET /sessions
async fn list_sessions(State(state): State<AppState>) -> Json<SessionList> {
	let sessions = state
		.registry
		.snapshot()
		.into_iter()
		.map(|info| SessionEntry {
			session_id: info.id,
			state: info.state.as_str().to_string(),
			idle_ms: info.idle_for.as_millis() as u64,
		})
		.collect();
	Json(SessionList { sessions })
}
