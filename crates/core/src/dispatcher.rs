//! Public command-submission entry point.

use std::sync::Arc;

use drover_protocol::{Action, CommandOutcome, CommandPayload, CommandResult};

use crate::error::{Error, Result};
use crate::registry::SessionRegistry;
use crate::selector::candidate_selectors;

/// A structured command submission.
///
/// Targeting is either a semantic description (resolved into a candidate
/// selector chain) or an explicit selector list, which takes precedence when
/// given - mirroring the exposed `selectors | targetDescription` surface.
#[derive(Debug, Clone, Default)]
pub struct CommandRequest {
    pub action: Option<Action>,
    pub target_description: Option<String>,
    pub selectors: Option<Vec<String>>,
    pub value: Option<String>,
}

impl CommandRequest {
    /// Builds a `type` request against a described target.
    pub fn type_into(description: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            action: Some(Action::Type),
            target_description: Some(description.into()),
            selectors: None,
            value: Some(value.into()),
        }
    }

    /// Builds a `click` request against a described target.
    pub fn click(description: impl Into<String>) -> Self {
        Self {
            action: Some(Action::Click),
            target_description: Some(description.into()),
            selectors: None,
            value: None,
        }
    }

    /// Overrides resolution with an explicit selector list.
    pub fn with_selectors(mut self, selectors: Vec<String>) -> Self {
        self.selectors = Some(selectors);
        self
    }

    /// Validates the request and produces the wire payload.
    fn into_payload(self) -> Result<CommandPayload> {
        let action = self
            .action
            .ok_or_else(|| Error::Validation("missing action".to_string()))?;

        if action == Action::Type && self.value.is_none() {
            return Err(Error::Validation(
                "'type' action requires a value".to_string(),
            ));
        }

        let explicit: Vec<String> = self
            .selectors
            .unwrap_or_default()
            .into_iter()
            .filter(|s| !s.trim().is_empty())
            .collect();

        let selectors = if !explicit.is_empty() {
            explicit
        } else {
            candidate_selectors(self.target_description.as_deref().unwrap_or(""))
        };

        if selectors.is_empty() {
            return Err(Error::Validation(
                "a target description or selector list is required".to_string(),
            ));
        }

        Ok(CommandPayload {
            action,
            selectors,
            value: self.value,
        })
    }
}

/// Validates, serializes, and dispatches commands to sessions.
pub struct CommandDispatcher {
    registry: Arc<SessionRegistry>,
}

impl CommandDispatcher {
    /// Creates a dispatcher over the given registry.
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self { registry }
    }

    /// Submits one command against a session and awaits its outcome.
    ///
    /// Page-side failures (element not found, malformed command) come back
    /// as `CommandResult { success: false, reason }` - they are expected
    /// outcomes of imprecise targeting, not errors. Timeouts, unknown
    /// sessions, and driver failures surface as errors.
    pub async fn submit(&self, session_id: &str, request: CommandRequest) -> Result<CommandResult> {
        let session = self
            .registry
            .get(session_id)
            .ok_or_else(|| Error::SessionNotFound(session_id.to_string()))?;

        let payload = request.into_payload()?;
        let timeout = self.registry.config().command_timeout;

        match session.execute(payload, timeout).await {
            Ok(value) => {
                let outcome: CommandOutcome = serde_json::from_value(value)?;
                Ok(CommandResult::ok(outcome))
            }
            Err(Error::Page { message, name }) => {
                tracing::debug!(
                    target: "drover.session",
                    session = %session_id,
                    kind = %name,
                    "command failed in page"
                );
                Ok(CommandResult::failed(message))
            }
            Err(e @ (Error::Driver(_) | Error::ChannelClosed)) => {
                // The page is gone or unreachable; the session cannot recover.
                tracing::warn!(
                    target: "drover.session",
                    session = %session_id,
                    error = %e,
                    "driver failure; tearing session down"
                );
                if let Err(remove_err) = self.registry.remove(session_id).await {
                    if !remove_err.is_not_found() {
                        tracing::warn!(
                            target: "drover.session",
                            session = %session_id,
                            error = %remove_err,
                            "teardown after driver failure also failed"
                        );
                    }
                }
                Err(e)
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_without_value_is_rejected() {
        let request = CommandRequest {
            action: Some(Action::Type),
            target_description: Some("email".into()),
            selectors: None,
            value: None,
        };
        assert!(matches!(
            request.into_payload(),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn missing_target_is_rejected() {
        let request = CommandRequest {
            action: Some(Action::Click),
            ..Default::default()
        };
        assert!(matches!(
            request.into_payload(),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn explicit_selectors_take_precedence() {
        let payload = CommandRequest::click("email")
            .with_selectors(vec!["#login-email".into()])
            .into_payload()
            .unwrap();
        assert_eq!(payload.selectors, vec!["#login-email"]);
    }

    #[test]
    fn description_resolves_to_candidate_chain() {
        let payload = CommandRequest::type_into("email", "a@b.com")
            .into_payload()
            .unwrap();
        assert_eq!(payload.selectors, candidate_selectors("email"));
        assert_eq!(payload.value.as_deref(), Some("a@b.com"));
    }

    #[test]
    fn blank_explicit_selectors_fall_back_to_description() {
        let payload = CommandRequest::click("submit button")
            .with_selectors(vec!["   ".into()])
            .into_payload()
            .unwrap();
        assert_eq!(payload.selectors, candidate_selectors("submit button"));
    }
}
