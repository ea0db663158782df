//! Command payloads and caller-facing results.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Action performed against a page element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Focus the element and set its value, firing native input/change events.
    Type,
    /// Invoke the element's click behavior.
    Click,
}

impl Action {
    /// Returns the wire name of this action.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Type => "type",
            Action::Click => "click",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Command body carried by a `command` message.
///
/// `selectors` is the ordered candidate list; the executor tries each in turn
/// and acts on the first element that resolves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandPayload {
    /// Action to perform.
    pub action: Action,
    /// Ordered candidate selectors, most specific first. Never empty.
    pub selectors: Vec<String>,
    /// Text payload; required for `type`, absent for `click`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// Result body carried by a `response` message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandOutcome {
    /// The candidate selector that resolved to the acted-on element.
    pub matched_selector: String,
    /// Action-specific data reported by the executor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<Value>,
}

/// Structured command result returned to callers.
///
/// A `success: false` result means the channel worked but the action failed
/// in the page (element not found, malformed command). Channel-level failures
/// (timeout, closed session, driver errors) surface as errors instead, so
/// callers can tell the two apart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_selector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl CommandResult {
    /// Builds a successful result from an executor outcome.
    pub fn ok(outcome: CommandOutcome) -> Self {
        Self {
            success: true,
            matched_selector: Some(outcome.matched_selector),
            detail: outcome.detail,
            reason: None,
        }
    }

    /// Builds a structured failure with the given reason.
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            matched_selector: None,
            detail: None,
            reason: Some(reason.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_wire_names_are_lowercase() {
        assert_eq!(serde_json::to_string(&Action::Type).unwrap(), "\"type\"");
        assert_eq!(serde_json::to_string(&Action::Click).unwrap(), "\"click\"");
    }

    #[test]
    fn payload_omits_absent_value() {
        let payload = CommandPayload {
            action: Action::Click,
            selectors: vec!["#submit".into()],
            value: None,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("value").is_none());
        assert_eq!(json["action"], "click");
    }

    #[test]
    fn outcome_uses_camel_case() {
        let outcome = CommandOutcome {
            matched_selector: "input[type=email]".into(),
            detail: None,
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["matchedSelector"], "input[type=email]");
    }

    #[test]
    fn failed_result_round_trips() {
        let result = CommandResult::failed("Element not found");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["reason"], "Element not found");

        let back: CommandResult = serde_json::from_value(json).unwrap();
        assert_eq!(back, result);
    }
}
