//! In-page command executor embedding.
//!
//! The executor is a self-contained script injected into every controlled
//! page. It listens for same-origin `command` messages, resolves the target
//! element through the candidate selector list, performs the action, and
//! posts exactly one `response` or `error` reply back to the page's own
//! origin. Keeping it in its own `.js` file gives editors proper syntax
//! highlighting while still bundling it as a string at compile time.

/// Embedded contents of `scripts/executor.js`.
pub const EXECUTOR_SCRIPT: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/scripts/executor.js"));

/// Returns the executor script to inject at session creation.
pub fn executor_script() -> &'static str {
    EXECUTOR_SCRIPT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_script_is_non_empty() {
        assert!(!EXECUTOR_SCRIPT.trim().is_empty());
    }

    #[test]
    fn script_is_idempotent_on_reinjection() {
        assert!(EXECUTOR_SCRIPT.contains("__droverExecutorInstalled"));
    }

    #[test]
    fn script_validates_origin_both_ways() {
        assert!(EXECUTOR_SCRIPT.contains("event.origin !== HOME_ORIGIN"));
        // Replies are addressed to the captured origin, never broadcast.
        assert!(EXECUTOR_SCRIPT.contains("HOME_ORIGIN)"));
        assert!(!EXECUTOR_SCRIPT.contains("postMessage(body, '*')"));
    }

    #[test]
    fn script_speaks_the_current_protocol_version() {
        assert!(EXECUTOR_SCRIPT.contains(&format!(
            "PROTOCOL_VERSION = {}",
            drover_protocol::PROTOCOL_VERSION
        )));
    }

    #[test]
    fn script_reports_expected_failure_kinds() {
        for marker in [
            "Element not found",
            "Unknown action type",
            "Malformed command",
            "ExecutionError",
        ] {
            assert!(EXECUTOR_SCRIPT.contains(marker), "missing marker {marker:?}");
        }
    }
}
