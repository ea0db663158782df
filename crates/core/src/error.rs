//! Error types for the session manager.

use thiserror::Error;

/// Result type alias for session manager operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while managing sessions and dispatching commands.
#[derive(Debug, Error)]
pub enum Error {
    /// Request rejected before any resource was acquired.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Unknown or already-closed session id.
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// No reply arrived within the per-command deadline.
    #[error("command timed out after {duration_ms}ms")]
    CommandTimeout { duration_ms: u64 },

    /// The in-page executor reported a failure.
    ///
    /// These are expected outcomes of imprecise targeting (element not found,
    /// malformed command) and are converted into structured command results
    /// by the dispatcher rather than surfaced to callers as errors.
    #[error("{name}: {message}")]
    Page {
        /// Error kind reported by the executor (e.g. "ElementNotFound").
        name: String,
        /// Human-readable message.
        message: String,
    },

    /// Underlying browser-driver failure (launch, navigation, evaluation).
    #[error("driver error: {0}")]
    Driver(String),

    /// The page channel shut down while a command was waiting on it.
    #[error("channel closed unexpectedly")]
    ChannelClosed,

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns true if this is a command timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::CommandTimeout { .. })
    }

    /// Returns true if this is an unknown-session error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::SessionNotFound(_))
    }

    /// Returns the executor error kind if this is a page-side failure.
    pub fn page_error_name(&self) -> Option<&str> {
        match self {
            Error::Page { name, .. } => Some(name),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predicates_match_variants() {
        assert!(Error::CommandTimeout { duration_ms: 10_000 }.is_timeout());
        assert!(!Error::ChannelClosed.is_timeout());
        assert!(Error::SessionNotFound("s-1".into()).is_not_found());
        assert_eq!(
            Error::Page {
                name: "ElementNotFound".into(),
                message: "Element not found".into(),
            }
            .page_error_name(),
            Some("ElementNotFound")
        );
    }
}
