//! Runtime configuration for the session manager.

use std::time::Duration;

use url::{Origin, Url};

use crate::error::{Error, Result};

/// Default per-command reply deadline.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(10);
/// Default idle period after which a session is evicted.
pub const DEFAULT_IDLE_THRESHOLD: Duration = Duration::from_secs(300);
/// Default interval between sweeper ticks.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(30);

/// Explicit allow-list of origins that sessions may be opened against.
///
/// Origins are compared whole (scheme + host + port); anything outside the
/// list is rejected before a browser resource is acquired.
#[derive(Debug, Clone, Default)]
pub struct AllowedOrigins {
    origins: Vec<Origin>,
}

impl AllowedOrigins {
    /// Parses the configured origin URLs. Fails on any unparseable entry so
    /// a typo cannot silently widen or narrow the list.
    pub fn new<I, S>(urls: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut origins = Vec::new();
        for url in urls {
            let url = url.as_ref();
            let parsed = Url::parse(url)
                .map_err(|e| Error::Validation(format!("invalid allowed origin '{url}': {e}")))?;
            origins.push(parsed.origin());
        }
        Ok(Self { origins })
    }

    /// Validates a session URL against the allow-list, returning the parsed
    /// URL on success.
    pub fn permit(&self, url: &str) -> Result<Url> {
        let parsed =
            Url::parse(url).map_err(|e| Error::Validation(format!("invalid url '{url}': {e}")))?;
        if self.origins.contains(&parsed.origin()) {
            Ok(parsed)
        } else {
            Err(Error::Validation(format!(
                "origin not allowed: {}",
                parsed.origin().ascii_serialization()
            )))
        }
    }

    /// Returns true if no origins are configured (everything is rejected).
    pub fn is_empty(&self) -> bool {
        self.origins.is_empty()
    }
}

/// Configuration for registry, dispatcher, and sweeper.
#[derive(Debug, Clone)]
pub struct Config {
    /// Origins session URLs must belong to.
    pub allowed_origins: AllowedOrigins,
    /// Per-command reply deadline.
    pub command_timeout: Duration,
    /// Idle period after which the sweeper evicts a session.
    pub idle_threshold: Duration,
    /// Interval between sweeper ticks.
    pub sweep_interval: Duration,
}

impl Config {
    /// Creates a configuration with default timings and the given allow-list.
    pub fn new(allowed_origins: AllowedOrigins) -> Self {
        Self {
            allowed_origins,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            idle_threshold: DEFAULT_IDLE_THRESHOLD,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }

    /// Sets the per-command timeout.
    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Sets the idle eviction threshold.
    pub fn with_idle_threshold(mut self, threshold: Duration) -> Self {
        self.idle_threshold = threshold;
        self
    }

    /// Sets the sweeper tick interval.
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permits_configured_origin_only() {
        let origins = AllowedOrigins::new(["http://localhost:3000"]).unwrap();
        assert!(origins.permit("http://localhost:3000/login").is_ok());
        assert!(origins.permit("http://localhost:3001/").is_err());
        assert!(origins.permit("https://localhost:3000/").is_err());
        assert!(origins.permit("http://evil.example/").is_err());
    }

    #[test]
    fn rejects_unparseable_urls() {
        let origins = AllowedOrigins::new(["http://localhost:3000"]).unwrap();
        let err = origins.permit("not a url").unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn empty_list_rejects_everything() {
        let origins = AllowedOrigins::default();
        assert!(origins.is_empty());
        assert!(origins.permit("http://localhost:3000/").is_err());
    }

    #[test]
    fn bad_configured_origin_fails_construction() {
        assert!(AllowedOrigins::new(["::nope::"]).is_err());
    }
}
