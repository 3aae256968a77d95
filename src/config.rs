//! Manager configuration.
//!
//! All knobs are set at construction time and never change for the lifetime
//! of a [`DataAccessManager`](crate::DataAccessManager). The defaults point
//! at a public test API and match typical dashboard usage.

use std::time::Duration;

/// Default API host (JSONPlaceholder, a public test API).
const DEFAULT_BASE_URL: &str = "https://jsonplaceholder.typicode.com";

/// Retries after the initial attempt. 3 recovers from transient failures
/// without making the user wait through a long error cascade.
const DEFAULT_MAX_RETRIES: u32 = 3;

/// Fixed delay between retry attempts.
const DEFAULT_RETRY_DELAY_MS: u64 = 1000;

/// Cached responses are considered stale after 5 minutes.
const DEFAULT_CACHE_EXPIRY_MS: u64 = 300_000;

/// Debounce window for search triggers. 300ms absorbs normal typing speed.
const DEFAULT_DEBOUNCE_DELAY_MS: u64 = 300;

/// HTTP request timeout.
/// 30s allows for slow API responses while failing fast enough for good UX.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Immutable per-manager configuration.
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Base URL that endpoints are appended to.
    pub base_url: String,
    /// Number of retries after the first failed attempt. 0 means exactly
    /// one attempt.
    pub max_retries: u32,
    /// Fixed wait between attempts.
    pub retry_delay: Duration,
    /// Age at which a cache entry stops being served.
    pub cache_expiry: Duration,
    /// Coalescing window for debounced search triggers.
    pub debounce_delay: Duration,
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
            cache_expiry: Duration::from_millis(DEFAULT_CACHE_EXPIRY_MS),
            debounce_delay: Duration::from_millis(DEFAULT_DEBOUNCE_DELAY_MS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl ManagerConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    pub fn with_cache_expiry(mut self, cache_expiry: Duration) -> Self {
        self.cache_expiry = cache_expiry;
        self
    }

    pub fn with_debounce_delay(mut self, debounce_delay: Duration) -> Self {
        self.debounce_delay = debounce_delay;
        self
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ManagerConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.retry_delay, Duration::from_millis(1000));
        assert_eq!(config.cache_expiry, Duration::from_millis(300_000));
        assert_eq!(config.debounce_delay, Duration::from_millis(300));
    }

    #[test]
    fn test_builder_setters() {
        let config = ManagerConfig::default()
            .with_base_url("http://localhost:8080")
            .with_max_retries(0)
            .with_retry_delay(Duration::from_millis(10));
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.max_retries, 0);
        assert_eq!(config.retry_delay, Duration::from_millis(10));
    }
}
