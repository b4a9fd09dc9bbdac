//! Indexer client configuration.

use std::time::Duration;

use crate::error::{IndexerError, IndexerResult};
use crate::retry::RetryConfig;

pub const DEFAULT_API_URL: &str = "https://api.videoindexer.ai";

/// Connection details for one Video Indexer account.
#[derive(Clone)]
pub struct IndexerConfig {
    /// API base URL, without a trailing slash
    pub api_url: String,
    /// Account region, e.g. `trial` or `westus2`
    pub location: String,
    pub account_id: String,
    /// API subscription key
    pub subscription_key: String,
    /// URL the indexer calls when analysis finishes
    pub callback_url: Option<String>,
    /// Lifetime assumed for an issued access token
    pub token_ttl: Duration,
    /// Request timeout
    pub timeout: Duration,
    pub retry: RetryConfig,
}

impl std::fmt::Debug for IndexerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexerConfig")
            .field("api_url", &self.api_url)
            .field("location", &self.location)
            .field("account_id", &self.account_id)
            .field("subscription_key", &"<redacted>")
            .field("callback_url", &self.callback_url)
            .field("token_ttl", &self.token_ttl)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl IndexerConfig {
    pub fn new(
        location: impl Into<String>,
        account_id: impl Into<String>,
        subscription_key: impl Into<String>,
    ) -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            location: location.into(),
            account_id: account_id.into(),
            subscription_key: subscription_key.into(),
            callback_url: None,
            token_ttl: Duration::from_secs(55 * 60),
            timeout: Duration::from_secs(60),
            retry: RetryConfig::default(),
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_callback_url(mut self, callback_url: impl Into<String>) -> Self {
        self.callback_url = Some(callback_url.into());
        self
    }

    /// Create config from environment variables.
    ///
    /// `VI_LOCATION`, `VI_ACCOUNT_ID` and `VI_KEY` are required.
    pub fn from_env() -> IndexerResult<Self> {
        let required = |name: &str| {
            std::env::var(name)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| IndexerError::config_error(format!("{} not set", name)))
        };

        let mut config = Self::new(
            required("VI_LOCATION")?,
            required("VI_ACCOUNT_ID")?,
            required("VI_KEY")?,
        );

        if let Ok(api_url) = std::env::var("VI_API_URL") {
            config = config.with_api_url(api_url);
        }
        if let Some(callback) = std::env::var("VI_CALLBACK_URL").ok().filter(|v| !v.is_empty()) {
            config = config.with_callback_url(callback);
        }
        if let Some(secs) = std::env::var("VI_TIMEOUT_SECS").ok().and_then(|s| s.parse().ok()) {
            config.timeout = Duration::from_secs(secs);
        }
        config.retry = RetryConfig::from_env();

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear() {
        for name in [
            "VI_LOCATION",
            "VI_ACCOUNT_ID",
            "VI_KEY",
            "VI_API_URL",
            "VI_CALLBACK_URL",
            "VI_TIMEOUT_SECS",
        ] {
            std::env::remove_var(name);
        }
    }

    #[test]
    #[serial]
    fn test_from_env_requires_key() {
        clear();
        std::env::set_var("VI_LOCATION", "trial");
        std::env::set_var("VI_ACCOUNT_ID", "acct");
        let err = IndexerConfig::from_env().unwrap_err();
        assert!(err.to_string().contains("VI_KEY"));
        clear();
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        clear();
        std::env::set_var("VI_LOCATION", "trial");
        std::env::set_var("VI_ACCOUNT_ID", "acct");
        std::env::set_var("VI_KEY", "secret");
        std::env::set_var("VI_CALLBACK_URL", "https://example.test/api/download-insights");

        let config = IndexerConfig::from_env().unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(
            config.callback_url.as_deref(),
            Some("https://example.test/api/download-insights")
        );
        assert!(!format!("{:?}", config).contains("secret"));
        clear();
    }

    #[test]
    fn test_api_url_trailing_slash() {
        let config =
            IndexerConfig::new("trial", "acct", "key").with_api_url("http://localhost:8080/");
        assert_eq!(config.api_url, "http://localhost:8080");
    }
}
