//! Shared HTTP client settings for the source adapters.

use std::time::Duration;

use reqwest::Client;

use crate::error::SourceError;

/// Transport settings shared by every adapter.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub timeout_secs: u64,
    pub user_agent: String,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
}

impl HttpSettings {
    #[must_use]
    pub fn from_app_config(config: &kwmon_core::AppConfig) -> Self {
        Self {
            timeout_secs: config.http_timeout_secs,
            user_agent: config.http_user_agent.clone(),
            max_retries: config.http_max_retries,
            retry_backoff_base_ms: config.http_retry_backoff_base_ms,
        }
    }

    /// Builds a `reqwest::Client` with the configured timeout and user agent.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the client cannot be constructed.
    pub fn build_client(&self) -> Result<Client, SourceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(self.user_agent.as_str())
            .build()?;
        Ok(client)
    }
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: "kwmon/0.1 (keyword-monitoring)".to_string(),
            max_retries: 3,
            retry_backoff_base_ms: 500,
        }
    }
}
