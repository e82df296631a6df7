use std::net::SocketAddr;

use crate::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub news_base_url: String,
    pub news_max_articles: usize,
    /// Social provider base URL. Only collection and reconciliation need it.
    pub social_api_url: Option<String>,
    pub social_api_token: Option<String>,
    pub social_poll_interval_ms: u64,
    pub social_poll_max_attempts: u32,
    pub max_concurrent_keywords: usize,
    pub http_timeout_secs: u64,
    pub http_user_agent: String,
    pub http_max_retries: u32,
    pub http_retry_backoff_base_ms: u64,
    /// Cron expression for background reconciliation sweeps; `None` disables them.
    pub reconcile_cron: Option<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("news_base_url", &self.news_base_url)
            .field("news_max_articles", &self.news_max_articles)
            .field("social_api_url", &self.social_api_url)
            .field(
                "social_api_token",
                &self.social_api_token.as_ref().map(|_| "[redacted]"),
            )
            .field("social_poll_interval_ms", &self.social_poll_interval_ms)
            .field("social_poll_max_attempts", &self.social_poll_max_attempts)
            .field("max_concurrent_keywords", &self.max_concurrent_keywords)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("http_user_agent", &self.http_user_agent)
            .field("http_max_retries", &self.http_max_retries)
            .field(
                "http_retry_backoff_base_ms",
                &self.http_retry_backoff_base_ms,
            )
            .field("reconcile_cron", &self.reconcile_cron)
            .finish()
    }
}

impl AppConfig {
    /// Social provider URL and token, for the commands that talk to the provider.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] naming the first unset variable.
    pub fn social_credentials(&self) -> Result<(&str, &str), ConfigError> {
        let url = self
            .social_api_url
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnvVar("KWMON_SOCIAL_API_URL".to_string()))?;
        let token = self
            .social_api_token
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnvVar("KWMON_SOCIAL_API_TOKEN".to_string()))?;
        Ok((url, token))
    }
}
