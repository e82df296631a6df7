use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can drive it with a `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let database_url = require("DATABASE_URL")?;
    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let social_api_url = optional("KWMON_SOCIAL_API_URL");
    let social_api_token = optional("KWMON_SOCIAL_API_TOKEN");

    let env = parse_environment(&or_default("KWMON_ENV", "development"))?;

    let bind_addr = or_default("KWMON_BIND_ADDR", "0.0.0.0:3000")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("KWMON_BIND_ADDR", e.to_string()))?;
    let log_level = or_default("KWMON_LOG_LEVEL", "info");

    let db_max_connections = parse_u32("KWMON_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("KWMON_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("KWMON_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let news_base_url = or_default("KWMON_NEWS_BASE_URL", "https://news.google.com");
    let news_max_articles = parse_usize("KWMON_NEWS_MAX_ARTICLES", "25")?;

    let social_poll_interval_ms = parse_u64("KWMON_SOCIAL_POLL_INTERVAL_MS", "3000")?;
    let social_poll_max_attempts = parse_u32("KWMON_SOCIAL_POLL_MAX_ATTEMPTS", "10")?;
    if social_poll_max_attempts == 0 {
        return Err(invalid(
            "KWMON_SOCIAL_POLL_MAX_ATTEMPTS",
            "must be at least 1".to_string(),
        ));
    }

    let max_concurrent_keywords = parse_usize("KWMON_MAX_CONCURRENT_KEYWORDS", "4")?;
    if max_concurrent_keywords == 0 {
        return Err(invalid(
            "KWMON_MAX_CONCURRENT_KEYWORDS",
            "must be at least 1".to_string(),
        ));
    }

    let http_timeout_secs = parse_u64("KWMON_HTTP_TIMEOUT_SECS", "30")?;
    let http_user_agent = or_default("KWMON_HTTP_USER_AGENT", "kwmon/0.1 (keyword-monitoring)");
    let http_max_retries = parse_u32("KWMON_HTTP_MAX_RETRIES", "3")?;
    let http_retry_backoff_base_ms = parse_u64("KWMON_HTTP_RETRY_BACKOFF_BASE_MS", "500")?;

    let reconcile_cron = optional("KWMON_RECONCILE_CRON");

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        news_base_url,
        news_max_articles,
        social_api_url,
        social_api_token,
        social_poll_interval_ms,
        social_poll_max_attempts,
        max_concurrent_keywords,
        http_timeout_secs,
        http_user_agent,
        http_max_retries,
        http_retry_backoff_base_ms,
        reconcile_cron,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "KWMON_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
