//! Shared domain types and configuration for the keyword monitoring pipeline.

pub mod app_config;
pub mod config;
pub mod monitoring;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use monitoring::{
    JobStatus, KeywordRecord, MarkerKind, MarkerStatus, MonitoringDocument, PendingMarker,
    SocialData, SocialJob, TIMED_OUT_MESSAGE,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
