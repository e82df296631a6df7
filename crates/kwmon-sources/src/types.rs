use kwmon_core::JobStatus;
use serde::{Deserialize, Serialize};

/// Body of `GET /search/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StatusReport {
    pub status: JobStatus,
    /// Provider error text, only meaningful when `status` is `FAILED`.
    #[serde(default)]
    pub error: Option<String>,
}

/// Body of `POST /search`.
#[derive(Debug, Deserialize)]
pub(crate) struct SubmitResponse {
    pub id: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmitRequest<'a> {
    pub query: &'a str,
}

/// One news item extracted from an RSS feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewsArticle {
    pub title: String,
    pub url: String,
    pub description: String,
    pub published: Option<String>,
}
