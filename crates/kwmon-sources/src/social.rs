//! HTTP client for the asynchronous social-search provider.
//!
//! The provider runs one search job per submission. Callers submit a keyword,
//! poll `GET /search/{id}` until the job reaches a terminal status, then read
//! the payload from `GET /search/{id}/fetch`. Status checks and fetches are
//! idempotent and retried on transient errors; submissions are not.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::SourceError;
use crate::http::HttpSettings;
use crate::retry::retry_with_backoff;
use crate::types::{StatusReport, SubmitRequest, SubmitResponse};

/// Asynchronous social search keyed by opaque job ids.
#[async_trait]
pub trait SocialSearch: Send + Sync {
    /// Start a new search job for `keyword` and return its id.
    ///
    /// Not idempotent: every call creates a new job.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the job could not be created.
    async fn submit(&self, keyword: &str) -> Result<String, SourceError>;

    /// Read the current status of a job.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] on transport or decode failure.
    async fn check_status(&self, job_id: &str) -> Result<StatusReport, SourceError>;

    /// Read the result payload of a job. Only valid once the job reports `SUCCESS`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] on transport or decode failure.
    async fn fetch_result(&self, job_id: &str) -> Result<Value, SourceError>;
}

/// Bearer-authenticated client for the social-search REST API.
pub struct SocialSearchClient {
    client: Client,
    base_url: Url,
    token: String,
    max_retries: u32,
    retry_backoff_base_ms: u64,
}

impl SocialSearchClient {
    /// Creates a client for the provider rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::InvalidBaseUrl`] if `base_url` does not parse as
    /// a hierarchical URL, or [`SourceError::Http`] if the `reqwest::Client`
    /// cannot be constructed.
    pub fn new(base_url: &str, token: &str, settings: &HttpSettings) -> Result<Self, SourceError> {
        let parsed = Url::parse(base_url).map_err(|e| SourceError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;
        if parsed.cannot_be_a_base() {
            return Err(SourceError::InvalidBaseUrl {
                url: base_url.to_owned(),
                reason: "URL cannot be used as a base".to_owned(),
            });
        }

        Ok(Self {
            client: settings.build_client()?,
            base_url: parsed,
            token: token.to_owned(),
            max_retries: settings.max_retries,
            retry_backoff_base_ms: settings.retry_backoff_base_ms,
        })
    }

    /// Appends percent-encoded path segments to the base URL.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Checked in `new`: the base URL always has path segments.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            path.extend(segments);
        }
        url
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(&self.token)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        context: &str,
    ) -> Result<T, SourceError> {
        let response = self.authorized(request).send().await?;
        let status = response.status();
        let url = response.url().to_string();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(SourceError::RateLimited { url });
        }
        if !status.is_success() {
            return Err(SourceError::UnexpectedStatus {
                status: status.as_u16(),
                url,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| SourceError::Deserialize {
            context: context.to_owned(),
            source: e,
        })
    }
}

#[async_trait]
impl SocialSearch for SocialSearchClient {
    async fn submit(&self, keyword: &str) -> Result<String, SourceError> {
        let url = self.endpoint(&["search"]);
        let request = self.client.post(url).json(&SubmitRequest { query: keyword });
        let submitted: SubmitResponse = self
            .send_json(request, &format!("submit(keyword={keyword})"))
            .await?;

        if submitted.id.trim().is_empty() {
            return Err(SourceError::Provider(format!(
                "submission for '{keyword}' returned an empty job id"
            )));
        }

        tracing::debug!(keyword, job_id = %submitted.id, "social search submitted");
        Ok(submitted.id)
    }

    async fn check_status(&self, job_id: &str) -> Result<StatusReport, SourceError> {
        let url = self.endpoint(&["search", job_id]);
        let context = format!("check_status(id={job_id})");
        retry_with_backoff(self.max_retries, self.retry_backoff_base_ms, || {
            self.send_json::<StatusReport>(self.client.get(url.clone()), &context)
        })
        .await
    }

    async fn fetch_result(&self, job_id: &str) -> Result<Value, SourceError> {
        let url = self.endpoint(&["search", job_id, "fetch"]);
        let context = format!("fetch_result(id={job_id})");
        retry_with_backoff(self.max_retries, self.retry_backoff_base_ms, || {
            self.send_json::<Value>(self.client.get(url.clone()), &context)
        })
        .await
    }
}
