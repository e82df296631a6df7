//! Monitoring document model.
//!
//! A [`MonitoringDocument`] is the per-user snapshot produced by a collection
//! run: one [`KeywordRecord`] per requested keyword, in collection order. Social
//! data is either the provider's completed payload or a [`PendingMarker`]
//! describing why it is missing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Marker message written when a social job outlives its poll budget.
pub const TIMED_OUT_MESSAGE: &str = "request timed out";

/// Lifecycle status reported by the social-search provider for one job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Pending,
    Processing,
    Success,
    Failed,
}

impl JobStatus {
    /// `true` once the provider will not move the job any further.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Success | JobStatus::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "PENDING"),
            JobStatus::Processing => write!(f, "PROCESSING"),
            JobStatus::Success => write!(f, "SUCCESS"),
            JobStatus::Failed => write!(f, "FAILED"),
        }
    }
}

/// Why a record holds a marker instead of social data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarkerStatus {
    /// Terminal. Submission failed or the provider reported an error.
    Failed,
    /// The poll budget ran out; a later sweep may still resolve the job.
    TimedOut,
}

/// Discriminant carried by every stored marker.
///
/// Decoding requires it, so a provider payload that happens to have
/// `status`/`message`/`jobId` fields is never read back as a marker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarkerKind {
    #[default]
    #[serde(rename = "pendingMarker")]
    PendingMarker,
}

/// Sentinel stored in place of social data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PendingMarker {
    pub kind: MarkerKind,
    pub status: MarkerStatus,
    pub message: String,
    pub job_id: Option<String>,
}

impl PendingMarker {
    #[must_use]
    pub fn failed(message: impl Into<String>, job_id: Option<String>) -> Self {
        Self {
            kind: MarkerKind::PendingMarker,
            status: MarkerStatus::Failed,
            message: message.into(),
            job_id,
        }
    }

    #[must_use]
    pub fn timed_out(message: impl Into<String>, job_id: String) -> Self {
        Self {
            kind: MarkerKind::PendingMarker,
            status: MarkerStatus::TimedOut,
            message: message.into(),
            job_id: Some(job_id),
        }
    }

    #[must_use]
    pub fn is_timed_out(&self) -> bool {
        self.status == MarkerStatus::TimedOut
    }
}

/// Social payload for a keyword, or the marker explaining its absence.
///
/// Markers are tried first when decoding. A value only decodes as a marker
/// when it carries `"kind": "pendingMarker"` and no other unknown fields, so
/// provider payloads stay on the `Completed` arm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SocialData {
    Pending(PendingMarker),
    Completed(Value),
}

impl SocialData {
    #[must_use]
    pub fn marker(&self) -> Option<&PendingMarker> {
        match self {
            SocialData::Pending(marker) => Some(marker),
            SocialData::Completed(_) => None,
        }
    }

    #[must_use]
    pub fn payload(&self) -> Option<&Value> {
        match self {
            SocialData::Completed(payload) => Some(payload),
            SocialData::Pending(_) => None,
        }
    }
}

/// One keyword's monitoring snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordRecord {
    /// Stable per-record id, assigned at creation and kept through reconciliation.
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub keyword: String,
    /// `None` only when the news fetch failed.
    pub news_data: Option<Value>,
    pub social_data: SocialData,
    pub social_search_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl KeywordRecord {
    #[must_use]
    pub fn new(
        keyword: impl Into<String>,
        news_data: Option<Value>,
        social_data: SocialData,
        social_search_id: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            keyword: keyword.into(),
            news_data,
            social_data,
            social_search_id,
            timestamp: Utc::now(),
        }
    }

    /// Job id to re-poll, if this record is waiting on a timed-out job.
    ///
    /// `FAILED` markers and records with no search id are never eligible.
    #[must_use]
    pub fn reconcilable_job_id(&self) -> Option<&str> {
        match self.social_data.marker() {
            Some(marker) if marker.is_timed_out() => self.social_search_id.as_deref(),
            _ => None,
        }
    }

    /// Swap in the completed payload and bump the timestamp. Other fields stay put.
    pub fn resolve_social(&mut self, payload: Value) {
        self.social_data = SocialData::Completed(payload);
        self.timestamp = Utc::now();
    }
}

/// Per-user collection of keyword records, in collection order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitoringDocument {
    #[serde(default)]
    pub keyword_records: Vec<KeywordRecord>,
}

impl MonitoringDocument {
    #[must_use]
    pub fn new(keyword_records: Vec<KeywordRecord>) -> Self {
        Self { keyword_records }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keyword_records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keyword_records.is_empty()
    }

    /// Number of records a reconciliation sweep would re-check.
    #[must_use]
    pub fn reconcilable_count(&self) -> usize {
        self.keyword_records
            .iter()
            .filter(|r| r.reconcilable_job_id().is_some())
            .count()
    }
}

/// In-flight social search. Lives only for the duration of one poll loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocialJob {
    pub id: String,
    pub status: JobStatus,
    pub keyword: String,
}

impl SocialJob {
    #[must_use]
    pub fn new(id: impl Into<String>, keyword: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: JobStatus::Pending,
            keyword: keyword.into(),
        }
    }

    /// Record the latest observed status. Terminal states are sticky.
    pub fn observe(&mut self, status: JobStatus) {
        if !self.status.is_terminal() {
            self.status = status;
        }
    }
}
