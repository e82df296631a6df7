//! Per-keyword collection: one news fetch plus one tracked social job.

use kwmon_core::{KeywordRecord, PendingMarker, SocialData, SocialJob};
use kwmon_sources::{NewsSource, SocialSearch};

use crate::tracker::{track_job, JobOutcome, PollPolicy};

/// Build the record for one keyword. Never fails.
///
/// A news failure leaves `news_data` empty. A submission failure yields a
/// `FAILED` marker with no job id. Otherwise the job is short-polled under
/// `policy` and the record carries the job id regardless of the outcome.
pub async fn collect_keyword(
    news: &dyn NewsSource,
    social: &dyn SocialSearch,
    policy: PollPolicy,
    keyword: &str,
) -> KeywordRecord {
    let news_data = match news.search(keyword).await {
        Ok(document) => Some(document),
        Err(e) => {
            tracing::warn!(keyword, error = %e, "news fetch failed");
            None
        }
    };

    let job_id = match social.submit(keyword).await {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!(keyword, error = %e, "social search submission failed");
            let marker = PendingMarker::failed(e.to_string(), None);
            return KeywordRecord::new(keyword, news_data, SocialData::Pending(marker), None);
        }
    };

    let mut job = SocialJob::new(job_id.clone(), keyword);
    let social_data = match track_job(social, &mut job, policy).await {
        JobOutcome::Completed(payload) => SocialData::Completed(payload),
        JobOutcome::Failed(message) => {
            SocialData::Pending(PendingMarker::failed(message, Some(job_id.clone())))
        }
        JobOutcome::TimedOut(message) => {
            SocialData::Pending(PendingMarker::timed_out(message, job_id.clone()))
        }
    };

    KeywordRecord::new(keyword, news_data, social_data, Some(job_id))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use kwmon_core::{MarkerStatus, TIMED_OUT_MESSAGE};
    use serde_json::json;

    use super::*;
    use crate::fakes::{FakeNews, FakeSocial, StatusStep};

    fn policy() -> PollPolicy {
        PollPolicy::new(Duration::ZERO, 3)
    }

    #[tokio::test]
    async fn completed_job_embeds_payload() {
        let news = FakeNews::new();
        let social = FakeSocial::new()
            .job("acme", "J1")
            .status("J1", [StatusStep::Processing, StatusStep::Success])
            .payload("J1", json!({"mentions": 5}));

        let record = collect_keyword(&news, &social, policy(), "acme").await;

        assert_eq!(record.keyword, "acme");
        assert!(record.news_data.is_some());
        assert_eq!(record.social_data, SocialData::Completed(json!({"mentions": 5})));
        assert_eq!(record.social_search_id.as_deref(), Some("J1"));
        assert_eq!(social.submit_calls("acme"), 1);
    }

    #[tokio::test]
    async fn news_failure_does_not_block_social() {
        let news = FakeNews::new().failing("acme");
        let social = FakeSocial::new()
            .job("acme", "J1")
            .status("J1", [StatusStep::Success])
            .payload("J1", json!({"mentions": 1}));

        let record = collect_keyword(&news, &social, policy(), "acme").await;

        assert!(record.news_data.is_none());
        assert_eq!(record.social_data.payload(), Some(&json!({"mentions": 1})));
    }

    #[tokio::test]
    async fn submission_failure_is_failed_marker_without_job_id() {
        let news = FakeNews::new();
        let social = FakeSocial::new();

        let record = collect_keyword(&news, &social, policy(), "acme").await;

        let marker = record.social_data.marker().expect("marker expected");
        assert_eq!(marker.status, MarkerStatus::Failed);
        assert!(marker.job_id.is_none());
        assert!(record.social_search_id.is_none());
        assert!(record.news_data.is_some());
        assert_eq!(social.total_status_calls(), 0);
    }

    #[tokio::test]
    async fn provider_failure_keeps_job_id() {
        let news = FakeNews::new();
        let social = FakeSocial::new()
            .job("acme", "J1")
            .status("J1", [StatusStep::Failed(Some("quota exhausted".into()))]);

        let record = collect_keyword(&news, &social, policy(), "acme").await;

        assert_eq!(
            record.social_data,
            SocialData::Pending(PendingMarker::failed("quota exhausted", Some("J1".into())))
        );
        assert_eq!(record.social_search_id.as_deref(), Some("J1"));
        assert_eq!(record.reconcilable_job_id(), None);
    }

    #[tokio::test]
    async fn exhausted_budget_leaves_reconcilable_marker() {
        let news = FakeNews::new();
        let social = FakeSocial::new()
            .job("beta", "J2")
            .status("J2", [StatusStep::Pending]);

        let record = collect_keyword(&news, &social, policy(), "beta").await;

        assert_eq!(
            record.social_data,
            SocialData::Pending(PendingMarker::timed_out(TIMED_OUT_MESSAGE, "J2".into()))
        );
        assert_eq!(record.reconcilable_job_id(), Some("J2"));
        assert_eq!(social.status_calls("J2"), 3);
        assert_eq!(social.submit_calls("beta"), 1);
    }
}
