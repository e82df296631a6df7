//! Short-poll tracking of a single social-search job.

use std::time::Duration;

use kwmon_core::{JobStatus, SocialJob, TIMED_OUT_MESSAGE};
use kwmon_sources::SocialSearch;
use serde_json::Value;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);
const DEFAULT_POLL_ATTEMPTS: u32 = 10;

/// Bounded wait policy: at most `max_attempts` status checks, `interval` apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl PollPolicy {
    #[must_use]
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts: max_attempts.max(1),
        }
    }

    #[must_use]
    pub fn from_app_config(config: &kwmon_core::AppConfig) -> Self {
        Self::new(
            Duration::from_millis(config.social_poll_interval_ms),
            config.social_poll_max_attempts,
        )
    }

    /// Longest time spent sleeping before a job is declared timed out.
    #[must_use]
    pub fn budget(&self) -> Duration {
        self.interval
            .saturating_mul(self.max_attempts.saturating_sub(1))
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL, DEFAULT_POLL_ATTEMPTS)
    }
}

/// How a tracked job ended from the caller's point of view.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    /// The job succeeded and its payload was fetched.
    Completed(Value),
    /// The provider reported an explicit failure.
    Failed(String),
    /// Still unresolved when the budget ran out, or the payload fetch failed
    /// after `SUCCESS`. Either way a later sweep can finish the job.
    TimedOut(String),
}

/// Poll `job` until it reaches a terminal status or `policy` is exhausted.
///
/// The first status check happens immediately; later checks are separated by
/// `policy.interval`. A failed status check consumes an attempt and polling
/// carries on.
pub async fn track_job(
    social: &dyn SocialSearch,
    job: &mut SocialJob,
    policy: PollPolicy,
) -> JobOutcome {
    let attempts = policy.max_attempts.max(1);

    for attempt in 1..=attempts {
        match social.check_status(&job.id).await {
            Ok(report) => {
                job.observe(report.status);
                match report.status {
                    JobStatus::Success => return fetch_completed(social, job).await,
                    JobStatus::Failed => {
                        let message = report
                            .error
                            .filter(|e| !e.trim().is_empty())
                            .unwrap_or_else(|| "social search failed".to_string());
                        tracing::warn!(
                            keyword = %job.keyword,
                            job_id = %job.id,
                            error = %message,
                            "social search job failed"
                        );
                        return JobOutcome::Failed(message);
                    }
                    JobStatus::Pending | JobStatus::Processing => {
                        tracing::debug!(
                            keyword = %job.keyword,
                            job_id = %job.id,
                            attempt,
                            status = %report.status,
                            "social search still running"
                        );
                    }
                }
            }
            Err(e) => {
                tracing::warn!(
                    keyword = %job.keyword,
                    job_id = %job.id,
                    attempt,
                    error = %e,
                    "social status check failed"
                );
            }
        }

        if attempt < attempts {
            tokio::time::sleep(policy.interval).await;
        }
    }

    tracing::info!(
        keyword = %job.keyword,
        job_id = %job.id,
        attempts,
        "social search poll budget exhausted"
    );
    JobOutcome::TimedOut(TIMED_OUT_MESSAGE.to_string())
}

async fn fetch_completed(social: &dyn SocialSearch, job: &SocialJob) -> JobOutcome {
    match social.fetch_result(&job.id).await {
        Ok(payload) => JobOutcome::Completed(payload),
        Err(e) => {
            tracing::warn!(
                keyword = %job.keyword,
                job_id = %job.id,
                error = %e,
                "social result fetch failed after SUCCESS"
            );
            JobOutcome::TimedOut(format!("result fetch failed: {e}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::fakes::{FakeSocial, StatusStep};

    fn fast_policy(max_attempts: u32) -> PollPolicy {
        PollPolicy::new(Duration::ZERO, max_attempts)
    }

    #[tokio::test]
    async fn completes_when_job_succeeds_within_budget() {
        let social = FakeSocial::new()
            .status("J1", [StatusStep::Pending, StatusStep::Processing, StatusStep::Success])
            .payload("J1", json!({"mentions": 5}));
        let mut job = SocialJob::new("J1", "acme");

        let outcome = track_job(&social, &mut job, fast_policy(5)).await;

        assert_eq!(outcome, JobOutcome::Completed(json!({"mentions": 5})));
        assert_eq!(job.status, JobStatus::Success);
        assert_eq!(social.status_calls("J1"), 3);
    }

    #[tokio::test]
    async fn reports_provider_failure() {
        let social =
            FakeSocial::new().status("J1", [StatusStep::Failed(Some("quota exhausted".into()))]);
        let mut job = SocialJob::new("J1", "acme");

        let outcome = track_job(&social, &mut job, fast_policy(5)).await;

        assert_eq!(outcome, JobOutcome::Failed("quota exhausted".to_string()));
        assert_eq!(social.fetch_calls("J1"), 0);
    }

    #[tokio::test]
    async fn failure_without_message_gets_default_text() {
        let social = FakeSocial::new().status("J1", [StatusStep::Failed(None)]);
        let mut job = SocialJob::new("J1", "acme");

        let outcome = track_job(&social, &mut job, fast_policy(1)).await;
        assert_eq!(outcome, JobOutcome::Failed("social search failed".to_string()));
    }

    #[tokio::test]
    async fn times_out_after_exactly_max_attempts() {
        let social = FakeSocial::new().status("J2", [StatusStep::Pending]);
        let mut job = SocialJob::new("J2", "beta");

        let outcome = track_job(&social, &mut job, fast_policy(4)).await;

        assert_eq!(outcome, JobOutcome::TimedOut(TIMED_OUT_MESSAGE.to_string()));
        assert_eq!(social.status_calls("J2"), 4);
    }

    #[tokio::test]
    async fn status_errors_consume_attempts_without_aborting() {
        let social = FakeSocial::new()
            .status("J1", [StatusStep::Error, StatusStep::Success])
            .payload("J1", json!({"mentions": 1}));
        let mut job = SocialJob::new("J1", "acme");

        let outcome = track_job(&social, &mut job, fast_policy(3)).await;

        assert_eq!(outcome, JobOutcome::Completed(json!({"mentions": 1})));
        assert_eq!(social.status_calls("J1"), 2);
    }

    #[tokio::test]
    async fn fetch_failure_after_success_is_retriable_timeout() {
        let social = FakeSocial::new().status("J1", [StatusStep::Success]);
        let mut job = SocialJob::new("J1", "acme");

        let outcome = track_job(&social, &mut job, fast_policy(3)).await;

        assert!(
            matches!(outcome, JobOutcome::TimedOut(ref m) if m.starts_with("result fetch failed")),
            "got {outcome:?}"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn sleeps_interval_between_checks_only() {
        let social = FakeSocial::new().status("J1", [StatusStep::Pending]);
        let mut job = SocialJob::new("J1", "acme");
        let policy = PollPolicy::new(Duration::from_secs(2), 3);

        let started = tokio::time::Instant::now();
        let outcome = track_job(&social, &mut job, policy).await;

        let elapsed = started.elapsed();
        assert!(matches!(outcome, JobOutcome::TimedOut(_)));
        assert_eq!(policy.budget(), Duration::from_secs(4));
        assert!(elapsed >= policy.budget(), "elapsed {elapsed:?}");
        assert!(elapsed < policy.budget() + Duration::from_secs(1), "elapsed {elapsed:?}");
    }

    #[test]
    fn zero_attempts_is_clamped_to_one() {
        let policy = PollPolicy::new(Duration::from_millis(10), 0);
        assert_eq!(policy.max_attempts, 1);
        assert_eq!(policy.budget(), Duration::ZERO);
    }
}
