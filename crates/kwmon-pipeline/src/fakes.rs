//! Scripted in-memory adapters for pipeline tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use kwmon_core::JobStatus;
use kwmon_sources::{NewsSource, SocialSearch, SourceError, StatusReport};
use serde_json::{json, Value};

#[derive(Debug, Clone)]
pub(crate) enum StatusStep {
    Pending,
    Processing,
    Success,
    Failed(Option<String>),
    Error,
}

impl StatusStep {
    fn report(&self) -> Result<StatusReport, SourceError> {
        let (status, error) = match self {
            StatusStep::Pending => (JobStatus::Pending, None),
            StatusStep::Processing => (JobStatus::Processing, None),
            StatusStep::Success => (JobStatus::Success, None),
            StatusStep::Failed(message) => (JobStatus::Failed, message.clone()),
            StatusStep::Error => {
                return Err(SourceError::Provider("scripted status error".to_string()))
            }
        };
        Ok(StatusReport { status, error })
    }
}

/// Social provider whose answers are scripted per keyword and job id.
///
/// Status scripts are consumed one step per call; the last step repeats.
#[derive(Default)]
pub(crate) struct FakeSocial {
    jobs: HashMap<String, String>,
    status_delays: HashMap<String, Duration>,
    statuses: Mutex<HashMap<String, VecDeque<StatusStep>>>,
    payloads: Mutex<HashMap<String, Value>>,
    submit_calls: Mutex<HashMap<String, usize>>,
    status_calls: Mutex<HashMap<String, usize>>,
    fetch_calls: Mutex<HashMap<String, usize>>,
}

impl FakeSocial {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Submitting `keyword` yields `job_id`. Unscripted keywords fail to submit.
    pub(crate) fn job(mut self, keyword: &str, job_id: &str) -> Self {
        self.jobs.insert(keyword.to_string(), job_id.to_string());
        self
    }

    /// Every status check for `job_id` takes `delay` before answering.
    pub(crate) fn status_delay(mut self, job_id: &str, delay: Duration) -> Self {
        self.status_delays.insert(job_id.to_string(), delay);
        self
    }

    pub(crate) fn status(self, job_id: &str, steps: impl IntoIterator<Item = StatusStep>) -> Self {
        self.set_status(job_id, steps);
        self
    }

    pub(crate) fn payload(self, job_id: &str, payload: Value) -> Self {
        self.set_payload(job_id, payload);
        self
    }

    pub(crate) fn set_status(&self, job_id: &str, steps: impl IntoIterator<Item = StatusStep>) {
        self.statuses
            .lock()
            .unwrap()
            .insert(job_id.to_string(), steps.into_iter().collect());
    }

    pub(crate) fn set_payload(&self, job_id: &str, payload: Value) {
        self.payloads
            .lock()
            .unwrap()
            .insert(job_id.to_string(), payload);
    }

    pub(crate) fn submit_calls(&self, keyword: &str) -> usize {
        count(&self.submit_calls, keyword)
    }

    pub(crate) fn status_calls(&self, job_id: &str) -> usize {
        count(&self.status_calls, job_id)
    }

    pub(crate) fn fetch_calls(&self, job_id: &str) -> usize {
        count(&self.fetch_calls, job_id)
    }

    pub(crate) fn total_status_calls(&self) -> usize {
        self.status_calls.lock().unwrap().values().sum()
    }
}

fn count(map: &Mutex<HashMap<String, usize>>, key: &str) -> usize {
    map.lock().unwrap().get(key).copied().unwrap_or(0)
}

fn bump(map: &Mutex<HashMap<String, usize>>, key: &str) {
    *map.lock().unwrap().entry(key.to_string()).or_insert(0) += 1;
}

#[async_trait]
impl SocialSearch for FakeSocial {
    async fn submit(&self, keyword: &str) -> Result<String, SourceError> {
        bump(&self.submit_calls, keyword);
        self.jobs
            .get(keyword)
            .cloned()
            .ok_or_else(|| SourceError::Provider(format!("submission rejected for {keyword}")))
    }

    async fn check_status(&self, job_id: &str) -> Result<StatusReport, SourceError> {
        bump(&self.status_calls, job_id);
        if let Some(delay) = self.status_delays.get(job_id) {
            tokio::time::sleep(*delay).await;
        }
        let mut statuses = self.statuses.lock().unwrap();
        let Some(steps) = statuses.get_mut(job_id) else {
            return Ok(StatusReport {
                status: JobStatus::Pending,
                error: None,
            });
        };
        let step = if steps.len() > 1 {
            steps.pop_front()
        } else {
            steps.front().cloned()
        };
        step.unwrap_or(StatusStep::Pending).report()
    }

    async fn fetch_result(&self, job_id: &str) -> Result<Value, SourceError> {
        bump(&self.fetch_calls, job_id);
        self.payloads
            .lock()
            .unwrap()
            .get(job_id)
            .cloned()
            .ok_or_else(|| SourceError::Provider(format!("no payload for {job_id}")))
    }
}

/// News provider that succeeds for every keyword except the failing ones.
#[derive(Default)]
pub(crate) struct FakeNews {
    failing: HashSet<String>,
    delays: HashMap<String, Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeNews {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn failing(mut self, keyword: &str) -> Self {
        self.failing.insert(keyword.to_string());
        self
    }

    pub(crate) fn delay(mut self, keyword: &str, delay: Duration) -> Self {
        self.delays.insert(keyword.to_string(), delay);
        self
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NewsSource for FakeNews {
    async fn search(&self, keyword: &str) -> Result<Value, SourceError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = self
            .delays
            .get(keyword)
            .copied()
            .unwrap_or(Duration::from_millis(10));
        tokio::time::sleep(delay).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.contains(keyword) {
            return Err(SourceError::Provider(format!("news outage for {keyword}")));
        }
        Ok(json!({"keyword": keyword, "articles": [{"title": format!("{keyword} news")}]}))
    }
}
