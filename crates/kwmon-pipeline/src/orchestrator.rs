//! Fan-out of the keyword collector over a user's keyword set.

use futures::future::BoxFuture;
use futures::stream::{self, StreamExt};
use kwmon_core::{KeywordRecord, MarkerStatus, MonitoringDocument, SocialData};
use kwmon_sources::{NewsSource, SocialSearch};
use serde::Serialize;

use crate::collector::collect_keyword;
use crate::error::PipelineError;
use crate::tracker::PollPolicy;

const DEFAULT_MAX_CONCURRENT: usize = 4;

/// Knobs for one collection run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectOptions {
    pub poll: PollPolicy,
    /// Upper bound on keywords collected at the same time.
    pub max_concurrent: usize,
}

impl CollectOptions {
    #[must_use]
    pub fn from_app_config(config: &kwmon_core::AppConfig) -> Self {
        Self {
            poll: PollPolicy::from_app_config(config),
            max_concurrent: config.max_concurrent_keywords,
        }
    }
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            poll: PollPolicy::default(),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
        }
    }
}

/// Collect every keyword and assemble the resulting document.
///
/// Collectors run concurrently, at most `options.max_concurrent` at a time.
/// Records come back in the order of `keywords`, whatever order the
/// collectors finish in.
///
/// # Errors
///
/// Returns [`PipelineError::NoKeywords`] for an empty list and
/// [`PipelineError::InvalidKeyword`] if any keyword is blank. Per-keyword
/// adapter failures never fail the run.
pub async fn collect_all(
    news: &dyn NewsSource,
    social: &dyn SocialSearch,
    options: CollectOptions,
    keywords: &[String],
) -> Result<MonitoringDocument, PipelineError> {
    if keywords.is_empty() {
        return Err(PipelineError::NoKeywords);
    }
    if let Some(index) = keywords.iter().position(|k| k.trim().is_empty()) {
        return Err(PipelineError::InvalidKeyword { index });
    }

    let max_concurrent = options.max_concurrent.max(1);
    let tasks: Vec<BoxFuture<'_, (usize, KeywordRecord)>> = keywords
        .iter()
        .enumerate()
        .map(|(index, keyword)| -> BoxFuture<'_, (usize, KeywordRecord)> {
            Box::pin(async move {
                let record = collect_keyword(news, social, options.poll, keyword).await;
                (index, record)
            })
        })
        .collect();
    let mut results: Vec<(usize, KeywordRecord)> = stream::iter(tasks)
        .buffer_unordered(max_concurrent)
        .collect()
        .await;

    results.sort_by_key(|(index, _)| *index);
    let document = MonitoringDocument::new(results.into_iter().map(|(_, r)| r).collect());

    let summary = CollectionSummary::from_document(&document);
    tracing::info!(
        keywords = summary.keywords,
        social_completed = summary.social_completed,
        social_timed_out = summary.social_timed_out,
        social_failed = summary.social_failed,
        news_failed = summary.news_failed,
        "collection finished"
    );

    Ok(document)
}

/// Outcome counts for one collected document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CollectionSummary {
    pub keywords: usize,
    pub social_completed: usize,
    pub social_timed_out: usize,
    pub social_failed: usize,
    pub news_failed: usize,
}

impl CollectionSummary {
    #[must_use]
    pub fn from_document(document: &MonitoringDocument) -> Self {
        let mut summary = Self {
            keywords: document.len(),
            ..Self::default()
        };
        for record in &document.keyword_records {
            match &record.social_data {
                SocialData::Completed(_) => summary.social_completed += 1,
                SocialData::Pending(marker) => match marker.status {
                    MarkerStatus::TimedOut => summary.social_timed_out += 1,
                    MarkerStatus::Failed => summary.social_failed += 1,
                },
            }
            if record.news_data.is_none() {
                summary.news_failed += 1;
            }
        }
        summary
    }
}
