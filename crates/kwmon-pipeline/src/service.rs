//! User-scoped entry points that bind the pipeline to a [`MonitoringStore`].

use std::sync::Arc;

use kwmon_core::{AppConfig, MonitoringDocument};
use kwmon_sources::{
    GoogleNewsClient, HttpSettings, NewsSource, SocialSearch, SocialSearchClient, SourceError,
};
use serde::Serialize;
use uuid::Uuid;

use crate::error::PipelineError;
use crate::orchestrator::{collect_all, CollectOptions, CollectionSummary};
use crate::store::{MonitoringStore, RunType, WriterLease};
use crate::sweeper::reconcile;

/// A freshly collected document and its outcome counts.
#[derive(Debug, Clone, Serialize)]
pub struct CollectionReport {
    pub document: MonitoringDocument,
    pub summary: CollectionSummary,
}

/// Result of sweeping one user's document.
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileOutcome {
    pub document: MonitoringDocument,
    pub changed: bool,
    /// Timed-out records that now hold a completed payload.
    pub resolved: usize,
}

/// Totals for a sweep over every stored document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepTotals {
    pub users: usize,
    pub changed_users: usize,
    pub resolved: usize,
    pub failed_users: usize,
}

pub struct MonitoringService {
    store: Arc<dyn MonitoringStore>,
    news: Arc<dyn NewsSource>,
    social: Arc<dyn SocialSearch>,
    options: CollectOptions,
}

impl MonitoringService {
    #[must_use]
    pub fn new(
        store: Arc<dyn MonitoringStore>,
        news: Arc<dyn NewsSource>,
        social: Arc<dyn SocialSearch>,
        options: CollectOptions,
    ) -> Self {
        Self {
            store,
            news,
            social,
            options,
        }
    }

    /// Wire the production HTTP adapters from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the social provider is not configured,
    /// either HTTP client cannot be built or the social API URL is not a
    /// usable base URL.
    pub fn from_app_config(
        config: &AppConfig,
        store: Arc<dyn MonitoringStore>,
    ) -> Result<Self, SourceError> {
        let settings = HttpSettings::from_app_config(config);
        let news = GoogleNewsClient::new(&config.news_base_url, config.news_max_articles, &settings)?;
        let (social_url, social_token) = config.social_credentials()?;
        let social = SocialSearchClient::new(social_url, social_token, &settings)?;
        Ok(Self::new(
            store,
            Arc::new(news),
            Arc::new(social),
            CollectOptions::from_app_config(config),
        ))
    }

    /// Collect every active keyword for `user_id` and replace the stored document.
    ///
    /// Runs under the store's writer lease for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::NoKeywords`] when the user has no active
    /// keywords and [`PipelineError::Store`] when the lease cannot be taken,
    /// the keyword list cannot be read or the document cannot be written.
    pub async fn collect_for_user(
        &self,
        user_id: Uuid,
        trigger: &str,
    ) -> Result<CollectionReport, PipelineError> {
        let lease = self.lock_user(user_id).await?;
        let result = self.collect_locked(user_id, trigger).await;
        release_lease(user_id, lease).await;
        result
    }

    async fn collect_locked(
        &self,
        user_id: Uuid,
        trigger: &str,
    ) -> Result<CollectionReport, PipelineError> {
        let keywords = self
            .store
            .list_keywords(user_id)
            .await
            .map_err(PipelineError::Store)?;
        if keywords.is_empty() {
            return Err(PipelineError::NoKeywords);
        }

        let run_id = self.begin_run_best_effort(user_id, RunType::Collect, trigger).await;

        let result = self.collect_and_store(user_id, &keywords).await;
        match &result {
            Ok(report) => {
                self.complete_run_best_effort(run_id, report.document.len())
                    .await;
            }
            Err(e) => self.fail_run_best_effort(run_id, &e.to_string()).await,
        }
        result
    }

    async fn collect_and_store(
        &self,
        user_id: Uuid,
        keywords: &[String],
    ) -> Result<CollectionReport, PipelineError> {
        let document = collect_all(
            self.news.as_ref(),
            self.social.as_ref(),
            self.options,
            keywords,
        )
        .await?;

        self.store
            .replace_document(user_id, &document)
            .await
            .map_err(PipelineError::Store)?;

        let summary = CollectionSummary::from_document(&document);
        tracing::info!(
            %user_id,
            keywords = summary.keywords,
            timed_out = summary.social_timed_out,
            "monitoring document replaced"
        );
        Ok(CollectionReport { document, summary })
    }

    /// Sweep the user's stored document and persist it only if a job resolved.
    ///
    /// A user without a document gets an empty one back and nothing is written.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Store`] on load or write failure.
    pub async fn reconcile_for_user(
        &self,
        user_id: Uuid,
        trigger: &str,
    ) -> Result<ReconcileOutcome, PipelineError> {
        let lease = self.lock_user(user_id).await?;
        let result = self.reconcile_locked(user_id, trigger).await;
        release_lease(user_id, lease).await;
        result
    }

    async fn reconcile_locked(
        &self,
        user_id: Uuid,
        trigger: &str,
    ) -> Result<ReconcileOutcome, PipelineError> {
        let Some(document) = self
            .store
            .load_document(user_id)
            .await
            .map_err(PipelineError::Store)?
        else {
            return Ok(ReconcileOutcome {
                document: MonitoringDocument::default(),
                changed: false,
                resolved: 0,
            });
        };

        let pending = document.reconcilable_count();
        if pending == 0 {
            return Ok(ReconcileOutcome {
                document,
                changed: false,
                resolved: 0,
            });
        }

        let run_id = self
            .begin_run_best_effort(user_id, RunType::Reconcile, trigger)
            .await;
        let (document, changed) = reconcile(self.social.as_ref(), document).await;
        let resolved = pending.saturating_sub(document.reconcilable_count());

        if changed {
            if let Err(e) = self.store.replace_document(user_id, &document).await {
                let err = PipelineError::Store(e);
                self.fail_run_best_effort(run_id, &err.to_string()).await;
                return Err(err);
            }
        }
        self.complete_run_best_effort(run_id, resolved).await;

        tracing::info!(%user_id, pending, resolved, changed, "reconciliation sweep finished");
        Ok(ReconcileOutcome {
            document,
            changed,
            resolved,
        })
    }

    /// Read-only view of the stored document.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Store`] on load failure.
    pub async fn document_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Option<MonitoringDocument>, PipelineError> {
        self.store
            .load_document(user_id)
            .await
            .map_err(PipelineError::Store)
    }

    /// Sweep every stored document. One user's failure does not stop the rest.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Store`] only if the owner list cannot be read.
    pub async fn reconcile_all(&self, trigger: &str) -> Result<SweepTotals, PipelineError> {
        let owners = self
            .store
            .list_document_owners()
            .await
            .map_err(PipelineError::Store)?;

        let mut totals = SweepTotals {
            users: owners.len(),
            ..SweepTotals::default()
        };
        for user_id in owners {
            match self.reconcile_for_user(user_id, trigger).await {
                Ok(outcome) => {
                    if outcome.changed {
                        totals.changed_users += 1;
                    }
                    totals.resolved += outcome.resolved;
                }
                Err(e) => {
                    tracing::error!(%user_id, error = %e, "reconciliation failed for user");
                    totals.failed_users += 1;
                }
            }
        }
        Ok(totals)
    }

    async fn lock_user(&self, user_id: Uuid) -> Result<Box<dyn WriterLease>, PipelineError> {
        self.store
            .lock_user(user_id)
            .await
            .map_err(PipelineError::Store)
    }

    async fn begin_run_best_effort(
        &self,
        user_id: Uuid,
        run_type: RunType,
        trigger: &str,
    ) -> Option<i64> {
        match self.store.begin_run(user_id, run_type, trigger).await {
            Ok(run_id) => run_id,
            Err(e) => {
                tracing::warn!(
                    %user_id,
                    run_type = run_type.as_str(),
                    error = %e,
                    "failed to open run ledger entry"
                );
                None
            }
        }
    }

    async fn complete_run_best_effort(&self, run_id: Option<i64>, records: usize) {
        let Some(run_id) = run_id else { return };
        let records = i32::try_from(records).unwrap_or(i32::MAX);
        if let Err(e) = self.store.complete_run(run_id, records).await {
            tracing::error!(run_id, error = %e, "failed to mark run succeeded");
        }
    }

    async fn fail_run_best_effort(&self, run_id: Option<i64>, message: &str) {
        let Some(run_id) = run_id else { return };
        if let Err(e) = self.store.fail_run(run_id, message).await {
            tracing::error!(run_id, error = %e, "failed to mark run failed");
        }
    }
}

async fn release_lease(user_id: Uuid, lease: Box<dyn WriterLease>) {
    if let Err(e) = lease.release().await {
        tracing::warn!(%user_id, error = %e, "failed to release writer lease");
    }
}

#[cfg(test)]
#[path = "service_test.rs"]
mod tests;
