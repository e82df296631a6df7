//! Single-pass reconciliation of timed-out social jobs.

use kwmon_core::{JobStatus, MonitoringDocument};
use kwmon_sources::SocialSearch;

/// Re-check every `TIMED_OUT` record once and fold in any finished payloads.
///
/// Records are visited in document order and matched by position. Only the
/// resolved record's `social_data` and `timestamp` change. Adapter errors are
/// logged and leave the record as it was. Returns the document and whether
/// anything changed; callers persist only on `true`.
pub async fn reconcile(
    social: &dyn SocialSearch,
    mut document: MonitoringDocument,
) -> (MonitoringDocument, bool) {
    let mut changed = false;

    for (index, record) in document.keyword_records.iter_mut().enumerate() {
        let Some(job_id) = record.reconcilable_job_id().map(str::to_owned) else {
            continue;
        };

        let report = match social.check_status(&job_id).await {
            Ok(report) => report,
            Err(e) => {
                tracing::warn!(
                    index,
                    keyword = %record.keyword,
                    job_id = %job_id,
                    error = %e,
                    "status check failed during sweep"
                );
                continue;
            }
        };

        if report.status != JobStatus::Success {
            tracing::debug!(
                index,
                keyword = %record.keyword,
                job_id = %job_id,
                status = %report.status,
                "job not ready, leaving marker"
            );
            continue;
        }

        match social.fetch_result(&job_id).await {
            Ok(payload) => {
                record.resolve_social(payload);
                changed = true;
                tracing::info!(
                    index,
                    keyword = %record.keyword,
                    job_id = %job_id,
                    "resolved timed-out social search"
                );
            }
            Err(e) => {
                tracing::warn!(
                    index,
                    keyword = %record.keyword,
                    job_id = %job_id,
                    error = %e,
                    "result fetch failed during sweep"
                );
            }
        }
    }

    (document, changed)
}
