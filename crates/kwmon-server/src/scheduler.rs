//! Background reconciliation sweeps.
//!
//! Only started when `KWMON_RECONCILE_CRON` is configured. Each tick sweeps
//! every stored document through the same per-user locks as the API, so a
//! scheduled sweep never interleaves with a request-driven run for that user.

use std::sync::Arc;

use kwmon_pipeline::MonitoringService;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

const TRIGGER: &str = "schedule";

/// Builds and starts the scheduler with the reconciliation job on `cron`.
///
/// The returned handle must be kept alive for the lifetime of the process.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised, the
/// cron expression is rejected, or the scheduler fails to start.
pub async fn build_scheduler(
    service: Arc<MonitoringService>,
    cron: &str,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    let job = Job::new_async(cron, move |_uuid, _lock| {
        let service = Arc::clone(&service);
        Box::pin(async move {
            tracing::info!("scheduler: starting reconciliation sweep");
            match service.reconcile_all(TRIGGER).await {
                Ok(totals) => tracing::info!(
                    users = totals.users,
                    changed_users = totals.changed_users,
                    resolved = totals.resolved,
                    failed_users = totals.failed_users,
                    "scheduler: reconciliation sweep complete"
                ),
                Err(e) => tracing::error!(error = %e, "scheduler: reconciliation sweep failed"),
            }
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;
    tracing::info!(cron, "scheduler: reconciliation job registered");
    Ok(scheduler)
}
