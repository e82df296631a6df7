//! Collection and reconciliation command handlers.
//!
//! Both go through [`MonitoringService`] over [`PgMonitoringStore`]. Its
//! writer lease is a Postgres advisory lock, so a CLI pass and a server pass
//! for the same user never overlap. Only these two commands need the social
//! provider settings.

use std::sync::Arc;

use kwmon_db::PgMonitoringStore;
use kwmon_pipeline::MonitoringService;
use sqlx::PgPool;
use uuid::Uuid;

const TRIGGER: &str = "cli";

fn build_service(pool: &PgPool, config: &kwmon_core::AppConfig) -> anyhow::Result<MonitoringService> {
    let store = Arc::new(PgMonitoringStore::new(pool.clone()));
    MonitoringService::from_app_config(config, store)
        .map_err(|e| anyhow::anyhow!("failed to build source clients: {e}"))
}

/// Collect every active keyword for `user` and replace their document.
///
/// With `dry_run` the keyword list is printed and no provider or write
/// happens.
///
/// # Errors
///
/// Returns an error if the user has no active keywords, a source client
/// cannot be built, or the store fails.
pub(crate) async fn run_collect(
    pool: &PgPool,
    config: &kwmon_core::AppConfig,
    user: Uuid,
    dry_run: bool,
) -> anyhow::Result<()> {
    if dry_run {
        let keywords = kwmon_db::list_active_keywords(pool, user).await?;
        let names: Vec<&str> = keywords.iter().map(|k| k.keyword.as_str()).collect();
        println!(
            "dry-run: would collect {} keywords for {user}: [{}]",
            names.len(),
            names.join(", ")
        );
        return Ok(());
    }

    let service = build_service(pool, config)?;
    let report = service.collect_for_user(user, TRIGGER).await?;
    let summary = report.summary;
    println!(
        "collected {} keywords for {user}: {} completed, {} timed out, {} failed, {} without news",
        summary.keywords,
        summary.social_completed,
        summary.social_timed_out,
        summary.social_failed,
        summary.news_failed
    );
    Ok(())
}

/// Sweep one user's document, or every stored document with `all`.
///
/// # Errors
///
/// Returns an error if a source client cannot be built or the store fails.
pub(crate) async fn run_reconcile(
    pool: &PgPool,
    config: &kwmon_core::AppConfig,
    user: Option<Uuid>,
    all: bool,
) -> anyhow::Result<()> {
    let service = build_service(pool, config)?;

    match user {
        Some(user) if !all => {
            let outcome = service.reconcile_for_user(user, TRIGGER).await?;
            if outcome.changed {
                println!("resolved {} timed-out searches for {user}", outcome.resolved);
            } else {
                println!("nothing to resolve for {user}");
            }
        }
        _ => {
            let totals = service.reconcile_all(TRIGGER).await?;
            if totals.failed_users > 0 {
                tracing::warn!(failed = totals.failed_users, "some users could not be swept");
            }
            println!(
                "swept {} users: {} updated, {} searches resolved, {} failed",
                totals.users, totals.changed_users, totals.resolved, totals.failed_users
            );
        }
    }
    Ok(())
}

/// Print the stored document for `user` as pretty JSON.
///
/// # Errors
///
/// Returns an error if the document cannot be loaded or encoded.
pub(crate) async fn run_show(pool: &PgPool, user: Uuid) -> anyhow::Result<()> {
    match kwmon_db::load_document(pool, user).await? {
        Some(document) => println!("{}", serde_json::to_string_pretty(&document)?),
        None => println!("no monitoring document for {user}"),
    }
    Ok(())
}

/// Print the most recent runs for `user`, newest first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub(crate) async fn run_list_runs(pool: &PgPool, user: Uuid, limit: i64) -> anyhow::Result<()> {
    let runs = kwmon_db::list_collection_runs_for_user(pool, user, limit.clamp(1, 200)).await?;
    if runs.is_empty() {
        println!("no runs recorded for {user}");
        return Ok(());
    }
    for run in runs {
        println!(
            "{}  {:<9}  {:<9}  {:<8}  records={}  {}",
            run.created_at.to_rfc3339(),
            run.run_type,
            run.status,
            run.trigger_source,
            run.records_processed,
            run.error_message.as_deref().unwrap_or("")
        );
    }
    Ok(())
}
