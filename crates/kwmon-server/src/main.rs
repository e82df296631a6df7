mod api;
mod middleware;
mod scheduler;

use std::sync::Arc;

use kwmon_db::PgMonitoringStore;
use kwmon_pipeline::MonitoringService;
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, default_rate_limit_state, AppState},
    middleware::AuthState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = kwmon_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = kwmon_db::PoolConfig::from_app_config(&config);
    let pool = kwmon_db::connect_pool(&config.database_url, pool_config).await?;
    let applied = kwmon_db::run_migrations(&pool).await?;
    if applied > 0 {
        tracing::info!(applied, "applied database migrations");
    }

    let store = Arc::new(PgMonitoringStore::new(pool.clone()));
    let service = Arc::new(MonitoringService::from_app_config(&config, store)?);

    let _scheduler = match config.reconcile_cron.as_deref() {
        Some(cron) => Some(scheduler::build_scheduler(Arc::clone(&service), cron).await?),
        None => {
            tracing::info!("KWMON_RECONCILE_CRON not set; background reconciliation disabled");
            None
        }
    };

    let auth = AuthState::from_env(matches!(
        config.env,
        kwmon_core::Environment::Development
    ))?;
    let app = build_app(
        AppState {
            service,
            pool: Some(pool),
        },
        auth,
        default_rate_limit_state(),
    );

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, env = %config.env, "kwmon-server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
