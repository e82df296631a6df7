//! Postgres-backed [`MonitoringStore`].

use async_trait::async_trait;
use kwmon_core::MonitoringDocument;
use kwmon_pipeline::{MonitoringStore, RunType, StoreError, WriterLease};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::{collection_runs, keywords, monitoring};

/// Store that reads keywords and documents from Postgres and records every
/// pipeline pass in `collection_runs`.
///
/// Writer leases are Postgres advisory locks, so they exclude writers in
/// other processes too. Each held lease pins one pool connection.
#[derive(Debug, Clone)]
pub struct PgMonitoringStore {
    pool: PgPool,
}

impl PgMonitoringStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Advisory-lock key for a user's document.
///
/// Folds the two halves of the UUID together. Collisions only make two
/// users share a lock.
#[must_use]
pub fn advisory_key(user_id: Uuid) -> i64 {
    let (high, low) = user_id.as_u64_pair();
    i64::from_be_bytes((high ^ low).to_be_bytes())
}

/// Writer lease backed by `pg_advisory_xact_lock`. The lock lives as long as
/// the transaction, so it is released on commit or when the connection
/// rolls back after a drop.
struct AdvisoryLease {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl WriterLease for AdvisoryLease {
    async fn release(self: Box<Self>) -> Result<(), StoreError> {
        Ok(self.tx.commit().await?)
    }
}

#[async_trait]
impl MonitoringStore for PgMonitoringStore {
    async fn lock_user(&self, user_id: Uuid) -> Result<Box<dyn WriterLease>, StoreError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(advisory_key(user_id))
            .execute(&mut *tx)
            .await?;
        Ok(Box::new(AdvisoryLease { tx }))
    }

    async fn list_keywords(&self, user_id: Uuid) -> Result<Vec<String>, StoreError> {
        let rows = keywords::list_active_keywords(&self.pool, user_id).await?;
        Ok(rows.into_iter().map(|row| row.keyword).collect())
    }

    async fn load_document(
        &self,
        user_id: Uuid,
    ) -> Result<Option<MonitoringDocument>, StoreError> {
        Ok(monitoring::load_document(&self.pool, user_id).await?)
    }

    async fn replace_document(
        &self,
        user_id: Uuid,
        document: &MonitoringDocument,
    ) -> Result<(), StoreError> {
        Ok(monitoring::replace_document(&self.pool, user_id, document).await?)
    }

    async fn list_document_owners(&self) -> Result<Vec<Uuid>, StoreError> {
        Ok(monitoring::list_document_owners(&self.pool).await?)
    }

    async fn begin_run(
        &self,
        user_id: Uuid,
        run_type: RunType,
        trigger: &str,
    ) -> Result<Option<i64>, StoreError> {
        let run =
            collection_runs::create_collection_run(&self.pool, user_id, run_type.as_str(), trigger)
                .await?;
        collection_runs::start_collection_run(&self.pool, run.id).await?;
        Ok(Some(run.id))
    }

    async fn complete_run(&self, run_id: i64, records_processed: i32) -> Result<(), StoreError> {
        Ok(collection_runs::complete_collection_run(&self.pool, run_id, records_processed).await?)
    }

    async fn fail_run(&self, run_id: i64, message: &str) -> Result<(), StoreError> {
        Ok(collection_runs::fail_collection_run(&self.pool, run_id, message).await?)
    }
}
