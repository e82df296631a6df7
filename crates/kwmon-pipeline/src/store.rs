//! Persistence boundary for monitoring documents, plus per-user write locks.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use async_trait::async_trait;
use kwmon_core::MonitoringDocument;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// Error type returned by store implementations.
pub type StoreError = Box<dyn std::error::Error + Send + Sync>;

/// What kind of pipeline pass a run-ledger entry describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunType {
    Collect,
    Reconcile,
}

impl RunType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RunType::Collect => "collect",
            RunType::Reconcile => "reconcile",
        }
    }
}

/// Exclusive hold on one user's document, handed out by
/// [`MonitoringStore::lock_user`].
///
/// Dropping a lease also releases it; `release` lets the holder observe
/// release errors.
#[async_trait]
pub trait WriterLease: Send {
    async fn release(self: Box<Self>) -> Result<(), StoreError>;
}

/// Reads and whole-document writes of per-user monitoring state.
///
/// The run-ledger methods default to no-ops so stores without an audit table
/// only implement the document and keyword operations.
#[async_trait]
pub trait MonitoringStore: Send + Sync {
    /// Wait until the caller is the only writer of `user_id`'s document.
    ///
    /// The hold must cover every process sharing the store, not just the
    /// calling one. It lasts until the returned lease is released or dropped.
    async fn lock_user(&self, user_id: Uuid) -> Result<Box<dyn WriterLease>, StoreError>;

    /// Active keywords for `user_id`, in collection order.
    async fn list_keywords(&self, user_id: Uuid) -> Result<Vec<String>, StoreError>;

    async fn load_document(&self, user_id: Uuid)
        -> Result<Option<MonitoringDocument>, StoreError>;

    /// Replace the user's document in a single write. Never merges.
    async fn replace_document(
        &self,
        user_id: Uuid,
        document: &MonitoringDocument,
    ) -> Result<(), StoreError>;

    /// Users that currently have a stored document.
    async fn list_document_owners(&self) -> Result<Vec<Uuid>, StoreError>;

    /// Open a ledger entry and mark it running. Returns its id, if recorded.
    async fn begin_run(
        &self,
        _user_id: Uuid,
        _run_type: RunType,
        _trigger: &str,
    ) -> Result<Option<i64>, StoreError> {
        Ok(None)
    }

    async fn complete_run(&self, _run_id: i64, _records_processed: i32) -> Result<(), StoreError> {
        Ok(())
    }

    async fn fail_run(&self, _run_id: i64, _message: &str) -> Result<(), StoreError> {
        Ok(())
    }
}

type LockMap = Arc<StdMutex<HashMap<Uuid, Arc<Mutex<()>>>>>;

/// Registry of per-user async mutexes for stores that live in one process.
///
/// An entry exists only while some task holds or waits for that user's lock.
/// Different users never contend.
#[derive(Debug, Clone, Default)]
pub struct UserLocks {
    locks: LockMap,
}

impl UserLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `user_id`'s document.
    pub async fn acquire(&self, user_id: Uuid) -> UserLockGuard {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(user_id).or_default())
        };
        let guard = lock.lock_owned().await;
        UserLockGuard {
            user_id,
            guard: Some(guard),
            locks: Arc::clone(&self.locks),
        }
    }

    /// Number of users with a live lock entry.
    #[must_use]
    pub fn tracked_users(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Held lock for one user. Prunes the registry entry on drop when no other
/// task is waiting for it.
#[derive(Debug)]
pub struct UserLockGuard {
    user_id: Uuid,
    guard: Option<OwnedMutexGuard<()>>,
    locks: LockMap,
}

impl Drop for UserLockGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if locks
            .get(&self.user_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.user_id);
        }
    }
}

#[async_trait]
impl WriterLease for UserLockGuard {
    async fn release(self: Box<Self>) -> Result<(), StoreError> {
        drop(self);
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    keywords: HashMap<Uuid, Vec<String>>,
    documents: HashMap<Uuid, MonitoringDocument>,
    writes: HashMap<Uuid, usize>,
}

/// Process-local store. Backs tests and offline runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
    locks: UserLocks,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_keywords<I, S>(&self, user_id: Uuid, keywords: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state
            .lock()
            .await
            .keywords
            .insert(user_id, keywords.into_iter().map(Into::into).collect());
    }

    /// Seed a document without counting it as a write.
    pub async fn put_document(&self, user_id: Uuid, document: MonitoringDocument) {
        self.state.lock().await.documents.insert(user_id, document);
    }

    /// Writer locks handed out by [`MonitoringStore::lock_user`].
    #[must_use]
    pub fn locks(&self) -> &UserLocks {
        &self.locks
    }

    /// Number of `replace_document` calls made for `user_id`.
    pub async fn writes(&self, user_id: Uuid) -> usize {
        self.state
            .lock()
            .await
            .writes
            .get(&user_id)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl MonitoringStore for MemoryStore {
    async fn lock_user(&self, user_id: Uuid) -> Result<Box<dyn WriterLease>, StoreError> {
        Ok(Box::new(self.locks.acquire(user_id).await))
    }

    async fn list_keywords(&self, user_id: Uuid) -> Result<Vec<String>, StoreError> {
        Ok(self
            .state
            .lock()
            .await
            .keywords
            .get(&user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn load_document(
        &self,
        user_id: Uuid,
    ) -> Result<Option<MonitoringDocument>, StoreError> {
        Ok(self.state.lock().await.documents.get(&user_id).cloned())
    }

    async fn replace_document(
        &self,
        user_id: Uuid,
        document: &MonitoringDocument,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state.documents.insert(user_id, document.clone());
        *state.writes.entry(user_id).or_insert(0) += 1;
        Ok(())
    }

    async fn list_document_owners(&self) -> Result<Vec<Uuid>, StoreError> {
        let mut owners: Vec<Uuid> = self.state.lock().await.documents.keys().copied().collect();
        owners.sort_unstable();
        Ok(owners)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn same_user_waits_for_guard() {
        let locks = UserLocks::new();
        let user = Uuid::new_v4();
        let guard = locks.acquire(user).await;

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire(user).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), contender)
            .await
            .expect("contender should acquire after release")
            .unwrap();
    }

    #[tokio::test]
    async fn different_users_do_not_contend() {
        let locks = UserLocks::new();
        let _first = locks.acquire(Uuid::new_v4()).await;
        let second = tokio::time::timeout(Duration::from_millis(100), locks.acquire(Uuid::new_v4())).await;
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn released_locks_are_pruned() {
        let locks = UserLocks::new();
        let user = Uuid::new_v4();

        let guard = locks.acquire(user).await;
        assert_eq!(locks.tracked_users(), 1);
        drop(guard);
        assert_eq!(locks.tracked_users(), 0);

        for _ in 0..3 {
            drop(locks.acquire(Uuid::new_v4()).await);
        }
        assert_eq!(locks.tracked_users(), 0);
    }

    #[tokio::test]
    async fn entry_survives_while_someone_waits() {
        let locks = UserLocks::new();
        let user = Uuid::new_v4();
        let guard = locks.acquire(user).await;

        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move { locks.acquire(user).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        drop(guard);
        assert_eq!(locks.tracked_users(), 1);

        let second = waiter.await.unwrap();
        drop(second);
        assert_eq!(locks.tracked_users(), 0);
    }

    #[tokio::test]
    async fn memory_store_lease_excludes_second_writer() {
        let store = Arc::new(MemoryStore::new());
        let user = Uuid::new_v4();
        let lease = store.lock_user(user).await.unwrap();

        let contender = {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.lock_user(user).await.map(|_| ()).is_ok() })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        lease.release().await.unwrap();
        assert!(contender.await.unwrap());
        assert_eq!(store.locks().tracked_users(), 0);
    }

    #[tokio::test]
    async fn memory_store_counts_writes() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        store.put_document(user, MonitoringDocument::default()).await;
        assert_eq!(store.writes(user).await, 0);

        store
            .replace_document(user, &MonitoringDocument::default())
            .await
            .unwrap();
        assert_eq!(store.writes(user).await, 1);
        assert_eq!(store.list_document_owners().await.unwrap(), vec![user]);
    }
}
