//! Task status store abstraction.
//!
//! The key format (`task:<taskId>:status` in the Redis implementation) is an
//! implementation detail; call sites only see typed `get`/`set`.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use fablecast_core::EpisodeId;

use crate::task::{TaskId, TaskStatus};

#[derive(Debug, Clone, thiserror::Error)]
pub enum StatusStoreError {
    #[error("status store connection error: {0}")]
    Connection(String),

    #[error("status store command error: {0}")]
    Command(String),
}

/// Key-value store tracking task lifecycle state.
///
/// Shared by producer and consumer without transactions; the consumer's
/// duplicate check (read-then-write) is therefore best-effort only.
#[async_trait]
pub trait StatusStore: Send + Sync {
    async fn get(&self, task_id: &TaskId) -> Result<Option<TaskStatus>, StatusStoreError>;

    async fn set(&self, task_id: &TaskId, status: TaskStatus) -> Result<(), StatusStoreError>;

    /// Secondary lookup by episode. A scan in the Redis implementation;
    /// acceptable only because status-key cardinality stays small (records
    /// expire via TTL).
    async fn find_by_episode(
        &self,
        episode_id: EpisodeId,
    ) -> Result<Option<(TaskId, TaskStatus)>, StatusStoreError>;
}

/// In-memory status store for tests/dev.
///
/// Honors the TTL contract lazily: expired records disappear on read.
#[derive(Debug)]
pub struct InMemoryStatusStore {
    records: Mutex<HashMap<TaskId, StatusRecord>>,
    ttl: Option<Duration>,
}

#[derive(Debug, Clone, Copy)]
struct StatusRecord {
    status: TaskStatus,
    expires_at: Option<Instant>,
}

impl InMemoryStatusStore {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            ttl: None,
        }
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            ttl: Some(ttl),
        }
    }

    fn live(&self, record: StatusRecord) -> Option<TaskStatus> {
        match record.expires_at {
            Some(deadline) if Instant::now() >= deadline => None,
            _ => Some(record.status),
        }
    }
}

impl Default for InMemoryStatusStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StatusStore for InMemoryStatusStore {
    async fn get(&self, task_id: &TaskId) -> Result<Option<TaskStatus>, StatusStoreError> {
        let records = self
            .records
            .lock()
            .map_err(|_| StatusStoreError::Command("status store lock poisoned".into()))?;
        Ok(records.get(task_id).copied().and_then(|r| self.live(r)))
    }

    async fn set(&self, task_id: &TaskId, status: TaskStatus) -> Result<(), StatusStoreError> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| StatusStoreError::Command("status store lock poisoned".into()))?;
        records.insert(
            *task_id,
            StatusRecord {
                status,
                expires_at: self.ttl.map(|ttl| Instant::now() + ttl),
            },
        );
        Ok(())
    }

    async fn find_by_episode(
        &self,
        episode_id: EpisodeId,
    ) -> Result<Option<(TaskId, TaskStatus)>, StatusStoreError> {
        let records = self
            .records
            .lock()
            .map_err(|_| StatusStoreError::Command("status store lock poisoned".into()))?;
        Ok(records
            .iter()
            .filter(|(task_id, _)| task_id.episode_id == episode_id)
            .filter_map(|(task_id, record)| self.live(*record).map(|s| (*task_id, s)))
            .next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fablecast_core::{NovelId, ScriptId};

    fn task_id() -> TaskId {
        TaskId::new(NovelId::new(), EpisodeId::new(), ScriptId::new())
    }

    #[tokio::test]
    async fn set_then_get() {
        let store = InMemoryStatusStore::new();
        let id = task_id();

        assert_eq!(store.get(&id).await.unwrap(), None);
        store.set(&id, TaskStatus::Pending).await.unwrap();
        assert_eq!(store.get(&id).await.unwrap(), Some(TaskStatus::Pending));
        store.set(&id, TaskStatus::Start).await.unwrap();
        assert_eq!(store.get(&id).await.unwrap(), Some(TaskStatus::Start));
    }

    #[tokio::test]
    async fn episode_lookup_matches_only_its_task() {
        let store = InMemoryStatusStore::new();
        let id = task_id();
        store.set(&id, TaskStatus::Completed).await.unwrap();

        let found = store.find_by_episode(id.episode_id).await.unwrap();
        assert_eq!(found, Some((id, TaskStatus::Completed)));

        let missing = store.find_by_episode(EpisodeId::new()).await.unwrap();
        assert_eq!(missing, None);
    }

    #[tokio::test]
    async fn records_expire_after_ttl() {
        let store = InMemoryStatusStore::with_ttl(Duration::from_millis(0));
        let id = task_id();
        store.set(&id, TaskStatus::Completed).await.unwrap();

        assert_eq!(store.get(&id).await.unwrap(), None);
        assert_eq!(store.find_by_episode(id.episode_id).await.unwrap(), None);
    }
}
