//! Redis-backed task status store.
//!
//! One string key per task, `task:<taskId>:status`, holding the status word
//! (`PENDING`, `START`, `COMPLETED`, `FAILED`). Every write refreshes the TTL
//! so abandoned records expire instead of accumulating.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use fablecast_core::EpisodeId;
use fablecast_narration::{StatusStore, StatusStoreError, TaskId, TaskStatus};

/// Default record lifetime: 24 hours.
pub const DEFAULT_STATUS_TTL: Duration = Duration::from_secs(86_400);

#[derive(Debug, Clone)]
pub struct RedisStatusStore {
    client: Arc<redis::Client>,
    ttl: Duration,
}

impl RedisStatusStore {
    pub fn new(redis_url: impl AsRef<str>) -> Result<Self, StatusStoreError> {
        Self::with_ttl(redis_url, DEFAULT_STATUS_TTL)
    }

    pub fn with_ttl(redis_url: impl AsRef<str>, ttl: Duration) -> Result<Self, StatusStoreError> {
        let client = redis::Client::open(redis_url.as_ref())
            .map_err(|e| StatusStoreError::Connection(e.to_string()))?;
        Ok(Self {
            client: Arc::new(client),
            ttl,
        })
    }

    async fn connect(&self) -> Result<redis::aio::MultiplexedConnection, StatusStoreError> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| StatusStoreError::Connection(e.to_string()))
    }
}

fn status_key(task_id: &TaskId) -> String {
    format!("task:{task_id}:status")
}

/// SCAN pattern matching every status key whose task belongs to `episode_id`.
///
/// The episode id is the middle segment of the task id, so it sits between
/// the two delimiters.
fn episode_scan_pattern(episode_id: EpisodeId) -> String {
    format!("task:*:{episode_id}:*:status")
}

/// Recover the task id embedded in a status key.
fn task_id_from_key(key: &str) -> Option<TaskId> {
    key.strip_prefix("task:")?
        .strip_suffix(":status")?
        .parse()
        .ok()
}

#[async_trait]
impl StatusStore for RedisStatusStore {
    async fn get(&self, task_id: &TaskId) -> Result<Option<TaskStatus>, StatusStoreError> {
        let mut conn = self.connect().await?;

        let raw: Option<String> = redis::cmd("GET")
            .arg(status_key(task_id))
            .query_async(&mut conn)
            .await
            .map_err(|e| StatusStoreError::Command(format!("GET failed: {e}")))?;

        match raw {
            None => Ok(None),
            Some(word) => match word.parse() {
                Ok(status) => Ok(Some(status)),
                Err(_) => {
                    warn!(%task_id, value = %word, "ignoring unparseable status record");
                    Ok(None)
                }
            },
        }
    }

    async fn set(&self, task_id: &TaskId, status: TaskStatus) -> Result<(), StatusStoreError> {
        let mut conn = self.connect().await?;

        let _: String = redis::cmd("SET")
            .arg(status_key(task_id))
            .arg(status.as_str())
            .arg("EX")
            .arg(self.ttl.as_secs().max(1).to_string())
            .query_async(&mut conn)
            .await
            .map_err(|e| StatusStoreError::Command(format!("SET failed: {e}")))?;

        Ok(())
    }

    async fn find_by_episode(
        &self,
        episode_id: EpisodeId,
    ) -> Result<Option<(TaskId, TaskStatus)>, StatusStoreError> {
        let mut conn = self.connect().await?;
        let pattern = episode_scan_pattern(episode_id);
        let mut cursor: u64 = 0;

        loop {
            let (next_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor.to_string())
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg("100")
                .query_async(&mut conn)
                .await
                .map_err(|e| StatusStoreError::Command(format!("SCAN failed: {e}")))?;

            for key in keys {
                let Some(task_id) = task_id_from_key(&key) else {
                    continue;
                };
                if let Some(status) = self.get(&task_id).await? {
                    return Ok(Some((task_id, status)));
                }
            }

            if next_cursor == 0 {
                return Ok(None);
            }
            cursor = next_cursor;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fablecast_core::{NovelId, ScriptId};

    #[test]
    fn status_key_format() {
        let id = TaskId::new(NovelId::new(), EpisodeId::new(), ScriptId::new());
        let key = status_key(&id);
        assert_eq!(key, format!("task:{id}:status"));
        assert_eq!(task_id_from_key(&key), Some(id));
    }

    #[test]
    fn scan_pattern_targets_episode_segment() {
        let episode_id = EpisodeId::new();
        let pattern = episode_scan_pattern(episode_id);
        assert_eq!(pattern, format!("task:*:{episode_id}:*:status"));
    }

    #[test]
    fn unrelated_keys_do_not_parse() {
        assert_eq!(task_id_from_key("task:garbage:status"), None);
        assert_eq!(task_id_from_key("session:abc"), None);
    }
}
