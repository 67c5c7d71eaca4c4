//! Job producer: publish a narration task and initialize its status.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::message::NarrationRequest;
use crate::queue::{QueueError, TaskQueue};
use crate::status_store::{StatusStore, StatusStoreError};
use crate::task::{TaskId, TaskStatus};

#[derive(Debug, thiserror::Error)]
pub enum ProducerError {
    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error(transparent)]
    Status(#[from] StatusStoreError),

    #[error("failed to encode narration message: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Publishes narration requests keyed by task id and seeds the status record.
#[derive(Clone)]
pub struct NarrationProducer {
    queue: Arc<dyn TaskQueue>,
    status: Arc<dyn StatusStore>,
}

impl NarrationProducer {
    pub fn new(queue: Arc<dyn TaskQueue>, status: Arc<dyn StatusStore>) -> Self {
        Self { queue, status }
    }

    /// Publish a task, then set its status to `PENDING`.
    ///
    /// The two writes are not transactional: a crash in between leaves the
    /// message in flight with no status record. The consumer tolerates a
    /// missing status on first read, so the task still completes.
    #[instrument(skip(self, data), fields(task_id = %task_id))]
    pub async fn publish(&self, task_id: &TaskId, data: &str) -> Result<(), ProducerError> {
        let payload = NarrationRequest::new(*task_id, data).to_json()?;
        let key = task_id.to_string();

        self.queue.publish(&key, &payload).await?;
        self.status.set(task_id, TaskStatus::Pending).await?;

        info!(task_id = %task_id, "narration task published");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use fablecast_core::{EpisodeId, NovelId, ScriptId};

    use crate::in_memory_queue::InMemoryTaskQueue;
    use crate::status_store::InMemoryStatusStore;

    #[tokio::test]
    async fn publish_keys_by_task_id_and_sets_pending() {
        let queue = Arc::new(InMemoryTaskQueue::new());
        let status = Arc::new(InMemoryStatusStore::new());
        let producer = NarrationProducer::new(queue.clone(), status.clone());

        let task_id = TaskId::new(NovelId::new(), EpisodeId::new(), ScriptId::new());
        producer.publish(&task_id, "scripts/e1.txt").await.unwrap();

        let delivery = queue
            .receive("w", Duration::from_millis(10))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(delivery.key.as_deref(), Some(task_id.to_string().as_str()));

        let envelope = NarrationRequest::parse(&delivery.payload).unwrap();
        assert_eq!(envelope.task_id, task_id);
        assert_eq!(envelope.data, "scripts/e1.txt");

        assert_eq!(
            status.get(&task_id).await.unwrap(),
            Some(TaskStatus::Pending)
        );
    }
}
