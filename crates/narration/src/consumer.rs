//! Job consumer: semaphore-gated narration workers.
//!
//! Failure policy (deliberate, see DESIGN.md): deterministic failures
//! (malformed message, narration API failure, permit interruption) are
//! acknowledged and dead-lettered so a permanently-failing task can never
//! cause a redelivery storm. Only status-store unavailability withholds the
//! acknowledgment, forcing broker redelivery once the store is back.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{watch, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use crate::client::{NarrationClient, NarrationError, NarrationOutput};
use crate::message::NarrationRequest;
use crate::queue::{Delivery, QueueError, TaskQueue};
use crate::status_store::{StatusStore, StatusStoreError};
use crate::task::{TaskId, TaskStatus};

/// Default cap on concurrent narration API calls.
pub const DEFAULT_MAX_CONCURRENT_CALLS: usize = 5;

/// Consumer configuration.
#[derive(Debug, Clone)]
pub struct NarrationConsumerConfig {
    /// Maximum narration API calls in flight across all workers.
    pub max_concurrent_calls: usize,
    /// Number of worker tasks pulling from the queue.
    pub workers: usize,
    /// How long a worker blocks waiting for a delivery before rechecking
    /// shutdown.
    pub receive_wait: Duration,
    /// Name for logging and consumer identity.
    pub name: String,
}

impl Default for NarrationConsumerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_calls: DEFAULT_MAX_CONCURRENT_CALLS,
            workers: 8,
            receive_wait: Duration::from_millis(500),
            name: "narration-consumer".to_string(),
        }
    }
}

impl NarrationConsumerConfig {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_max_concurrent_calls(mut self, max: usize) -> Self {
        self.max_concurrent_calls = max;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }
}

/// Consumer runtime statistics.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct ConsumerStats {
    pub processed: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub duplicates: u64,
    pub dead_lettered: u64,
}

/// Handle to a running consumer.
pub struct ConsumerHandle {
    shutdown: watch::Sender<bool>,
    joins: Vec<JoinHandle<()>>,
    stats: Arc<Mutex<ConsumerStats>>,
}

impl ConsumerHandle {
    /// Request graceful shutdown and wait for all workers to drain.
    pub async fn shutdown(mut self) {
        let _ = self.shutdown.send(true);
        for join in self.joins.drain(..) {
            let _ = join.await;
        }
    }

    pub fn stats(&self) -> ConsumerStats {
        self.stats.lock().unwrap().clone()
    }
}

/// Where a handled delivery ended up (stats bookkeeping).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Succeeded,
    Failed,
    Duplicate,
    Malformed,
}

/// Errors that withhold the acknowledgment (broker will redeliver).
#[derive(Debug, thiserror::Error)]
enum ConsumeError {
    #[error(transparent)]
    Status(#[from] StatusStoreError),

    #[error(transparent)]
    Queue(#[from] QueueError),
}

/// Receives the artifacts of a completed narration call, before the task
/// is marked COMPLETED. Implementations must not block; persistence
/// failures are theirs to log, not to fail the task over.
pub trait NarrationOutputSink: Send + Sync {
    fn on_completed(&self, task_id: &TaskId, output: &NarrationOutput);
}

/// Semaphore-gated consumer of the narration topic.
pub struct NarrationConsumer {
    queue: Arc<dyn TaskQueue>,
    status: Arc<dyn StatusStore>,
    client: Arc<dyn NarrationClient>,
    output_sink: Option<Arc<dyn NarrationOutputSink>>,
    semaphore: Arc<Semaphore>,
    stats: Arc<Mutex<ConsumerStats>>,
    config: NarrationConsumerConfig,
}

impl NarrationConsumer {
    pub fn new(
        queue: Arc<dyn TaskQueue>,
        status: Arc<dyn StatusStore>,
        client: Arc<dyn NarrationClient>,
        config: NarrationConsumerConfig,
    ) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.max_concurrent_calls.max(1)));
        Self {
            queue,
            status,
            client,
            output_sink: None,
            semaphore,
            stats: Arc::new(Mutex::new(ConsumerStats::default())),
            config,
        }
    }

    pub fn with_output_sink(mut self, sink: Arc<dyn NarrationOutputSink>) -> Self {
        self.output_sink = Some(sink);
        self
    }

    /// Spawn the worker tasks and return a control handle.
    pub fn spawn(self) -> ConsumerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let stats = self.stats.clone();
        let consumer = Arc::new(self);

        let joins = (0..consumer.config.workers.max(1))
            .map(|i| {
                let consumer = consumer.clone();
                let shutdown = shutdown_rx.clone();
                let worker_name = format!("{}-{}", consumer.config.name, i);
                tokio::spawn(async move {
                    consumer.worker_loop(worker_name, shutdown).await;
                })
            })
            .collect();

        ConsumerHandle {
            shutdown: shutdown_tx,
            joins,
            stats,
        }
    }

    async fn worker_loop(&self, worker_name: String, mut shutdown: watch::Receiver<bool>) {
        info!(worker = %worker_name, "narration worker started");
        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                _ = shutdown.changed() => break,
                received = self.queue.receive(&worker_name, self.config.receive_wait) => {
                    match received {
                        Ok(Some(delivery)) => match self.handle_delivery(&delivery).await {
                            Ok(outcome) => self.record(outcome),
                            Err(e) => {
                                // No ack: the broker will redeliver this message.
                                warn!(worker = %worker_name, error = %e,
                                      "delivery not acknowledged, awaiting redelivery");
                            }
                        },
                        Ok(None) => {}
                        Err(e) => {
                            error!(worker = %worker_name, error = %e, "queue receive failed");
                            tokio::time::sleep(self.config.receive_wait).await;
                        }
                    }
                }
            }
        }
        info!(worker = %worker_name, "narration worker stopped");
    }

    #[instrument(skip(self, delivery), fields(delivery_id = %delivery.id))]
    async fn handle_delivery(&self, delivery: &Delivery) -> Result<Outcome, ConsumeError> {
        let envelope = match NarrationRequest::parse(&delivery.payload) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(error = %e, "malformed narration message, dead-lettering");
                self.queue
                    .send_to_dead_letter(&delivery.payload, &format!("malformed message: {e}"))
                    .await?;
                self.queue.ack(&delivery.id).await?;
                return Ok(Outcome::Malformed);
            }
        };
        let task_id = envelope.task_id;

        // Best-effort duplicate suppression, applied to first deliveries
        // only. A redelivered message means the previous attempt died
        // before acking (possibly after the narration call returned but
        // before the terminal status write landed), so it must run again
        // rather than be skipped over a stale START. The check-then-act
        // is not atomic: two racing first deliveries can both pass it.
        if delivery.delivery_count <= 1
            && self.status.get(&task_id).await? == Some(TaskStatus::Start)
        {
            warn!(task_id = %task_id, "task already in progress, skipping duplicate");
            self.queue.ack(&delivery.id).await?;
            return Ok(Outcome::Duplicate);
        }

        self.status.set(&task_id, TaskStatus::Start).await?;

        match self.invoke_with_permit(&task_id).await {
            Ok(output) => {
                debug!(task_id = %task_id, audio_id = %output.audio_id, "narration completed");
                if let Some(sink) = &self.output_sink {
                    sink.on_completed(&task_id, &output);
                }
                self.status.set(&task_id, TaskStatus::Completed).await?;
                self.queue.ack(&delivery.id).await?;
                Ok(Outcome::Succeeded)
            }
            Err(e) => {
                error!(task_id = %task_id, error = %e, "narration failed, dead-lettering");
                self.status.set(&task_id, TaskStatus::Failed).await?;
                self.queue
                    .send_to_dead_letter(&delivery.payload, &e.to_string())
                    .await?;
                self.queue.ack(&delivery.id).await?;
                Ok(Outcome::Failed)
            }
        }
    }

    /// Call the narration API while holding one concurrency permit.
    ///
    /// The permit is scoped to the call: dropped on every exit path.
    async fn invoke_with_permit(&self, task_id: &TaskId) -> Result<NarrationOutput, NarrationError> {
        let _permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| NarrationError::Interrupted)?;

        self.client
            .invoke(task_id.novel_id, task_id.episode_id, task_id.script_id)
            .await
    }

    fn record(&self, outcome: Outcome) {
        let mut stats = self.stats.lock().unwrap();
        stats.processed += 1;
        match outcome {
            Outcome::Succeeded => stats.succeeded += 1,
            Outcome::Failed => {
                stats.failed += 1;
                stats.dead_lettered += 1;
            }
            Outcome::Duplicate => stats.duplicates += 1,
            Outcome::Malformed => stats.dead_lettered += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use async_trait::async_trait;
    use fablecast_core::{EpisodeId, NovelId, ScriptId};
    use uuid::Uuid;

    use crate::in_memory_queue::InMemoryTaskQueue;
    use crate::producer::NarrationProducer;
    use crate::status_store::InMemoryStatusStore;

    fn task_id() -> TaskId {
        TaskId::new(NovelId::new(), EpisodeId::new(), ScriptId::new())
    }

    /// Fake narration service with a concurrency gauge and per-task failure
    /// injection.
    struct FakeNarrationService {
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        invocations: AtomicUsize,
        delay: Duration,
        fail_tasks: Mutex<HashMap<TaskId, String>>,
    }

    impl FakeNarrationService {
        fn new(delay: Duration) -> Self {
            Self {
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
                invocations: AtomicUsize::new(0),
                delay,
                fail_tasks: Mutex::new(HashMap::new()),
            }
        }

        fn fail_task(&self, task_id: TaskId, reason: &str) {
            self.fail_tasks
                .lock()
                .unwrap()
                .insert(task_id, reason.to_string());
        }

        fn max_observed(&self) -> usize {
            self.max_in_flight.load(Ordering::SeqCst)
        }

        fn invocations(&self) -> usize {
            self.invocations.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl NarrationClient for FakeNarrationService {
        async fn invoke(
            &self,
            novel_id: NovelId,
            episode_id: EpisodeId,
            script_id: ScriptId,
        ) -> Result<NarrationOutput, NarrationError> {
            self.invocations.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            tokio::time::sleep(self.delay).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            let id = TaskId::new(novel_id, episode_id, script_id);
            if let Some(reason) = self.fail_tasks.lock().unwrap().get(&id) {
                return Err(NarrationError::Rejected(reason.clone()));
            }
            Ok(NarrationOutput {
                audio_id: Uuid::now_v7(),
                metadata_id: Uuid::now_v7(),
            })
        }
    }

    /// Status store decorator that records every transition per task.
    struct RecordingStatusStore {
        inner: InMemoryStatusStore,
        transitions: Mutex<HashMap<TaskId, Vec<TaskStatus>>>,
        unavailable: AtomicBool,
        fail_next_terminal_write: AtomicBool,
        rejected_terminal_writes: AtomicUsize,
    }

    impl RecordingStatusStore {
        fn new() -> Self {
            Self {
                inner: InMemoryStatusStore::new(),
                transitions: Mutex::new(HashMap::new()),
                unavailable: AtomicBool::new(false),
                fail_next_terminal_write: AtomicBool::new(false),
                rejected_terminal_writes: AtomicUsize::new(0),
            }
        }

        fn transitions_for(&self, task_id: &TaskId) -> Vec<TaskStatus> {
            self.transitions
                .lock()
                .unwrap()
                .get(task_id)
                .cloned()
                .unwrap_or_default()
        }

        fn set_unavailable(&self, unavailable: bool) {
            self.unavailable.store(unavailable, Ordering::SeqCst);
        }

        /// Arm a one-shot outage hitting only the next COMPLETED/FAILED
        /// write, after the narration call has already returned.
        fn fail_next_terminal_write(&self) {
            self.fail_next_terminal_write.store(true, Ordering::SeqCst);
        }

        fn rejected_terminal_writes(&self) -> usize {
            self.rejected_terminal_writes.load(Ordering::SeqCst)
        }

        fn check(&self) -> Result<(), StatusStoreError> {
            if self.unavailable.load(Ordering::SeqCst) {
                Err(StatusStoreError::Connection("store down".into()))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl StatusStore for RecordingStatusStore {
        async fn get(&self, task_id: &TaskId) -> Result<Option<TaskStatus>, StatusStoreError> {
            self.check()?;
            self.inner.get(task_id).await
        }

        async fn set(&self, task_id: &TaskId, status: TaskStatus) -> Result<(), StatusStoreError> {
            self.check()?;
            if status.is_terminal()
                && self
                    .fail_next_terminal_write
                    .swap(false, Ordering::SeqCst)
            {
                self.rejected_terminal_writes.fetch_add(1, Ordering::SeqCst);
                return Err(StatusStoreError::Connection("store down".into()));
            }
            self.transitions
                .lock()
                .unwrap()
                .entry(*task_id)
                .or_default()
                .push(status);
            self.inner.set(task_id, status).await
        }

        async fn find_by_episode(
            &self,
            episode_id: EpisodeId,
        ) -> Result<Option<(TaskId, TaskStatus)>, StatusStoreError> {
            self.check()?;
            self.inner.find_by_episode(episode_id).await
        }
    }

    struct Harness {
        queue: Arc<InMemoryTaskQueue>,
        status: Arc<RecordingStatusStore>,
        client: Arc<FakeNarrationService>,
    }

    impl Harness {
        fn new(delay: Duration) -> Self {
            Self {
                queue: Arc::new(InMemoryTaskQueue::new()),
                status: Arc::new(RecordingStatusStore::new()),
                client: Arc::new(FakeNarrationService::new(delay)),
            }
        }

        fn spawn_consumer(&self, config: NarrationConsumerConfig) -> ConsumerHandle {
            NarrationConsumer::new(
                self.queue.clone(),
                self.status.clone(),
                self.client.clone(),
                config,
            )
            .spawn()
        }

        async fn publish(&self, task_id: &TaskId, data: &str) {
            NarrationProducer::new(self.queue.clone(), self.status.clone())
                .publish(task_id, data)
                .await
                .unwrap();
        }
    }

    async fn wait_for<F: Fn() -> bool>(predicate: F) {
        for _ in 0..200 {
            if predicate() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("condition not reached within timeout");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn successful_task_transitions_pending_start_completed() {
        let harness = Harness::new(Duration::from_millis(1));
        let t1 = task_id();
        // Publish before the consumer runs so the PENDING write is ordered
        // ahead of the consumer's START write.
        harness.publish(&t1, "scripts/t1.txt").await;
        let handle = harness.spawn_consumer(NarrationConsumerConfig::default().with_workers(2));

        let status = harness.status.clone();
        wait_for(|| {
            status
                .transitions_for(&t1)
                .last()
                .is_some_and(|s| s.is_terminal())
        })
        .await;
        handle.shutdown().await;

        assert_eq!(
            harness.status.transitions_for(&t1),
            vec![TaskStatus::Pending, TaskStatus::Start, TaskStatus::Completed]
        );
        assert!(harness
            .queue
            .read_dead_letters(10)
            .await
            .unwrap()
            .is_empty());
        // Everything acked: redelivery produces nothing.
        assert_eq!(harness.queue.unacked_len(), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn failed_task_is_dead_lettered_with_original_payload() {
        let harness = Harness::new(Duration::from_millis(1));
        let t2 = task_id();
        harness.client.fail_task(t2, "voice model exploded");

        harness.publish(&t2, "scripts/t2.txt").await;
        let handle = harness.spawn_consumer(NarrationConsumerConfig::default().with_workers(1));

        let status = harness.status.clone();
        wait_for(|| {
            status
                .transitions_for(&t2)
                .last()
                .is_some_and(|s| s.is_terminal())
        })
        .await;
        handle.shutdown().await;

        assert_eq!(
            harness.status.transitions_for(&t2),
            vec![TaskStatus::Pending, TaskStatus::Start, TaskStatus::Failed]
        );

        let expected_payload = NarrationRequest::new(t2, "scripts/t2.txt")
            .to_json()
            .unwrap();
        let dead_letters = harness.queue.read_dead_letters(10).await.unwrap();
        assert_eq!(dead_letters.len(), 1);
        assert_eq!(dead_letters[0].payload, expected_payload);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_narration_calls_never_exceed_the_cap() {
        let harness = Harness::new(Duration::from_millis(30));
        let handle = harness.spawn_consumer(
            NarrationConsumerConfig::default()
                .with_workers(16)
                .with_max_concurrent_calls(5),
        );

        let burst = 20;
        for _ in 0..burst {
            harness.publish(&task_id(), "scripts/burst.txt").await;
        }

        let client = harness.client.clone();
        wait_for(|| client.invocations() >= burst).await;
        handle.shutdown().await;

        assert!(
            harness.client.max_observed() <= 5,
            "observed {} concurrent calls",
            harness.client.max_observed()
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn first_delivery_of_started_task_is_suppressed() {
        let harness = Harness::new(Duration::from_millis(1));
        let t = task_id();

        // Mark the task in progress, then deliver a fresh message for it.
        harness.status.set(&t, TaskStatus::Start).await.unwrap();
        let payload = NarrationRequest::new(t, "scripts/dup.txt")
            .to_json()
            .unwrap();
        harness.queue.publish(&t.to_string(), &payload).await.unwrap();

        let handle = harness.spawn_consumer(NarrationConsumerConfig::default().with_workers(1));
        let stats_handle = |h: &ConsumerHandle| h.stats();
        wait_for(|| stats_handle(&handle).duplicates == 1).await;
        handle.shutdown().await;

        // Acknowledged without invoking narration; allow for the documented
        // race bound of at most one extra invocation.
        assert!(harness.client.invocations() <= 1);
        assert_eq!(harness.queue.unacked_len(), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn malformed_message_is_dead_lettered_without_invocation() {
        let harness = Harness::new(Duration::from_millis(1));
        harness
            .queue
            .publish("not-a-task", "{this is not json")
            .await
            .unwrap();

        let handle = harness.spawn_consumer(NarrationConsumerConfig::default().with_workers(1));
        let queue = harness.queue.clone();
        wait_for(|| queue.dead_letter_len() == 1).await;
        handle.shutdown().await;

        assert_eq!(harness.client.invocations(), 0);
        let dead_letters = harness.queue.read_dead_letters(10).await.unwrap();
        assert_eq!(dead_letters[0].payload, "{this is not json");
        assert_eq!(harness.queue.unacked_len(), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn status_store_outage_withholds_the_ack() {
        let harness = Harness::new(Duration::from_millis(1));
        let t = task_id();
        let payload = NarrationRequest::new(t, "scripts/outage.txt")
            .to_json()
            .unwrap();
        harness.queue.publish(&t.to_string(), &payload).await.unwrap();
        harness.status.set_unavailable(true);

        let handle = harness.spawn_consumer(NarrationConsumerConfig::default().with_workers(1));
        let queue = harness.queue.clone();
        wait_for(|| queue.unacked_len() == 1).await;
        handle.shutdown().await;

        // Not acked, not dead-lettered: the message survives for redelivery.
        assert_eq!(harness.client.invocations(), 0);
        assert!(harness
            .queue
            .read_dead_letters(10)
            .await
            .unwrap()
            .is_empty());
        harness.queue.redeliver_unacked();

        // After the store recovers, redelivery completes the task.
        harness.status.set_unavailable(false);
        let handle = harness.spawn_consumer(NarrationConsumerConfig::default().with_workers(1));
        let status = harness.status.clone();
        wait_for(|| {
            status
                .transitions_for(&t)
                .last()
                .is_some_and(|s| s.is_terminal())
        })
        .await;
        handle.shutdown().await;

        assert_eq!(
            harness.status.transitions_for(&t),
            vec![TaskStatus::Start, TaskStatus::Completed]
        );
    }

    // The store can also fail after the narration call returned but before
    // the COMPLETED write landed. The redelivery then finds the task in
    // START, which must not be mistaken for a live duplicate: the task
    // would be acked away and stuck in START forever.
    #[tokio::test(flavor = "multi_thread")]
    async fn lost_completed_write_is_recovered_by_redelivery() {
        let harness = Harness::new(Duration::from_millis(1));
        let t = task_id();
        harness.publish(&t, "scripts/retry.txt").await;
        harness.status.fail_next_terminal_write();

        let handle = harness.spawn_consumer(NarrationConsumerConfig::default().with_workers(1));
        let status = harness.status.clone();
        wait_for(|| status.rejected_terminal_writes() == 1).await;
        handle.shutdown().await;

        // Narration ran, the terminal write was lost, the delivery stayed
        // unacked and the task is still START.
        assert_eq!(harness.client.invocations(), 1);
        assert_eq!(harness.status.get(&t).await.unwrap(), Some(TaskStatus::Start));
        assert_eq!(harness.queue.unacked_len(), 1);

        harness.queue.redeliver_unacked();
        let handle = harness.spawn_consumer(NarrationConsumerConfig::default().with_workers(1));
        let status = harness.status.clone();
        wait_for(|| {
            status
                .transitions_for(&t)
                .last()
                .is_some_and(|s| s.is_terminal())
        })
        .await;
        handle.shutdown().await;

        assert_eq!(harness.client.invocations(), 2);
        assert_eq!(
            harness.status.transitions_for(&t),
            vec![
                TaskStatus::Pending,
                TaskStatus::Start,
                TaskStatus::Start,
                TaskStatus::Completed,
            ]
        );
        assert_eq!(harness.queue.unacked_len(), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn lost_failed_write_still_reaches_the_dead_letter_queue() {
        let harness = Harness::new(Duration::from_millis(1));
        let t = task_id();
        harness.client.fail_task(t, "voice model exploded");
        harness.publish(&t, "scripts/retry-fail.txt").await;
        harness.status.fail_next_terminal_write();

        let handle = harness.spawn_consumer(NarrationConsumerConfig::default().with_workers(1));
        let status = harness.status.clone();
        wait_for(|| status.rejected_terminal_writes() == 1).await;
        handle.shutdown().await;

        // The FAILED write was lost before the dead-letter append.
        assert_eq!(harness.queue.dead_letter_len(), 0);
        assert_eq!(harness.queue.unacked_len(), 1);

        harness.queue.redeliver_unacked();
        let handle = harness.spawn_consumer(NarrationConsumerConfig::default().with_workers(1));
        let queue = harness.queue.clone();
        wait_for(|| queue.dead_letter_len() == 1).await;
        handle.shutdown().await;

        assert_eq!(harness.status.get(&t).await.unwrap(), Some(TaskStatus::Failed));
        assert_eq!(harness.queue.unacked_len(), 0);
    }

    #[derive(Default)]
    struct RecordingSink {
        completed: Mutex<Vec<(TaskId, Uuid)>>,
    }

    impl NarrationOutputSink for RecordingSink {
        fn on_completed(&self, task_id: &TaskId, output: &NarrationOutput) {
            self.completed
                .lock()
                .unwrap()
                .push((*task_id, output.audio_id));
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn completed_narration_hands_its_artifacts_to_the_sink() {
        let harness = Harness::new(Duration::from_millis(1));
        let sink = Arc::new(RecordingSink::default());
        let t = task_id();
        harness.publish(&t, "scripts/sink.txt").await;

        let handle = NarrationConsumer::new(
            harness.queue.clone(),
            harness.status.clone(),
            harness.client.clone(),
            NarrationConsumerConfig::default().with_workers(1),
        )
        .with_output_sink(sink.clone())
        .spawn();

        let status = harness.status.clone();
        wait_for(|| {
            status
                .transitions_for(&t)
                .last()
                .is_some_and(|s| s.is_terminal())
        })
        .await;
        handle.shutdown().await;

        let completed = sink.completed.lock().unwrap();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].0, t);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn stats_track_outcomes() {
        let harness = Harness::new(Duration::from_millis(1));
        let ok = task_id();
        let bad = task_id();
        harness.client.fail_task(bad, "no");

        let handle = harness.spawn_consumer(NarrationConsumerConfig::default().with_workers(2));
        harness.publish(&ok, "a").await;
        harness.publish(&bad, "b").await;

        wait_for(|| {
            let s = handle.stats();
            s.processed >= 2
        })
        .await;
        let stats = handle.stats();
        handle.shutdown().await;

        assert_eq!(stats.succeeded, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.dead_lettered, 1);
    }
}
