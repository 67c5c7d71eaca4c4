//! In-memory task queue for tests/dev.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Notify;

use crate::queue::{DeadLetterEntry, Delivery, QueueError, TaskQueue};

/// In-memory queue.
///
/// - Single consumer group semantics: each message goes to exactly one
///   receiver.
/// - At-least-once: unacknowledged deliveries can be pushed back with
///   [`InMemoryTaskQueue::redeliver_unacked`].
#[derive(Debug, Default)]
pub struct InMemoryTaskQueue {
    pending: Mutex<VecDeque<Delivery>>,
    in_flight: Mutex<HashMap<String, Delivery>>,
    dead_letters: Mutex<Vec<DeadLetterEntry>>,
    next_id: AtomicU64,
    notify: Notify,
}

impl InMemoryTaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push every unacknowledged delivery back to the head of the queue,
    /// bumping its delivery count. Simulates broker redelivery.
    pub fn redeliver_unacked(&self) {
        let mut in_flight = self.in_flight.lock().unwrap();
        let mut pending = self.pending.lock().unwrap();
        for (_, mut delivery) in in_flight.drain() {
            delivery.delivery_count += 1;
            pending.push_front(delivery);
        }
        drop(pending);
        drop(in_flight);
        self.notify.notify_waiters();
    }

    /// Number of deliveries waiting for acknowledgment.
    pub fn unacked_len(&self) -> usize {
        self.in_flight.lock().unwrap().len()
    }

    /// Number of entries in the dead-letter sink.
    pub fn dead_letter_len(&self) -> usize {
        self.dead_letters.lock().unwrap().len()
    }

    fn pop(&self) -> Option<Delivery> {
        let mut pending = self.pending.lock().unwrap();
        let delivery = pending.pop_front()?;
        self.in_flight
            .lock()
            .unwrap()
            .insert(delivery.id.clone(), delivery.clone());
        Some(delivery)
    }
}

#[async_trait]
impl TaskQueue for InMemoryTaskQueue {
    async fn publish(&self, key: &str, payload: &str) -> Result<(), QueueError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.pending.lock().unwrap().push_back(Delivery {
            id: id.to_string(),
            key: Some(key.to_string()),
            payload: payload.to_string(),
            delivery_count: 1,
        });
        self.notify.notify_waiters();
        Ok(())
    }

    async fn receive(
        &self,
        _consumer_name: &str,
        wait: Duration,
    ) -> Result<Option<Delivery>, QueueError> {
        let deadline = tokio::time::Instant::now() + wait;
        loop {
            if let Some(delivery) = self.pop() {
                return Ok(Some(delivery));
            }

            let notified = self.notify.notified();
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return Ok(None);
            }
        }
    }

    async fn ack(&self, delivery_id: &str) -> Result<(), QueueError> {
        self.in_flight.lock().unwrap().remove(delivery_id);
        Ok(())
    }

    async fn send_to_dead_letter(&self, payload: &str, reason: &str) -> Result<(), QueueError> {
        let mut dead_letters = self.dead_letters.lock().unwrap();
        let id = dead_letters.len() + 1;
        dead_letters.push(DeadLetterEntry {
            id: id.to_string(),
            payload: payload.to_string(),
            reason: reason.to_string(),
            failed_at: Utc::now(),
        });
        Ok(())
    }

    async fn read_dead_letters(&self, limit: usize) -> Result<Vec<DeadLetterEntry>, QueueError> {
        let dead_letters = self.dead_letters.lock().unwrap();
        Ok(dead_letters.iter().take(limit).cloned().collect())
    }
}
