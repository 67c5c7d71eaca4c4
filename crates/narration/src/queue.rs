//! Task queue abstraction (publish/consume + dead-letter sink).
//!
//! Delivery contract is **at-least-once**: a delivery that is never
//! acknowledged comes back. Consumers must tolerate duplicates.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, thiserror::Error)]
pub enum QueueError {
    #[error("queue connection error: {0}")]
    Connection(String),

    #[error("queue command error: {0}")]
    Command(String),

    #[error("queue serialization error: {0}")]
    Serialization(String),
}

/// One received message, pending acknowledgment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Broker-assigned delivery id (used for acknowledgment).
    pub id: String,
    /// Partitioning key the producer published with (the task id).
    pub key: Option<String>,
    /// Raw message value.
    pub payload: String,
    /// How many times this message has been delivered (1 = first attempt).
    pub delivery_count: u32,
}

/// Entry in the dead-letter sink.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct DeadLetterEntry {
    pub id: String,
    /// Original message value, verbatim.
    pub payload: String,
    pub reason: String,
    pub failed_at: DateTime<Utc>,
}

/// Narration task topic + its dead-letter sink.
#[async_trait]
pub trait TaskQueue: Send + Sync {
    /// Publish a message keyed by `key` so all messages for one task land on
    /// the same partition (per-task ordering).
    async fn publish(&self, key: &str, payload: &str) -> Result<(), QueueError>;

    /// Receive the next delivery for `consumer_name`, waiting up to `wait`.
    /// Returns `None` on timeout.
    async fn receive(
        &self,
        consumer_name: &str,
        wait: Duration,
    ) -> Result<Option<Delivery>, QueueError>;

    /// Acknowledge a delivery. Unacknowledged deliveries are redelivered.
    async fn ack(&self, delivery_id: &str) -> Result<(), QueueError>;

    /// Forward a failed payload (verbatim) to the dead-letter sink.
    async fn send_to_dead_letter(&self, payload: &str, reason: &str) -> Result<(), QueueError>;

    /// List dead-letter entries, oldest first.
    async fn read_dead_letters(&self, limit: usize) -> Result<Vec<DeadLetterEntry>, QueueError>;
}
