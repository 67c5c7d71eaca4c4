//! `fablecast-narration` — asynchronous episode-narration (TTS) job pipeline.
//!
//! Episode creation publishes a task message to a topic; worker tasks consume
//! it, gate concurrent calls to the external narration API behind a counting
//! semaphore, track lifecycle state in a status store, and forward failures to
//! a dead-letter sink.
//!
//! The abstractions here (queue, status store, client) are transport-agnostic;
//! `fablecast-infra` provides the Redis/HTTP implementations, and the
//! in-memory implementations in this crate back tests and dev wiring.

pub mod client;
pub mod consumer;
pub mod in_memory_queue;
pub mod message;
pub mod producer;
pub mod queue;
pub mod status_store;
pub mod task;

pub use client::{NarrationClient, NarrationError, NarrationOutput, StubNarrationClient};
pub use consumer::{
    ConsumerHandle, ConsumerStats, NarrationConsumer, NarrationConsumerConfig,
    NarrationOutputSink,
};
pub use in_memory_queue::InMemoryTaskQueue;
pub use message::{MessageParseError, NarrationRequest, ENVELOPE_VERSION};
pub use producer::{NarrationProducer, ProducerError};
pub use queue::{DeadLetterEntry, Delivery, QueueError, TaskQueue};
pub use status_store::{InMemoryStatusStore, StatusStore, StatusStoreError};
pub use task::{JobStatusView, TaskId, TaskStatus};
