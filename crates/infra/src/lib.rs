//! Infrastructure layer: Redis adapters and the external narration client.

pub mod client;
pub mod queue;
pub mod status_store;

pub use client::HttpNarrationClient;
#[cfg(feature = "redis")]
pub use queue::RedisStreamsTaskQueue;
#[cfg(feature = "redis")]
pub use status_store::RedisStatusStore;
