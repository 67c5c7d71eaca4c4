//! Infrastructure wiring: queue, status store, narration client, consumer.

use std::sync::Arc;

use fablecast_catalog::{CatalogService, InMemoryCatalogStore};
use fablecast_members::{InMemoryMemberStore, MemberService};
use fablecast_narration::{
    ConsumerHandle, InMemoryStatusStore, InMemoryTaskQueue, NarrationClient, NarrationConsumer,
    NarrationConsumerConfig, NarrationOutput, NarrationOutputSink, NarrationProducer, StatusStore,
    StubNarrationClient, TaskId, TaskQueue,
};

use fablecast_infra::HttpNarrationClient;
#[cfg(feature = "redis")]
use fablecast_infra::{RedisStatusStore, RedisStreamsTaskQueue};

use super::AppConfig;

/// Everything the handlers need, behind one `Extension`.
pub struct AppServices {
    pub catalog: CatalogService,
    pub members: MemberService,
    pub producer: NarrationProducer,
    pub status: Arc<dyn StatusStore>,
    pub queue: Arc<dyn TaskQueue>,
    pub consumer: ConsumerHandle,
}

/// Persists the generated-audio artifact into the catalog when a
/// narration task completes.
struct AudioArtifactRecorder {
    catalog: CatalogService,
}

impl NarrationOutputSink for AudioArtifactRecorder {
    fn on_completed(&self, task_id: &TaskId, output: &NarrationOutput) {
        if let Err(e) = self.catalog.record_audio(task_id.episode_id, output.audio_id) {
            tracing::warn!(task_id = %task_id, error = %e, "failed to record audio artifact");
        }
    }
}

impl AppServices {
    /// Wire the full stack over the given transports and client.
    pub fn wire(
        queue: Arc<dyn TaskQueue>,
        status: Arc<dyn StatusStore>,
        client: Arc<dyn NarrationClient>,
        consumer_config: NarrationConsumerConfig,
    ) -> Self {
        let catalog = CatalogService::new(Arc::new(InMemoryCatalogStore::new()));
        let producer = NarrationProducer::new(queue.clone(), status.clone());
        let consumer =
            NarrationConsumer::new(queue.clone(), status.clone(), client, consumer_config)
                .with_output_sink(Arc::new(AudioArtifactRecorder {
                    catalog: catalog.clone(),
                }))
                .spawn();

        Self {
            catalog,
            members: MemberService::new(Arc::new(InMemoryMemberStore::new())),
            producer,
            status,
            queue,
            consumer,
        }
    }

    /// Fully in-memory wiring with an injectable narration client (tests).
    pub fn in_memory(
        client: Arc<dyn NarrationClient>,
        consumer_config: NarrationConsumerConfig,
    ) -> Self {
        let queue: Arc<dyn TaskQueue> = Arc::new(InMemoryTaskQueue::new());
        let status: Arc<dyn StatusStore> = Arc::new(InMemoryStatusStore::new());
        Self::wire(queue, status, client, consumer_config)
    }
}

/// Build services from process configuration.
///
/// `REDIS_URL` absent (or the `redis` feature disabled) falls back to the
/// in-memory transports; `NARRATION_API_URL` absent falls back to the stub
/// client.
pub async fn build_services(config: AppConfig) -> AppServices {
    let consumer_config = NarrationConsumerConfig::default()
        .with_max_concurrent_calls(config.max_concurrent_calls)
        .with_workers(config.workers);

    let client: Arc<dyn NarrationClient> = match &config.narration_api_url {
        Some(url) => Arc::new(
            HttpNarrationClient::new(url.clone()).expect("failed to build narration HTTP client"),
        ),
        None => {
            tracing::warn!("NARRATION_API_URL not set; using stub narration client");
            Arc::new(StubNarrationClient::new())
        }
    };

    match config.redis_url {
        #[cfg(feature = "redis")]
        Some(redis_url) => {
            let queue = RedisStreamsTaskQueue::new(&redis_url, None, None)
                .expect("failed to create Redis Streams task queue");
            queue
                .ensure_consumer_group()
                .await
                .expect("failed to create consumer group");
            let status = RedisStatusStore::with_ttl(&redis_url, config.status_ttl)
                .expect("failed to create Redis status store");

            AppServices::wire(Arc::new(queue), Arc::new(status), client, consumer_config)
        }
        #[cfg(not(feature = "redis"))]
        Some(_) => {
            tracing::warn!("REDIS_URL set but redis feature not enabled, falling back to in-memory");
            AppServices::in_memory(client, consumer_config)
        }
        None => AppServices::in_memory(client, consumer_config),
    }
}
