//! External narration (TTS) service abstraction.

use async_trait::async_trait;
use uuid::Uuid;

use fablecast_core::{EpisodeId, NovelId, ScriptId};

/// References to the generated artifacts, as reported by the narration
/// service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NarrationOutput {
    pub audio_id: Uuid,
    pub metadata_id: Uuid,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum NarrationError {
    /// The request never produced a usable response (connect/timeout/decode).
    #[error("narration transport error: {0}")]
    Transport(String),

    /// The service answered with `success: false`.
    #[error("narration rejected: {0}")]
    Rejected(String),

    /// The wait for a concurrency permit was interrupted.
    #[error("narration interrupted while waiting for a permit")]
    Interrupted,
}

/// Synchronous-call contract to the external narration API.
///
/// No retry/backoff here: a failed invocation dead-letters the task and the
/// dead-letter sink is the retry path.
#[async_trait]
pub trait NarrationClient: Send + Sync {
    async fn invoke(
        &self,
        novel_id: NovelId,
        episode_id: EpisodeId,
        script_id: ScriptId,
    ) -> Result<NarrationOutput, NarrationError>;
}

/// Stub client for dev wiring and tests.
///
/// Succeeds immediately with fresh artifact ids. Failures can be scripted
/// globally ([`StubNarrationClient::set_fail_all`]) or per episode
/// ([`StubNarrationClient::fail_episode`]).
#[derive(Debug, Default)]
pub struct StubNarrationClient {
    failing_episodes: std::sync::Mutex<std::collections::HashSet<EpisodeId>>,
    fail_all: std::sync::atomic::AtomicBool,
}

impl StubNarrationClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every invocation for `episode_id` fail with a rejection.
    pub fn fail_episode(&self, episode_id: EpisodeId) {
        if let Ok(mut failing) = self.failing_episodes.lock() {
            failing.insert(episode_id);
        }
    }

    /// Make every invocation fail until turned off again.
    pub fn set_fail_all(&self, fail: bool) {
        self.fail_all
            .store(fail, std::sync::atomic::Ordering::SeqCst);
    }
}

#[async_trait]
impl NarrationClient for StubNarrationClient {
    async fn invoke(
        &self,
        _novel_id: NovelId,
        episode_id: EpisodeId,
        _script_id: ScriptId,
    ) -> Result<NarrationOutput, NarrationError> {
        if self.fail_all.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(NarrationError::Rejected(
                "stub configured to fail all tasks".to_string(),
            ));
        }
        let failing = self
            .failing_episodes
            .lock()
            .map(|set| set.contains(&episode_id))
            .unwrap_or(false);
        if failing {
            return Err(NarrationError::Rejected(format!(
                "stub configured to fail episode {episode_id}"
            )));
        }
        Ok(NarrationOutput {
            audio_id: Uuid::now_v7(),
            metadata_id: Uuid::now_v7(),
        })
    }
}
