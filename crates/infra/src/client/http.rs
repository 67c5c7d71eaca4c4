//! HTTP client for the external narration (TTS) service.
//!
//! Single blocking-style call: `POST <base>/tts/` with the three task ids,
//! answered only once the audio has been generated. The request timeout is
//! therefore generous (30s by default).

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use fablecast_core::{EpisodeId, NovelId, ScriptId};
use fablecast_narration::{NarrationClient, NarrationError, NarrationOutput};

/// Default end-to-end request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct HttpNarrationClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TtsRequest {
    novel_id: NovelId,
    episode_id: EpisodeId,
    script_id: ScriptId,
}

#[derive(Debug, Deserialize)]
struct TtsResponse {
    success: bool,
    audio_uuid: Option<Uuid>,
    metadata_uuid: Option<Uuid>,
    error: Option<String>,
}

impl HttpNarrationClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, NarrationError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, NarrationError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NarrationError::Transport(e.to_string()))?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { http, base_url })
    }

    fn tts_url(&self) -> String {
        format!("{}/tts/", self.base_url)
    }
}

#[async_trait]
impl NarrationClient for HttpNarrationClient {
    #[instrument(skip(self), fields(%novel_id, %episode_id, %script_id), err)]
    async fn invoke(
        &self,
        novel_id: NovelId,
        episode_id: EpisodeId,
        script_id: ScriptId,
    ) -> Result<NarrationOutput, NarrationError> {
        let request = TtsRequest {
            novel_id,
            episode_id,
            script_id,
        };

        let response = self
            .http
            .post(self.tts_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| NarrationError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(NarrationError::Rejected(format!(
                "narration service returned {}",
                response.status()
            )));
        }

        let body: TtsResponse = response
            .json()
            .await
            .map_err(|e| NarrationError::Transport(e.to_string()))?;

        if !body.success {
            return Err(NarrationError::Rejected(
                body.error.unwrap_or_else(|| "unspecified failure".to_string()),
            ));
        }

        match (body.audio_uuid, body.metadata_uuid) {
            (Some(audio_id), Some(metadata_id)) => Ok(NarrationOutput {
                audio_id,
                metadata_id,
            }),
            _ => Err(NarrationError::Transport(
                "success response missing artifact ids".to_string(),
            )),
        }
    }
}
