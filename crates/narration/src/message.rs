//! Versioned message envelope for the narration topic.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::task::TaskId;

/// Current envelope version. Consumers reject anything else.
pub const ENVELOPE_VERSION: u32 = 1;

/// Envelope published to the narration topic.
///
/// `data` carries the script reference as opaque text; on failure it is
/// forwarded to the dead-letter sink byte-for-byte as part of the original
/// payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NarrationRequest {
    pub v: u32,
    pub task_id: TaskId,
    #[serde(default)]
    pub data: String,
}

#[derive(Debug, Error)]
pub enum MessageParseError {
    #[error("malformed narration message: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("unsupported envelope version: {0}")]
    UnsupportedVersion(u32),
}

impl NarrationRequest {
    pub fn new(task_id: TaskId, data: impl Into<String>) -> Self {
        Self {
            v: ENVELOPE_VERSION,
            task_id,
            data: data.into(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn parse(raw: &str) -> Result<Self, MessageParseError> {
        let envelope: NarrationRequest = serde_json::from_str(raw)?;
        if envelope.v != ENVELOPE_VERSION {
            return Err(MessageParseError::UnsupportedVersion(envelope.v));
        }
        Ok(envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fablecast_core::{EpisodeId, NovelId, ScriptId};

    fn task_id() -> TaskId {
        TaskId::new(NovelId::new(), EpisodeId::new(), ScriptId::new())
    }

    #[test]
    fn envelope_round_trips() {
        let request = NarrationRequest::new(task_id(), "scripts/abc.txt");
        let parsed = NarrationRequest::parse(&request.to_json().unwrap()).unwrap();
        assert_eq!(parsed, request);
    }

    #[test]
    fn envelope_uses_camel_case_task_id_field() {
        let json = NarrationRequest::new(task_id(), "").to_json().unwrap();
        assert!(json.contains("\"taskId\""));
    }

    #[test]
    fn rejects_future_versions() {
        let raw = format!(
            "{{\"v\":2,\"taskId\":\"{}\",\"data\":\"\"}}",
            task_id()
        );
        assert!(matches!(
            NarrationRequest::parse(&raw),
            Err(MessageParseError::UnsupportedVersion(2))
        ));
    }

    #[test]
    fn rejects_raw_task_id_without_envelope() {
        // Earlier producers sent the bare task id; v1 consumers treat that as
        // malformed and dead-letter it.
        assert!(NarrationRequest::parse(&task_id().to_string()).is_err());
    }
}
