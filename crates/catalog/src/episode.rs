//! Episode entity and its script record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use fablecast_core::{Entity, EpisodeId, NovelId, ScriptId};

/// Release lifecycle of an episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReleaseStatus {
    Public,
    Private,
    Scheduled,
}

/// An episode of a novel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Episode {
    pub id: EpisodeId,
    pub novel_id: NovelId,
    pub title: String,
    /// Auto-assigned: highest chapter in the novel plus one.
    pub chapter_number: u32,
    pub release_status: ReleaseStatus,
    pub scheduled_release_date: Option<DateTime<Utc>>,
    pub released_date: Option<DateTime<Utc>>,
    pub view_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Episode {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

impl Entity for Episode {
    type Id = EpisodeId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Kind of file attached to an episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScriptKind {
    Script,
    Audio,
}

/// File-metadata record for an episode's script (or generated audio).
///
/// The `path` is the stable storage reference handed to the narration
/// pipeline; the actual bytes live outside this system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptRecord {
    pub id: ScriptId,
    pub episode_id: EpisodeId,
    pub kind: ScriptKind,
    pub path: String,
    pub created_at: DateTime<Utc>,
}

impl ScriptRecord {
    /// Derive the canonical storage path for an episode script.
    pub fn script_path(novel_id: NovelId, episode_id: EpisodeId, script_id: ScriptId) -> String {
        format!("novels/{novel_id}/episodes/{episode_id}/script/{script_id}")
    }

    /// Derive the canonical storage path for an episode's generated audio.
    pub fn audio_path(novel_id: NovelId, episode_id: EpisodeId, audio_id: ScriptId) -> String {
        format!("novels/{novel_id}/episodes/{episode_id}/audio/{audio_id}")
    }
}

impl Entity for ScriptRecord {
    type Id = ScriptId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
