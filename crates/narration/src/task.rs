//! Task identity and lifecycle status.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use fablecast_core::{DomainError, EpisodeId, NovelId, ScriptId};

/// Delimiter inside the canonical task-id encoding.
///
/// Colon, never dash: a dash would collide with the UUID's own internal
/// delimiter and make the encoding ambiguous.
const TASK_ID_DELIMITER: char = ':';

/// Composite identifier of one narration task.
///
/// Canonical encoding is `novelId:episodeId:scriptId`. The encoding is part of
/// the wire/message contract and of the status-store key format, so it round
/// trips exactly through `Display`/`FromStr`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct TaskId {
    pub novel_id: NovelId,
    pub episode_id: EpisodeId,
    pub script_id: ScriptId,
}

impl TaskId {
    pub fn new(novel_id: NovelId, episode_id: EpisodeId, script_id: ScriptId) -> Self {
        Self {
            novel_id,
            episode_id,
            script_id,
        }
    }
}

impl core::fmt::Display for TaskId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{}{delim}{}{delim}{}",
            self.novel_id,
            self.episode_id,
            self.script_id,
            delim = TASK_ID_DELIMITER
        )
    }
}

impl FromStr for TaskId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let segments: Vec<&str> = s.split(TASK_ID_DELIMITER).collect();
        let [novel, episode, script] = segments[..] else {
            return Err(DomainError::invalid_id(format!(
                "TaskId: expected 3 segments, got {}",
                segments.len()
            )));
        };

        Ok(Self {
            novel_id: novel.parse()?,
            episode_id: episode.parse()?,
            script_id: script.parse()?,
        })
    }
}

impl From<TaskId> for String {
    fn from(value: TaskId) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for TaskId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Lifecycle status of a narration task.
///
/// Transitions: `Pending` → `Start` → `Completed` | `Failed`. Terminal states
/// are never left; `Start` is never skipped.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Pending,
    Start,
    Completed,
    Failed,
}

impl TaskStatus {
    /// Store/wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "PENDING",
            TaskStatus::Start => "START",
            TaskStatus::Completed => "COMPLETED",
            TaskStatus::Failed => "FAILED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

impl core::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(TaskStatus::Pending),
            "START" => Ok(TaskStatus::Start),
            "COMPLETED" => Ok(TaskStatus::Completed),
            "FAILED" => Ok(TaskStatus::Failed),
            other => Err(DomainError::validation(format!(
                "unknown task status: {other}"
            ))),
        }
    }
}

/// Public status vocabulary exposed by the query endpoints.
///
/// Anything that is not completed or running reads as pending, including
/// failed tasks (failures surface through the dead-letter queue, not the
/// polling endpoint).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatusView {
    JobPending,
    JobStart,
    JobSuccess,
}

impl JobStatusView {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatusView::JobPending => "JOB_PENDING",
            JobStatusView::JobStart => "JOB_START",
            JobStatusView::JobSuccess => "JOB_SUCCESS",
        }
    }
}

impl From<TaskStatus> for JobStatusView {
    fn from(status: TaskStatus) -> Self {
        match status {
            TaskStatus::Completed => JobStatusView::JobSuccess,
            TaskStatus::Start => JobStatusView::JobStart,
            TaskStatus::Pending | TaskStatus::Failed => JobStatusView::JobPending,
        }
    }
}
