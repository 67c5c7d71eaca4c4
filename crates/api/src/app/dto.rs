use serde::Deserialize;

use fablecast_catalog::{Author, Category, Episode, NovelSummary, ReleaseStatus};
use fablecast_core::Page;
use fablecast_members::Member;
use fablecast_narration::{JobStatusView, TaskId};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct NovelRequest {
    pub title: String,
    #[serde(default)]
    pub summary: String,
    pub cover_image_url: Option<String>,
    pub publication_year: Option<i32>,
    #[serde(default)]
    pub is_completed: bool,
    pub author: String,
    #[serde(default)]
    pub categories: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateEpisodeRequest {
    pub title: String,
    pub release_status: ReleaseStatus,
    pub scheduled_release_date: Option<chrono::DateTime<chrono::Utc>>,
    /// Script text to narrate; carried as the task envelope payload.
    pub script: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateEpisodeRequest {
    pub title: String,
    pub release_status: ReleaseStatus,
    pub scheduled_release_date: Option<chrono::DateTime<chrono::Utc>>,
    /// Re-uploaded script text; `Some` publishes a fresh narration task.
    pub script: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterMemberRequest {
    pub email: String,
    pub nickname: String,
    #[serde(default = "default_role")]
    pub role: String,
}

fn default_role() -> String {
    "USER".to_string()
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: String,
}

#[derive(Debug, Deserialize)]
pub struct ResubmitTaskRequest {
    #[serde(default)]
    pub data: String,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: usize,
    #[serde(default = "default_size")]
    pub size: usize,
    /// Title substring filter (novel listing only).
    pub query: Option<String>,
    /// Role filter (member listing only).
    pub role: Option<String>,
}

fn default_page() -> usize {
    1
}

fn default_size() -> usize {
    10
}

#[derive(Debug, Deserialize)]
pub struct DlqQuery {
    #[serde(default = "default_dlq_limit")]
    pub limit: usize,
}

fn default_dlq_limit() -> usize {
    50
}

// -------------------------
// JSON mapping helpers
// -------------------------

pub fn novel_to_json(summary: NovelSummary) -> serde_json::Value {
    let novel = summary.novel;
    serde_json::json!({
        "id": novel.id.to_string(),
        "title": novel.title,
        "summary": novel.summary,
        "cover_image_url": novel.cover_image_url,
        "publication_year": novel.publication_year,
        "is_completed": novel.is_completed,
        "view_count": novel.view_count,
        "authors": summary.authors,
        "categories": summary.categories,
        "created_at": novel.created_at.to_rfc3339(),
        "updated_at": novel.updated_at.to_rfc3339(),
    })
}

pub fn episode_to_json(episode: &Episode) -> serde_json::Value {
    serde_json::json!({
        "id": episode.id.to_string(),
        "novel_id": episode.novel_id.to_string(),
        "title": episode.title,
        "chapter_number": episode.chapter_number,
        "release_status": episode.release_status,
        "scheduled_release_date": episode.scheduled_release_date.map(|d| d.to_rfc3339()),
        "released_date": episode.released_date.map(|d| d.to_rfc3339()),
        "view_count": episode.view_count,
        "created_at": episode.created_at.to_rfc3339(),
        "updated_at": episode.updated_at.to_rfc3339(),
    })
}

pub fn author_to_json(author: &Author) -> serde_json::Value {
    serde_json::json!({
        "id": author.id.to_string(),
        "name": author.name,
    })
}

pub fn category_to_json(category: &Category) -> serde_json::Value {
    serde_json::json!({
        "id": category.id.to_string(),
        "name": category.name,
    })
}

pub fn member_to_json(member: &Member) -> serde_json::Value {
    serde_json::json!({
        "id": member.id.to_string(),
        "email": member.email,
        "nickname": member.nickname,
        "profile_image_url": member.profile_image_url,
        "role": member.role.as_str(),
        "created_at": member.created_at.to_rfc3339(),
        "updated_at": member.updated_at.to_rfc3339(),
    })
}

pub fn page_to_json<T>(page: Page<T>, map: impl Fn(T) -> serde_json::Value) -> serde_json::Value {
    serde_json::json!({
        "items": page.items.into_iter().map(map).collect::<Vec<_>>(),
        "page": page.page,
        "size": page.size,
        "total_elements": page.total_elements,
        "total_pages": page.total_pages,
    })
}

pub fn task_status_to_json(task_id: &TaskId, view: JobStatusView) -> serde_json::Value {
    serde_json::json!({
        "taskId": task_id.to_string(),
        "status": view.as_str(),
    })
}
