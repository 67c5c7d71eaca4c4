use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use fablecast_catalog::EpisodeDraft;
use fablecast_core::{EpisodeId, NovelId};
use fablecast_narration::TaskId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new().route(
        "/:id",
        get(get_episode).put(update_episode).delete(delete_episode),
    )
}

/// Create an episode under a novel and kick off its narration task.
pub async fn create_episode(
    Extension(services): Extension<Arc<AppServices>>,
    Path(novel_id): Path<String>,
    Json(body): Json<dto::CreateEpisodeRequest>,
) -> axum::response::Response {
    let novel_id: NovelId = match novel_id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid novel id"),
    };

    let draft = EpisodeDraft {
        title: body.title,
        release_status: body.release_status,
        scheduled_release_date: body.scheduled_release_date,
    };
    let (episode, script) = match services.catalog.create_episode(novel_id, draft) {
        Ok(created) => created,
        Err(e) => return errors::catalog_error_to_response(e),
    };

    let task_id = TaskId::new(novel_id, episode.id, script.id);
    if let Err(e) = services.producer.publish(&task_id, &body.script).await {
        return errors::producer_error_to_response(e);
    }

    let mut response = dto::episode_to_json(&episode);
    response["task_id"] = serde_json::Value::String(task_id.to_string());
    (StatusCode::CREATED, Json(response)).into_response()
}

pub async fn list_episodes(
    Extension(services): Extension<Arc<AppServices>>,
    Path(novel_id): Path<String>,
) -> axum::response::Response {
    let novel_id: NovelId = match novel_id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid novel id"),
    };
    match services.catalog.episodes_of_novel(novel_id) {
        Ok(episodes) => {
            let items = episodes.iter().map(dto::episode_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::catalog_error_to_response(e),
    }
}

pub async fn get_episode(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: EpisodeId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid episode id"),
    };
    match services.catalog.episode_detail(id) {
        Ok(episode) => (StatusCode::OK, Json(dto::episode_to_json(&episode))).into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

/// Update an episode; a re-uploaded script publishes a fresh narration task
/// for the same script record.
pub async fn update_episode(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateEpisodeRequest>,
) -> axum::response::Response {
    let id: EpisodeId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid episode id"),
    };

    let draft = EpisodeDraft {
        title: body.title,
        release_status: body.release_status,
        scheduled_release_date: body.scheduled_release_date,
    };
    let episode = match services.catalog.update_episode(id, draft) {
        Ok(updated) => updated,
        Err(e) => return errors::catalog_error_to_response(e),
    };

    let mut response = dto::episode_to_json(&episode);
    if let Some(script_text) = body.script {
        let script = match services.catalog.script_for_episode(id) {
            Ok(record) => record,
            Err(e) => return errors::catalog_error_to_response(e),
        };
        let task_id = TaskId::new(episode.novel_id, episode.id, script.id);
        if let Err(e) = services.producer.publish(&task_id, &script_text).await {
            return errors::producer_error_to_response(e);
        }
        response["task_id"] = serde_json::Value::String(task_id.to_string());
    }
    (StatusCode::OK, Json(response)).into_response()
}

pub async fn delete_episode(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: EpisodeId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid episode id"),
    };
    match services.catalog.delete_episode(id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}
