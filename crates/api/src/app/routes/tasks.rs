//! Admin endpoints for the narration pipeline: status polling, DLQ
//! inspection, manual resubmission, consumer stats.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use fablecast_core::EpisodeId;
use fablecast_narration::{JobStatusView, TaskId};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/tasks/:task_id/status", get(task_status))
        .route("/tasks/:task_id", post(resubmit_task))
        .route(
            "/episodes/:episode_id/narration-status",
            get(episode_narration_status),
        )
        .route("/narration/dlq", get(dead_letters))
        .route("/narration/stats", get(consumer_stats))
}

pub async fn task_status(
    Extension(services): Extension<Arc<AppServices>>,
    Path(task_id): Path<String>,
) -> axum::response::Response {
    let task_id: TaskId = match task_id.parse() {
        Ok(v) => v,
        Err(e) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", e.to_string()),
    };

    match services.status.get(&task_id).await {
        Ok(Some(status)) => (
            StatusCode::OK,
            Json(dto::task_status_to_json(&task_id, JobStatusView::from(status))),
        )
            .into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "unknown task"),
        Err(e) => errors::json_error(StatusCode::BAD_GATEWAY, "status_error", e.to_string()),
    }
}

pub async fn episode_narration_status(
    Extension(services): Extension<Arc<AppServices>>,
    Path(episode_id): Path<String>,
) -> axum::response::Response {
    let episode_id: EpisodeId = match episode_id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid episode id"),
    };

    match services.status.find_by_episode(episode_id).await {
        Ok(Some((task_id, status))) => (
            StatusCode::OK,
            Json(dto::task_status_to_json(&task_id, JobStatusView::from(status))),
        )
            .into_response(),
        Ok(None) => errors::json_error(
            StatusCode::NOT_FOUND,
            "not_found",
            "no narration task for episode",
        ),
        Err(e) => errors::json_error(StatusCode::BAD_GATEWAY, "status_error", e.to_string()),
    }
}

/// Manually (re)publish a task, e.g. after inspecting the DLQ.
pub async fn resubmit_task(
    Extension(services): Extension<Arc<AppServices>>,
    Path(task_id): Path<String>,
    Json(body): Json<dto::ResubmitTaskRequest>,
) -> axum::response::Response {
    let task_id: TaskId = match task_id.parse() {
        Ok(v) => v,
        Err(e) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", e.to_string()),
    };

    match services.producer.publish(&task_id, &body.data).await {
        Ok(()) => (
            StatusCode::ACCEPTED,
            Json(serde_json::json!({
                "taskId": task_id.to_string(),
                "status": "PENDING",
            })),
        )
            .into_response(),
        Err(e) => errors::producer_error_to_response(e),
    }
}

pub async fn dead_letters(
    Extension(services): Extension<Arc<AppServices>>,
    Query(params): Query<dto::DlqQuery>,
) -> axum::response::Response {
    match services.queue.read_dead_letters(params.limit).await {
        Ok(entries) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "count": entries.len(),
                "items": entries,
            })),
        )
            .into_response(),
        Err(e) => errors::json_error(StatusCode::BAD_GATEWAY, "queue_error", e.to_string()),
    }
}

pub async fn consumer_stats(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    (StatusCode::OK, Json(services.consumer.stats())).into_response()
}
