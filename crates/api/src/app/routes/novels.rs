use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use fablecast_catalog::NovelDraft;
use fablecast_core::NovelId;

use crate::app::routes::episodes;
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_novel).get(list_novels))
        .route(
            "/:id",
            get(get_novel).put(update_novel).delete(delete_novel),
        )
        .route(
            "/:id/episodes",
            post(episodes::create_episode).get(episodes::list_episodes),
        )
}

fn to_draft(body: dto::NovelRequest) -> NovelDraft {
    NovelDraft {
        title: body.title,
        summary: body.summary,
        cover_image_url: body.cover_image_url,
        publication_year: body.publication_year,
        is_completed: body.is_completed,
        author: body.author,
        categories: body.categories,
    }
}

pub async fn create_novel(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::NovelRequest>,
) -> axum::response::Response {
    match services.catalog.create_novel(to_draft(body)) {
        Ok(summary) => (StatusCode::CREATED, Json(dto::novel_to_json(summary))).into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

pub async fn list_novels(
    Extension(services): Extension<Arc<AppServices>>,
    Query(params): Query<dto::PageQuery>,
) -> axum::response::Response {
    let result = match &params.query {
        Some(needle) => services
            .catalog
            .search_novels(needle, params.page, params.size),
        None => services.catalog.list_novels(params.page, params.size),
    };
    match result {
        Ok(page) => (
            StatusCode::OK,
            Json(dto::page_to_json(page, dto::novel_to_json)),
        )
            .into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

pub async fn get_novel(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: NovelId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid novel id"),
    };
    match services.catalog.novel_detail(id) {
        Ok(summary) => (StatusCode::OK, Json(dto::novel_to_json(summary))).into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

pub async fn update_novel(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::NovelRequest>,
) -> axum::response::Response {
    let id: NovelId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid novel id"),
    };
    match services.catalog.update_novel(id, to_draft(body)) {
        Ok(summary) => (StatusCode::OK, Json(dto::novel_to_json(summary))).into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

pub async fn delete_novel(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: NovelId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid novel id"),
    };
    match services.catalog.delete_novel(id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

pub async fn list_authors(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.catalog.list_authors() {
        Ok(authors) => {
            let items = authors.iter().map(dto::author_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::catalog_error_to_response(e),
    }
}

pub async fn list_categories(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.catalog.list_categories() {
        Ok(categories) => {
            let items = categories
                .iter()
                .map(dto::category_to_json)
                .collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::catalog_error_to_response(e),
    }
}
