use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};

use fablecast_core::MemberId;
use fablecast_members::Role;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(register_member).get(list_members))
        .route("/:id", get(get_member).delete(delete_member))
        .route("/:id/role", patch(update_role))
}

pub async fn register_member(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::RegisterMemberRequest>,
) -> axum::response::Response {
    let role: Role = match body.role.parse() {
        Ok(r) => r,
        Err(e) => return errors::domain_error_to_response(e),
    };
    match services.members.register(body.email, body.nickname, role) {
        Ok(member) => (StatusCode::CREATED, Json(dto::member_to_json(&member))).into_response(),
        Err(e) => errors::member_error_to_response(e),
    }
}

pub async fn list_members(
    Extension(services): Extension<Arc<AppServices>>,
    Query(params): Query<dto::PageQuery>,
) -> axum::response::Response {
    let role = match &params.role {
        Some(raw) => match raw.parse::<Role>() {
            Ok(r) => Some(r),
            Err(e) => return errors::domain_error_to_response(e),
        },
        None => None,
    };
    match services.members.list(params.page, params.size, role) {
        Ok(page) => (
            StatusCode::OK,
            Json(dto::page_to_json(page, |m| dto::member_to_json(&m))),
        )
            .into_response(),
        Err(e) => errors::member_error_to_response(e),
    }
}

pub async fn get_member(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: MemberId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid member id"),
    };
    match services.members.get(id) {
        Ok(member) => (StatusCode::OK, Json(dto::member_to_json(&member))).into_response(),
        Err(e) => errors::member_error_to_response(e),
    }
}

pub async fn update_role(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateRoleRequest>,
) -> axum::response::Response {
    let id: MemberId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid member id"),
    };
    match services.members.update_role(id, &body.role) {
        Ok(member) => (StatusCode::OK, Json(dto::member_to_json(&member))).into_response(),
        Err(e) => errors::member_error_to_response(e),
    }
}

pub async fn delete_member(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: MemberId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid member id"),
    };
    match services.members.delete(id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::member_error_to_response(e),
    }
}
