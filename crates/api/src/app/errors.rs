use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use fablecast_catalog::{CatalogError, CatalogStoreError};
use fablecast_core::DomainError;
use fablecast_members::{MemberError, MemberStoreError};
use fablecast_narration::ProducerError;

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        DomainError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        DomainError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        DomainError::PageOutOfBounds { requested, total } => json_error(
            StatusCode::BAD_REQUEST,
            "page_out_of_bounds",
            format!("page {requested} out of bounds (total pages: {total})"),
        ),
    }
}

pub fn catalog_error_to_response(err: CatalogError) -> axum::response::Response {
    match err {
        CatalogError::Domain(e) => domain_error_to_response(e),
        CatalogError::Store(CatalogStoreError::NotFound) => {
            json_error(StatusCode::NOT_FOUND, "not_found", "not found")
        }
        CatalogError::Store(CatalogStoreError::AlreadyExists(what)) => {
            json_error(StatusCode::CONFLICT, "conflict", what)
        }
        CatalogError::Store(CatalogStoreError::Storage(msg)) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", msg)
        }
    }
}

pub fn member_error_to_response(err: MemberError) -> axum::response::Response {
    match err {
        MemberError::Domain(e) => domain_error_to_response(e),
        MemberError::Store(MemberStoreError::NotFound) => {
            json_error(StatusCode::NOT_FOUND, "not_found", "not found")
        }
        MemberError::Store(MemberStoreError::AlreadyExists(what)) => {
            json_error(StatusCode::CONFLICT, "conflict", what)
        }
        MemberError::Store(MemberStoreError::Storage(msg)) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", msg)
        }
    }
}

pub fn producer_error_to_response(err: ProducerError) -> axum::response::Response {
    match err {
        ProducerError::Queue(e) => json_error(StatusCode::BAD_GATEWAY, "publish_error", e.to_string()),
        ProducerError::Status(e) => json_error(StatusCode::BAD_GATEWAY, "status_error", e.to_string()),
        ProducerError::Encode(e) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "encode_error", e.to_string())
        }
    }
}
