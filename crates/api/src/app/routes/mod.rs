use axum::{routing::get, Router};

pub mod episodes;
pub mod members;
pub mod novels;
pub mod system;
pub mod tasks;

/// Router for all API endpoints.
pub fn router() -> Router {
    Router::new()
        .nest("/api/novels", novels::router())
        .nest("/api/episodes", episodes::router())
        .route("/api/authors", get(novels::list_authors))
        .route("/api/categories", get(novels::list_categories))
        .nest("/api/members", members::router())
        .nest("/api/admin", tasks::router())
}
