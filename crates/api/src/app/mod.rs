//! HTTP application wiring (Axum router + service wiring).
//!
//! Layout:
//! - `services.rs`: infrastructure wiring (queue, status store, narration
//!   client, consumer spawn)
//! - `routes/`: HTTP routes + handlers (one file per domain area)
//! - `dto.rs`: request/response DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::AppServices;

/// Process configuration, read from the environment by `main.rs`.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// `Some` selects the Redis-backed queue/status store (requires the
    /// `redis` feature); `None` runs fully in memory.
    pub redis_url: Option<String>,
    /// `Some` selects the HTTP narration client; `None` uses the stub.
    pub narration_api_url: Option<String>,
    pub max_concurrent_calls: usize,
    pub workers: usize,
    pub status_ttl: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            narration_api_url: None,
            max_concurrent_calls: 5,
            workers: 8,
            status_ttl: Duration::from_secs(86_400),
        }
    }
}

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub async fn build_app(config: AppConfig) -> Router {
    let services = Arc::new(services::build_services(config).await);
    build_app_with(services)
}

/// Build the router on top of already-wired services (used by tests).
pub fn build_app_with(services: Arc<AppServices>) -> Router {
    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router())
        .layer(Extension(services))
        .layer(ServiceBuilder::new())
}
