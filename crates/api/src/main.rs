use std::time::Duration;

use fablecast_api::app::{build_app, AppConfig};

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[tokio::main]
async fn main() {
    fablecast_observability::init();

    let config = AppConfig {
        redis_url: std::env::var("REDIS_URL").ok(),
        narration_api_url: std::env::var("NARRATION_API_URL").ok(),
        max_concurrent_calls: env_or("NARRATION_MAX_CONCURRENT", 5),
        workers: env_or("NARRATION_WORKERS", 8),
        status_ttl: Duration::from_secs(env_or("NARRATION_STATUS_TTL_SECS", 86_400)),
    };

    let app = build_app(config).await;

    let bind_addr =
        std::env::var("FABLECAST_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {bind_addr}: {e}"));

    tracing::info!("listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}
