//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors; per-request failures go through
//! `limiter::RateLimitError` and `kernel::error::AppError`.

mod config;

use axum::Router;
use axum::http::StatusCode;
use config::{AppConfig, StoreBackend};
use limiter::{
    Clock, CounterStore, InMemoryCounterStore, RedisCounterStore, SystemClock, WindowCounter,
    limiter_router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,limiter=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;

    tracing::info!(
        max_requests = config.limiter.rate_limit.max_requests,
        window_secs = config.limiter.rate_limit.window_secs(),
        mode = %config.limiter.mode,
        trust_forwarded = config.limiter.trust_forwarded,
        store = ?config.store,
        "Rate limiter configured"
    );

    let app = match config.store {
        StoreBackend::Redis => {
            let store =
                RedisCounterStore::connect(&config.redis_url, config.redis_key_prefix.clone())
                    .await?;
            build_app(store, &config)
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory counter store, limits are per process");
            let store = InMemoryCounterStore::new();
            spawn_purge_task(store.clone(), &config);
            build_app(store, &config)
        }
    };

    // Start server
    tracing::info!("Listening on {}", config.bind_addr);

    let listener = TcpListener::bind(config.bind_addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped");

    Ok(())
}

fn build_app<S>(store: S, config: &AppConfig) -> Router
where
    S: CounterStore + Send + Sync + 'static,
{
    let counter = WindowCounter::new(Arc::new(store), Arc::new(config.limiter.clone()));

    limiter_router(counter)
        .layer(request_timeout_layer(config.request_timeout))
        .layer(TraceLayer::new_for_http())
}

/// Requests that outlive `timeout` are answered with 408
fn request_timeout_layer(timeout: Duration) -> TimeoutLayer {
    TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, timeout)
}

/// Periodically drop expired windows so the in-memory store stays bounded
fn spawn_purge_task(store: InMemoryCounterStore, config: &AppConfig) {
    let rate_limit = config.limiter.rate_limit.clone();
    let period = rate_limit.window.max(Duration::from_secs(1));

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            let purged = store.purge_expired(SystemClock.now_unix(), &rate_limit);
            if purged > 0 {
                tracing::debug!(purged, remaining = store.len(), "Purged expired windows");
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
