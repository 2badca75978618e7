use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use metered_kv::{Config, LogSink, MeteredStorage, MetricsAggregator, RedisStorage, Storage};

mod handlers;
mod middleware;
mod server;

/// Shared application state available to every handler via `State<Arc<AppState>>`.
pub struct AppState {
    /// Redis client wrapped in the timing decorator.
    pub storage: Arc<dyn Storage>,

    /// Sample buffer. The decorator pushes samples, the flush task drains them.
    pub metrics: Arc<MetricsAggregator>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run(Config::from_env()).await {
        error!(error = %e, "metered-kv exited with error");
        std::process::exit(1);
    }
}

async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    // ── 1. Connect to Redis ──────────────────────────────────────
    info!(url = %config.redis_url, "connecting to redis");
    let redis = RedisStorage::connect(&config.redis_url).await?;

    // ── 2. Start the metrics aggregator ──────────────────────────
    let shutdown = CancellationToken::new();
    let (metrics, aggregator) =
        MetricsAggregator::spawn(config.aggregator.clone(), Arc::new(LogSink), shutdown.clone());

    // ── 3. Build shared state ────────────────────────────────────
    let state = Arc::new(AppState {
        storage: Arc::new(MeteredStorage::new(redis, metrics.clone())),
        metrics,
    });

    // ── 4. Bind & serve ──────────────────────────────────────────
    let app = server::create_router(state);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %config.bind_addr, "server listening");

    let signal = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => info!("ctrl-c received, shutting down"),
                _ = signal.cancelled() => {}
            }
        })
        .await?;

    // ── 5. Stop the flush task ───────────────────────────────────
    shutdown.cancel();
    aggregator.shutdown().await;
    Ok(())
}
