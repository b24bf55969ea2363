//! Route Preload - predictive route-module preloading
//!
//! Serves the preload bridge over HTTP for a rendering host.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tokio::task::AbortHandle;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use route_preload::{
    create_router, normalize_route, select_deferral, spawn_cleanup_task, AppState, Config,
    FsModuleLoader, HostLifecycle, JsonFilePatternStore, PreloadEngine, SharedNetworkSignal,
    WarmupScheduler,
};

/// Main entry point for the route preload server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Build the engine over the module directory and pattern file
/// 4. Start the warm-up pass and the stale sweep
/// 5. Serve the bridge until SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "route_preload=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Route Preload Server");

    let config = Config::from_env();
    info!(
        "Configuration loaded: max_cache_size={}, cache_ttl={}s, port={}, cleanup_interval={}s, known_routes={}",
        config.preload.max_cache_size,
        config.preload.cache_ttl.as_secs(),
        config.server_port,
        config.cleanup_interval,
        config.known_routes.len()
    );

    let network = Arc::new(SharedNetworkSignal::new(config.network_class));
    let engine = PreloadEngine::new(
        config.preload.clone(),
        Arc::new(FsModuleLoader::new(
            config.module_dir.clone(),
            config.module_extension.clone(),
        )),
        network.clone(),
        Arc::new(JsonFilePatternStore::new(config.pattern_file.clone())),
    );
    engine.register_routes(config.known_routes.iter().map(|r| normalize_route(r)));
    info!("Preload engine initialized");

    let lifecycle = Arc::new(HostLifecycle::new());
    let deferral = select_deferral(
        config.idle_signal.then(|| lifecycle.clone()),
        config.preload.idle_fallback_delay,
    );
    let warmup = WarmupScheduler::new(
        config.critical_routes.iter().map(|r| normalize_route(r)).collect(),
        config
            .high_priority_routes
            .iter()
            .map(|r| normalize_route(r))
            .collect(),
        deferral,
    )
    .start(&engine)?;
    let warmup_abort = warmup.abort_handle();
    tokio::spawn(async move {
        match warmup.await {
            Ok(report) => info!(?report, "Warm-up finished"),
            Err(e) if e.is_cancelled() => {}
            Err(e) => error!("Warm-up task failed: {}", e),
        }
    });

    let cleanup_handle = spawn_cleanup_task(engine.clone(), config.cleanup_interval);
    info!("Background cleanup task started");

    let app = create_router(AppState::new(engine.clone(), network, lifecycle));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(vec![
            warmup_abort,
            cleanup_handle.abort_handle(),
        ]))
        .await
        .context("server error")?;

    engine.flush_patterns().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM), then aborts the
/// background tasks.
async fn shutdown_signal(tasks: Vec<AbortHandle>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    for task in &tasks {
        task.abort();
    }
    warn!("Background tasks aborted");
}
