//! API Routes
//!
//! Configures the Axum router with all preload bridge endpoints.

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    batch_preload_handler, health_handler, idle_handler, navigation_handler, network_handler,
    painted_handler, predictions_handler, preload_handler, preloaded_handler, stats_handler,
    AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `POST /preload` - Warm one route
/// - `POST /preload/batch` - Warm several routes, each reported separately
/// - `GET /preloaded/*route` - Whether a fresh module is cached
/// - `POST /navigation` - Record a transition and prefetch what follows
/// - `GET /predictions/*route` - Likely next routes
/// - `PUT /network` - Update the network class
/// - `POST /lifecycle/painted`, `POST /lifecycle/idle` - Host notifications
/// - `GET /stats` - Engine statistics
/// - `GET /health` - Health check endpoint
///
/// The bare `/preloaded` and `/predictions` paths address the root route.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/preload", post(preload_handler))
        .route("/preload/batch", post(batch_preload_handler))
        .route("/preloaded", get(preloaded_handler))
        .route("/preloaded/*route", get(preloaded_handler))
        .route("/navigation", post(navigation_handler))
        .route("/predictions", get(predictions_handler))
        .route("/predictions/*route", get(predictions_handler))
        .route("/network", put(network_handler))
        .route("/lifecycle/painted", post(painted_handler))
        .route("/lifecycle/idle", post(idle_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
