//! API Handlers
//!
//! HTTP request handlers for each preload bridge endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use crate::cache::RouteKey;
use crate::engine::{normalize_route, EngineStats, PreloadEngine};
use crate::error::{PreloadError, Result};
use crate::models::{
    BatchPreloadRequest, BatchPreloadResponse, HealthResponse, LifecycleResponse,
    NavigationRequest, NavigationResponse, NetworkResponse, NetworkUpdateRequest,
    PredictionsResponse, PreloadRequest, PreloadResponse,
};
use crate::network::SharedNetworkSignal;
use crate::tasks::HostLifecycle;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Shared preload engine
    pub engine: PreloadEngine,
    /// Network reading the engine consults, updated by the host
    pub network: Arc<SharedNetworkSignal>,
    /// Paint and idle notifications the warm-up waits on
    pub lifecycle: Arc<HostLifecycle>,
}

impl AppState {
    pub fn new(
        engine: PreloadEngine,
        network: Arc<SharedNetworkSignal>,
        lifecycle: Arc<HostLifecycle>,
    ) -> Self {
        Self {
            engine,
            network,
            lifecycle,
        }
    }
}

/// Handler for POST /preload
///
/// Warms one route and answers once its module is cached.
pub async fn preload_handler(
    State(state): State<AppState>,
    Json(req): Json<PreloadRequest>,
) -> Result<Json<PreloadResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(PreloadError::InvalidRequest(error_msg));
    }

    let route = normalize_route(&req.route);
    state.engine.preload_route(&route, req.force).await?;

    Ok(Json(PreloadResponse::new(route, true)))
}

/// Handler for POST /preload/batch
///
/// One failing route does not fail the batch; each gets its own result.
pub async fn batch_preload_handler(
    State(state): State<AppState>,
    Json(req): Json<BatchPreloadRequest>,
) -> Result<Json<BatchPreloadResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(PreloadError::InvalidRequest(error_msg));
    }

    let routes: Vec<RouteKey> = req.routes.iter().map(|r| normalize_route(r)).collect();
    let outcomes = state.engine.preload_routes(&routes).await;

    Ok(Json(BatchPreloadResponse::from_outcomes(outcomes)))
}

/// Handler for GET /preloaded/*route
pub async fn preloaded_handler(
    State(state): State<AppState>,
    route: Option<Path<String>>,
) -> Json<PreloadResponse> {
    let route = route_from_path(route);
    let preloaded = state.engine.is_preloaded(&route);

    Json(PreloadResponse::new(route, preloaded))
}

/// Handler for POST /navigation
///
/// Records the transition and starts warming the routes likely to follow
/// `to`. Neither waits on disk or on the loader.
pub async fn navigation_handler(
    State(state): State<AppState>,
    Json(req): Json<NavigationRequest>,
) -> Result<(StatusCode, Json<NavigationResponse>)> {
    if let Some(error_msg) = req.validate() {
        return Err(PreloadError::InvalidRequest(error_msg));
    }

    let from = normalize_route(&req.from);
    let to = normalize_route(&req.to);

    state.engine.record_navigation(&from, &to);
    let speculative = state.engine.preload_likely_next_routes(&to);

    Ok((
        StatusCode::ACCEPTED,
        Json(NavigationResponse {
            from,
            to,
            predictions: speculative.predictions,
        }),
    ))
}

/// Handler for GET /predictions/*route
pub async fn predictions_handler(
    State(state): State<AppState>,
    route: Option<Path<String>>,
) -> Json<PredictionsResponse> {
    let route = route_from_path(route);
    let predictions = state.engine.predict(&route);

    Json(PredictionsResponse { route, predictions })
}

/// Handler for PUT /network
pub async fn network_handler(
    State(state): State<AppState>,
    Json(req): Json<NetworkUpdateRequest>,
) -> Json<NetworkResponse> {
    let network = req.resolve();
    state.network.set(network);
    info!(%network, "Network class updated");

    Json(NetworkResponse { network })
}

/// Handler for POST /lifecycle/painted
pub async fn painted_handler(State(state): State<AppState>) -> Json<LifecycleResponse> {
    state.lifecycle.mark_painted();
    Json(lifecycle_response(&state))
}

/// Handler for POST /lifecycle/idle
pub async fn idle_handler(State(state): State<AppState>) -> Json<LifecycleResponse> {
    state.lifecycle.mark_idle();
    Json(lifecycle_response(&state))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<EngineStats> {
    Json(state.engine.get_cache_stats())
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

// No wildcard segment means the root route
fn route_from_path(path: Option<Path<String>>) -> RouteKey {
    match path {
        Some(Path(raw)) => normalize_route(&raw),
        None => normalize_route("/"),
    }
}

fn lifecycle_response(state: &AppState) -> LifecycleResponse {
    LifecycleResponse {
        painted: state.lifecycle.is_painted(),
        idle: state.lifecycle.is_idle(),
    }
}
