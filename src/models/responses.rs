//! Response DTOs for the preload bridge API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::engine::PreloadOutcome;
use crate::network::NetworkClass;
use crate::patterns::Prediction;

/// Response body for POST /preload and GET /preloaded
#[derive(Debug, Clone, Serialize)]
pub struct PreloadResponse {
    /// Normalized route key
    pub route: String,
    /// Whether a fresh module is cached
    pub preloaded: bool,
}

impl PreloadResponse {
    pub fn new(route: impl Into<String>, preloaded: bool) -> Self {
        Self {
            route: route.into(),
            preloaded,
        }
    }
}

/// Per-route entry of a batch response
#[derive(Debug, Clone, Serialize)]
pub struct RouteResult {
    pub route: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Response body for POST /preload/batch
#[derive(Debug, Clone, Serialize)]
pub struct BatchPreloadResponse {
    pub results: Vec<RouteResult>,
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchPreloadResponse {
    pub fn from_outcomes(outcomes: Vec<PreloadOutcome>) -> Self {
        let results: Vec<RouteResult> = outcomes
            .into_iter()
            .map(|outcome| RouteResult {
                ok: outcome.is_success(),
                error: outcome.result.err().map(|e| e.to_string()),
                route: outcome.route,
            })
            .collect();
        let succeeded = results.iter().filter(|r| r.ok).count();

        Self {
            failed: results.len() - succeeded,
            succeeded,
            results,
        }
    }
}

/// Response body for POST /navigation
#[derive(Debug, Clone, Serialize)]
pub struct NavigationResponse {
    pub from: String,
    pub to: String,
    /// Routes likely to follow `to`, being warmed in the background
    pub predictions: Vec<Prediction>,
}

/// Response body for GET /predictions
#[derive(Debug, Clone, Serialize)]
pub struct PredictionsResponse {
    pub route: String,
    pub predictions: Vec<Prediction>,
}

/// Response body for PUT /network
#[derive(Debug, Clone, Serialize)]
pub struct NetworkResponse {
    pub network: NetworkClass,
}

/// Response body for the lifecycle endpoints
#[derive(Debug, Clone, Serialize)]
pub struct LifecycleResponse {
    pub painted: bool,
    pub idle: bool,
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
