//! Error types for the preload engine
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Preload Error Enum ==
/// Unified error type for the preload engine.
///
/// `Clone` because a single in-flight load outcome is handed to every
/// caller waiting on it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreloadError {
    /// The module loader rejected a route
    #[error("Failed to load route '{route}': {reason}")]
    LoadFailure { route: String, reason: String },

    /// Pattern store read or write failed
    #[error("Pattern store failure: {0}")]
    Persistence(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The warm-up scheduler runs once per engine
    #[error("Warm-up has already been started for this engine")]
    WarmupAlreadyStarted,
}

impl PreloadError {
    /// Builds a `LoadFailure` from a loader error, keeping the whole cause chain.
    pub fn load_failure(route: impl Into<String>, err: &anyhow::Error) -> Self {
        PreloadError::LoadFailure {
            route: route.into(),
            reason: format!("{:#}", err),
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for PreloadError {
    fn into_response(self) -> Response {
        let status = match &self {
            PreloadError::LoadFailure { .. } => StatusCode::BAD_GATEWAY,
            PreloadError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
            PreloadError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            PreloadError::WarmupAlreadyStarted => StatusCode::CONFLICT,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the preload engine.
pub type Result<T> = std::result::Result<T, PreloadError>;
