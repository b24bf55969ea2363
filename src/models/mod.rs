//! Request and Response models for the preload bridge API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{BatchPreloadRequest, NavigationRequest, NetworkUpdateRequest, PreloadRequest};
pub use responses::{
    BatchPreloadResponse, HealthResponse, LifecycleResponse, NavigationResponse, NetworkResponse,
    PredictionsResponse, PreloadResponse, RouteResult,
};
