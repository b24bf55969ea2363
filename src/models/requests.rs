//! Request DTOs for the preload bridge API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

use crate::network::{classify_connection, NetworkClass};

/// Request body for POST /preload
#[derive(Debug, Clone, Deserialize)]
pub struct PreloadRequest {
    /// Route to warm
    pub route: String,
    /// Reload even when a fresh module is cached
    #[serde(default)]
    pub force: bool,
}

impl PreloadRequest {
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.route.trim().is_empty() {
            return Some("Route cannot be empty".to_string());
        }
        None
    }
}

/// Request body for POST /preload/batch
#[derive(Debug, Clone, Deserialize)]
pub struct BatchPreloadRequest {
    pub routes: Vec<String>,
}

impl BatchPreloadRequest {
    pub fn validate(&self) -> Option<String> {
        if self.routes.is_empty() {
            return Some("Routes cannot be empty".to_string());
        }
        if self.routes.iter().any(|r| r.trim().is_empty()) {
            return Some("Route cannot be empty".to_string());
        }
        None
    }
}

/// Request body for POST /navigation
#[derive(Debug, Clone, Deserialize)]
pub struct NavigationRequest {
    /// Route the user left
    pub from: String,
    /// Route the user arrived at
    pub to: String,
}

impl NavigationRequest {
    pub fn validate(&self) -> Option<String> {
        if self.from.trim().is_empty() || self.to.trim().is_empty() {
            return Some("Both 'from' and 'to' are required".to_string());
        }
        None
    }
}

/// Request body for PUT /network
///
/// Either an explicit class or a raw connection reading.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NetworkUpdateRequest {
    #[serde(default)]
    pub class: Option<NetworkClass>,
    #[serde(default)]
    pub effective_type: Option<String>,
    #[serde(default)]
    pub save_data: bool,
}

impl NetworkUpdateRequest {
    /// Resolves the reading to a class. An explicit class wins.
    pub fn resolve(&self) -> NetworkClass {
        self.class.unwrap_or_else(|| {
            classify_connection(self.effective_type.as_deref(), self.save_data)
        })
    }
}
