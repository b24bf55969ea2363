//! API Module
//!
//! HTTP handlers and routing for the preload bridge, the surface a
//! rendering host drives the engine through.

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
