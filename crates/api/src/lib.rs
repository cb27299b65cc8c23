//! # Slotwise API
//!
//! HTTP service layer - routes and the binary entry point.
//!
//! This crate contains:
//! - axum routes (JSON boundary → core bridge)
//! - Application context (dependency injection)
//! - Main entry point and setup
//!
//! ## Architecture
//! - Depends on `domain`, `core`, and `infra`
//! - Wires up the hexagonal architecture
//! - Serves the JSON API that polling clients consume

pub mod context;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;

pub use context::AppContext;
pub use error::ApiError;

/// Assemble the service router with every route mounted under `/api`.
pub fn app(ctx: Arc<AppContext>) -> Router {
    Router::new().nest("/api", routes::router()).with_state(ctx)
}
