//! HTTP routes

pub mod availability;
pub mod groups;
pub mod health;

use std::sync::Arc;

use axum::Router;

use crate::context::AppContext;

/// Everything mounted under `/api`.
pub fn router() -> Router<Arc<AppContext>> {
    Router::new()
        .merge(availability::router())
        .merge(groups::router())
        .merge(health::router())
}
