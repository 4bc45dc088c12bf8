mod contact;
mod health;
mod metrics;
mod visit;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::state::AppState;

pub use contact::contact_handler;
pub use health::health_handler;
pub use metrics::metrics_handler;
pub use visit::track_visit_handler;

// creating the router with routes
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/contact", post(contact_handler))
        .route("/api/track-visit", post(track_visit_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}
