//! HTTP surface.
pub mod auth;
pub mod webhook;

use crate::state::AppState;
use axum::Router;
use axum::routing::{get, post};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .route("/api/live-announcement", post(webhook::live_announcement))
        .route("/auth/x", get(auth::x_callback))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
