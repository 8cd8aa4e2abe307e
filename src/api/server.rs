use axum::{Router, routing::get};
use tower_http::decompression::RequestDecompressionLayer;

use super::{
    services::{get_task, health, index, list_tasks, metrics, submit_task},
    state::AppState,
};

/// Build the HTTP router for the task API
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/tasks", get(list_tasks).post(submit_task))
        .route("/tasks/{task_id}", get(get_task))
        .route("/health", get(health))
        .route("/operators/metrics", get(metrics))
        .with_state(state)
        // Handles Content-Encoding: gzip transparently
        .layer(RequestDecompressionLayer::new())
}
