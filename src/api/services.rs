use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use std::collections::HashMap;
use tracing::debug;

use super::{
    models::{HealthResponse, OperatorStats},
    state::AppState,
    utils,
};
use crate::api::error::ApiError;
use crate::tasks::TaskId;

/// Task submission endpoint (POST /tasks)
///
/// ## Flow:
/// 1. Validate Content-Type (application/json)
/// 2. Read body, enforcing `server.max_body_bytes`
/// 3. Decode `{url, type}`; `type` defaults to video
/// 4. Register the task (rejects an empty url before anything is queued)
/// 5. Return the stored pending task
pub async fn submit_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: axum::body::Body,
) -> Result<impl IntoResponse, ApiError> {
    utils::require_json(&headers)?;

    let bytes = utils::read_body(body, state.config.server.max_body_bytes).await?;
    let (url, kind) = utils::parse_submission(&bytes)?;

    let task = state.engine.register_task(&url, kind).await?;
    debug!(task_id = %task.id, "Submission accepted");

    Ok((StatusCode::OK, Json(task)))
}

/// Active task listing (GET /tasks)
pub async fn list_tasks(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.engine.get_all_tasks().await)
}

/// Task status endpoint (GET /tasks/{task_id})
///
/// Finished tasks have been evicted and answer 404 like unknown ids.
pub async fn get_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let task = state
        .engine
        .get_task(&TaskId::from(task_id.as_str()))
        .await
        .ok_or_else(|| ApiError::NotFound(format!("task {task_id}")))?;

    Ok((StatusCode::OK, Json(task)))
}

pub async fn index() -> impl IntoResponse {
    (StatusCode::OK, "clipbox: yt-dlp download queue")
}

/// Health check endpoint (GET /health)
///
/// Returns 503 Service Unavailable when the worker pool is not running.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let mut components = HashMap::new();
    components.insert("api".to_string(), "healthy".to_string());

    let pool_running = state.engine.is_running().await;
    components.insert(
        "worker_pool".to_string(),
        if pool_running { "healthy" } else { "stopped" }.to_string(),
    );

    let all_healthy = components.values().all(|status| status == "healthy");
    let status_code = if all_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = HealthResponse {
        status: if all_healthy { "healthy" } else { "unhealthy" }.to_string(),
        components,
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    (status_code, Json(response))
}

/// Queue and counter snapshot (GET /operators/metrics)
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let engine = &state.engine;
    let stats = OperatorStats {
        concurrency: engine.concurrency(),
        active_downloads: engine.active_downloads().await,
        queued: engine.queue_len().await,
        live_tasks: engine.get_all_tasks().await.len(),
        counters: engine.metrics(),
    };

    Json(stats)
}
