//! API models for task submission and status endpoints.
//!
//! - `POST /tasks` accepts a [`SubmitTaskRequest`] and returns the stored task
//! - `GET /tasks` and `GET /tasks/{id}` return [`Task`](crate::tasks::Task) JSON
//!
//! ```json
//! { "url": "https://www.youtube.com/watch?v=...", "type": "audio" }
//! ```
//!
//! Finished tasks are evicted, so a status query for them answers 404; the
//! outcome logs are the durable record.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::observability::MetricsSnapshot;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SubmitTaskRequest {
    #[serde(default)]
    pub url: Option<String>,
    /// Any value other than `"audio"` (including non-strings) means video
    #[serde(default, rename = "type")]
    pub kind: Option<serde_json::Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub components: HashMap<String, String>,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct OperatorStats {
    pub concurrency: usize,
    pub active_downloads: usize,
    pub queued: usize,
    pub live_tasks: usize,
    #[serde(flatten)]
    pub counters: MetricsSnapshot,
}
