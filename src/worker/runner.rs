//! Task body - runs one claimed task to a terminal status

use std::sync::Arc;
use tracing::{error, info, warn};

use crate::downloader::Downloader;
use crate::tasks::{TaskId, TaskRegistry, TaskUpdate};

/// Execute one task: mark it downloading, invoke the downloader for its
/// kind and record the outcome.
///
/// Never returns an error; every failure ends as a `failed` task. The
/// downloader call runs in its own tokio task so a panic inside it is
/// contained and reported like any other failure.
pub async fn run_task(registry: Arc<TaskRegistry>, downloader: Arc<dyn Downloader>, id: TaskId) {
    let Some(task) = registry.get(&id).await else {
        warn!(task_id = %id, "Dequeued task no longer exists, skipping");
        return;
    };

    registry.update(&id, TaskUpdate::downloading()).await;
    info!(task_id = %id, kind = %task.kind, url = %task.url, "Download started");

    let call = {
        let downloader = downloader.clone();
        let url = task.url.clone();
        let kind = task.kind;
        tokio::spawn(async move { downloader.download(kind, &url).await })
    };

    let update = match call.await {
        Ok(Ok(output)) => match serde_json::to_string(&output) {
            Ok(result) => TaskUpdate::completed(result),
            Err(e) => TaskUpdate::failed(format!("failed to serialize result: {e}")),
        },
        Ok(Err(e)) => {
            warn!(task_id = %id, url = %task.url, error = %e, "Download failed");
            TaskUpdate::failed(e.to_string())
        }
        Err(join_error) => {
            error!(task_id = %id, error = %join_error, "Downloader panicked");
            TaskUpdate::failed("downloader panicked")
        }
    };

    registry.update(&id, update).await;
}
