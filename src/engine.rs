//! Per-process context owning the task registry, queue and worker pool.
//!
//! The HTTP layer only talks to an [`Engine`]; tests build as many isolated
//! engines as they need.

use std::sync::Arc;

use crate::config::Config;
use crate::downloader::Downloader;
use crate::observability::{Metrics, MetricsSnapshot};
use crate::tasks::{
    OutcomeRecorder, PendingQueue, RegisterError, Task, TaskId, TaskKind, TaskRegistry,
};
use crate::worker::WorkerPool;

pub struct Engine {
    registry: Arc<TaskRegistry>,
    queue: Arc<PendingQueue>,
    pool: WorkerPool,
    metrics: Arc<Metrics>,
}

impl Engine {
    pub fn new(config: &Config, downloader: Arc<dyn Downloader>) -> Self {
        let metrics = Arc::new(Metrics::new());
        let queue = Arc::new(PendingQueue::new());
        let recorder = OutcomeRecorder::new(&config.outcomes, metrics.clone());
        let registry = Arc::new(TaskRegistry::new(queue.clone(), recorder, metrics.clone()));
        let pool = WorkerPool::new(registry.clone(), queue.clone(), downloader, &config.worker);

        Self {
            registry,
            queue,
            pool,
            metrics,
        }
    }

    pub async fn register_task(&self, url: &str, kind: TaskKind) -> Result<Task, RegisterError> {
        self.registry.register(url, kind).await
    }

    pub async fn get_task(&self, id: &TaskId) -> Option<Task> {
        self.registry.get(id).await
    }

    pub async fn get_all_tasks(&self) -> Vec<Task> {
        self.registry.list_active().await
    }

    pub async fn start(&self) -> bool {
        self.pool.start().await
    }

    /// Stop dispatching and wait for in-flight downloads to finish.
    pub async fn shutdown(&self) {
        self.pool.shutdown().await
    }

    pub async fn is_running(&self) -> bool {
        self.pool.is_running().await
    }

    pub async fn queue_len(&self) -> usize {
        self.queue.len().await
    }

    pub async fn active_downloads(&self) -> usize {
        self.pool.active_slots().await
    }

    pub fn concurrency(&self) -> usize {
        self.pool.concurrency()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}
