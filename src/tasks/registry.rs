use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::model::{Task, TaskId, TaskKind, TaskStatus, TaskUpdate};
use super::queue::PendingQueue;
use super::recorder::OutcomeRecorder;
use crate::observability::Metrics;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegisterError {
    #[error("url is required")]
    EmptyUrl,
}

/// Live set of pending and downloading tasks.
///
/// A task is present only while it is `pending` or `downloading`. The
/// update that moves it to a terminal state writes the outcome record and
/// evicts it while still holding the write lock, so readers never see a
/// terminal task.
pub struct TaskRegistry {
    tasks: RwLock<HashMap<TaskId, Task>>,
    queue: Arc<PendingQueue>,
    recorder: OutcomeRecorder,
    metrics: Arc<Metrics>,
}

impl TaskRegistry {
    pub fn new(queue: Arc<PendingQueue>, recorder: OutcomeRecorder, metrics: Arc<Metrics>) -> Self {
        Self {
            tasks: RwLock::new(HashMap::new()),
            queue,
            recorder,
            metrics,
        }
    }

    /// Store a new pending task and enqueue it for dispatch.
    pub async fn register(&self, url: &str, kind: TaskKind) -> Result<Task, RegisterError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(RegisterError::EmptyUrl);
        }

        let task = Task::new(url.to_string(), kind);
        self.tasks.write().await.insert(task.id.clone(), task.clone());
        self.queue.enqueue(task.id.clone()).await;
        self.metrics.task_registered();

        info!(task_id = %task.id, kind = %task.kind, url = %task.url, "Task registered");
        Ok(task)
    }

    pub async fn get(&self, id: &TaskId) -> Option<Task> {
        self.tasks.read().await.get(id).cloned()
    }

    /// Snapshot of all live tasks, in no particular order.
    pub async fn list_active(&self) -> Vec<Task> {
        self.tasks.read().await.values().cloned().collect()
    }

    /// Merge `update` into the stored task.
    ///
    /// Unknown ids are ignored. A terminal update records the outcome and
    /// evicts the task before returning; a failed log write does not stop
    /// the eviction.
    pub async fn update(&self, id: &TaskId, update: TaskUpdate) {
        let mut tasks = self.tasks.write().await;

        let Some(task) = tasks.get_mut(id) else {
            debug!(task_id = %id, "Update for unknown task ignored");
            return;
        };

        task.apply(update);
        if !task.status.is_terminal() {
            debug!(task_id = %id, status = ?task.status, "Task updated");
            return;
        }

        // Write lock stays held across the log append: readers see the task
        // live or gone, never terminal, and never gone before its log line.
        let finished = task.clone();
        self.recorder.record(&finished).await;
        tasks.remove(id);

        match finished.status {
            TaskStatus::Completed => self.metrics.task_completed(),
            _ => self.metrics.task_failed(),
        }
        info!(task_id = %id, status = ?finished.status, "Task finished and evicted");
    }

    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutcomeLogConfig;
    use std::collections::HashSet;
    use tempfile::TempDir;

    fn create_test_registry() -> (TaskRegistry, Arc<PendingQueue>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let metrics = Arc::new(Metrics::new());
        let config = OutcomeLogConfig {
            dir: temp_dir.path().to_path_buf(),
            ..Default::default()
        };
        let queue = Arc::new(PendingQueue::new());
        let recorder = OutcomeRecorder::new(&config, metrics.clone());
        let registry = TaskRegistry::new(queue.clone(), recorder, metrics);
        (registry, queue, temp_dir)
    }

    #[tokio::test]
    async fn test_register_stores_and_enqueues() {
        let (registry, queue, _temp) = create_test_registry();

        let task = registry.register("https://x/video1", TaskKind::Video).await.unwrap();
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(registry.get(&task.id).await, Some(task.clone()));
        assert_eq!(queue.dequeue().await, task.id);
    }

    #[tokio::test]
    async fn test_register_rejects_empty_url() {
        let (registry, queue, temp) = create_test_registry();

        assert_eq!(
            registry.register("", TaskKind::Video).await,
            Err(RegisterError::EmptyUrl)
        );
        assert_eq!(
            registry.register("   ", TaskKind::Audio).await,
            Err(RegisterError::EmptyUrl)
        );

        assert!(registry.is_empty().await);
        assert!(queue.is_empty().await);
        assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_register_trims_url() {
        let (registry, _queue, _temp) = create_test_registry();
        let task = registry.register("  https://x/a \n", TaskKind::Audio).await.unwrap();
        assert_eq!(task.url, "https://x/a");
    }

    #[tokio::test]
    async fn test_ids_are_unique() {
        let (registry, _queue, _temp) = create_test_registry();
        let mut ids = HashSet::new();
        for i in 0..50 {
            let task = registry
                .register(&format!("https://x/{i}"), TaskKind::Video)
                .await
                .unwrap();
            assert!(ids.insert(task.id));
        }
        assert_eq!(registry.list_active().await.len(), 50);
    }

    #[tokio::test]
    async fn test_update_unknown_is_noop() {
        let (registry, _queue, temp) = create_test_registry();
        registry
            .update(&TaskId::from("missing"), TaskUpdate::completed("x"))
            .await;

        assert!(registry.is_empty().await);
        assert!(!temp.path().join("success.log").exists());
    }

    #[tokio::test]
    async fn test_completed_task_is_logged_and_evicted() {
        let (registry, _queue, temp) = create_test_registry();
        let task = registry.register("https://x/video1", TaskKind::Video).await.unwrap();

        registry.update(&task.id, TaskUpdate::downloading()).await;
        assert_eq!(
            registry.get(&task.id).await.map(|t| t.status),
            Some(TaskStatus::Downloading)
        );

        registry.update(&task.id, TaskUpdate::completed("{\"done\":true}")).await;
        assert!(registry.get(&task.id).await.is_none());
        assert!(registry.list_active().await.is_empty());

        let log = std::fs::read_to_string(temp.path().join("success.log")).unwrap();
        assert_eq!(log.lines().count(), 1);
        assert!(log.contains(&format!("id={}", task.id)));
        assert!(log.contains("type=video"));
        assert!(log.contains("url=https://x/video1"));
    }

    #[tokio::test]
    async fn test_failed_task_is_logged_and_evicted() {
        let (registry, _queue, temp) = create_test_registry();
        let task = registry.register("https://x/bad", TaskKind::Audio).await.unwrap();

        registry.update(&task.id, TaskUpdate::downloading()).await;
        registry.update(&task.id, TaskUpdate::failed("exit code 1")).await;

        assert!(registry.get(&task.id).await.is_none());
        let log = std::fs::read_to_string(temp.path().join("failure.log")).unwrap();
        assert!(log.contains("error=exit code 1"));

        // A late update for the evicted task changes nothing
        registry.update(&task.id, TaskUpdate::completed("late")).await;
        assert!(!temp.path().join("success.log").exists());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_readers_never_see_terminal_or_unlogged_eviction() {
        let (registry, _queue, temp) = create_test_registry();
        let registry = Arc::new(registry);
        let task = registry.register("https://x/video1", TaskKind::Video).await.unwrap();
        registry.update(&task.id, TaskUpdate::downloading()).await;

        let reader = {
            let registry = registry.clone();
            let id = task.id.clone();
            let log = temp.path().join("success.log");
            tokio::spawn(async move {
                loop {
                    match registry.get(&id).await {
                        Some(t) => assert!(!t.status.is_terminal()),
                        None => {
                            let written = std::fs::read_to_string(&log).unwrap_or_default();
                            assert!(written.contains(&format!("id={id}")));
                            return;
                        }
                    }
                    tokio::task::yield_now().await;
                }
            })
        };

        registry.update(&task.id, TaskUpdate::completed("{\"done\":true}")).await;
        reader.await.unwrap();
    }

    #[tokio::test]
    async fn test_eviction_survives_log_failure() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();

        let metrics = Arc::new(Metrics::new());
        let config = OutcomeLogConfig {
            dir: blocker,
            ..Default::default()
        };
        let queue = Arc::new(PendingQueue::new());
        let registry = TaskRegistry::new(
            queue,
            OutcomeRecorder::new(&config, metrics.clone()),
            metrics.clone(),
        );

        let task = registry.register("https://x/1", TaskKind::Video).await.unwrap();
        registry.update(&task.id, TaskUpdate::downloading()).await;
        registry.update(&task.id, TaskUpdate::failed("boom")).await;

        assert!(registry.get(&task.id).await.is_none());
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.outcome_write_failures, 1);
        assert_eq!(snapshot.tasks_failed, 1);
    }
}
