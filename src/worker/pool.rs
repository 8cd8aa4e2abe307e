use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info};

use super::runner::run_task;
use crate::config::WorkerConfig;
use crate::downloader::Downloader;
use crate::tasks::{PendingQueue, TaskRegistry};

/// Concurrency-limited executor for queued download tasks.
///
/// `start` spawns the dispatch loop (no-op if already running). `shutdown`
/// stops dequeuing and waits for every in-flight body to finish; nothing is
/// cancelled mid-download.
pub struct WorkerPool {
    registry: Arc<TaskRegistry>,
    queue: Arc<PendingQueue>,
    downloader: Arc<dyn Downloader>,
    concurrency: usize,
    error_backoff: Duration,
    running: Mutex<Option<RunningPool>>,
}

struct RunningPool {
    shutdown: CancellationToken,
    tracker: TaskTracker,
    slots: Arc<Semaphore>,
    dispatch: JoinHandle<()>,
}

/// Everything the dispatch loop needs, moved into its task.
struct Dispatcher {
    registry: Arc<TaskRegistry>,
    queue: Arc<PendingQueue>,
    downloader: Arc<dyn Downloader>,
    slots: Arc<Semaphore>,
    tracker: TaskTracker,
    shutdown: CancellationToken,
    error_backoff: Duration,
}

impl WorkerPool {
    pub fn new(
        registry: Arc<TaskRegistry>,
        queue: Arc<PendingQueue>,
        downloader: Arc<dyn Downloader>,
        config: &WorkerConfig,
    ) -> Self {
        Self {
            registry,
            queue,
            downloader,
            concurrency: config.concurrency.max(1),
            error_backoff: Duration::from_millis(config.loop_error_backoff_ms),
            running: Mutex::new(None),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Spawn the dispatch loop. Returns `false` if the pool was already running.
    pub async fn start(&self) -> bool {
        let mut running = self.running.lock().await;
        if running.is_some() {
            debug!("Worker pool already running");
            return false;
        }

        let shutdown = CancellationToken::new();
        let tracker = TaskTracker::new();
        let slots = Arc::new(Semaphore::new(self.concurrency));

        let dispatcher = Dispatcher {
            registry: self.registry.clone(),
            queue: self.queue.clone(),
            downloader: self.downloader.clone(),
            slots: slots.clone(),
            tracker: tracker.clone(),
            shutdown: shutdown.clone(),
            error_backoff: self.error_backoff,
        };
        let dispatch = tokio::spawn(dispatcher.run());

        info!(concurrency = self.concurrency, "Worker pool started");
        *running = Some(RunningPool {
            shutdown,
            tracker,
            slots,
            dispatch,
        });
        true
    }

    pub async fn is_running(&self) -> bool {
        self.running.lock().await.is_some()
    }

    /// Number of slots currently executing a task body.
    pub async fn active_slots(&self) -> usize {
        match self.running.lock().await.as_ref() {
            Some(pool) => self.concurrency - pool.slots.available_permits(),
            None => 0,
        }
    }

    /// Stop dequeuing and wait until all in-flight bodies have finished.
    pub async fn shutdown(&self) {
        let Some(pool) = self.running.lock().await.take() else {
            debug!("Worker pool not running, nothing to stop");
            return;
        };

        info!("Stopping worker pool, draining in-flight downloads");
        pool.shutdown.cancel();
        if let Err(e) = pool.dispatch.await {
            error!(error = %e, "Dispatch loop terminated abnormally");
        }

        pool.tracker.close();
        pool.tracker.wait().await;
        info!("Worker pool stopped");
    }
}

impl Dispatcher {
    async fn run(self) {
        debug!("Dispatch loop running");

        loop {
            let id = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break,
                id = self.queue.dequeue() => id,
            };

            let permit = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => {
                    // Claimed but never started: keep it pending
                    self.queue.requeue_front(id).await;
                    break;
                }
                permit = self.slots.clone().acquire_owned() => permit,
            };

            match permit {
                Ok(permit) => {
                    debug!(task_id = %id, "Dispatching task");
                    let registry = self.registry.clone();
                    let downloader = self.downloader.clone();
                    self.tracker.spawn(async move {
                        let _permit = permit;
                        run_task(registry, downloader, id).await;
                    });
                }
                // Only reachable once the slot semaphore has been closed
                Err(e) => {
                    error!(task_id = %id, error = %e, "Failed to acquire worker slot");
                    self.queue.requeue_front(id).await;
                    tokio::select! {
                        _ = self.shutdown.cancelled() => break,
                        _ = tokio::time::sleep(self.error_backoff) => {}
                    }
                }
            }
        }

        debug!("Dispatch loop exited");
    }
}
