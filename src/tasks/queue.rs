use std::collections::{HashSet, VecDeque};
use tokio::sync::{Mutex, Notify};
use tracing::debug;

use super::model::TaskId;

#[derive(Debug, Default)]
struct QueueState {
    order: VecDeque<TaskId>,
    members: HashSet<TaskId>,
}

impl QueueState {
    fn pop(&mut self) -> Option<TaskId> {
        let id = self.order.pop_front()?;
        self.members.remove(&id);
        Some(id)
    }
}

/// FIFO of task ids awaiting dispatch.
///
/// Enqueue is idempotent while an id is queued. `dequeue` suspends on an
/// empty queue; every accepted enqueue issues exactly one `notify_one`, and
/// `Notify` keeps a permit when nobody is waiting yet, so a wakeup is never
/// lost between the emptiness check and the await.
#[derive(Debug, Default)]
pub struct PendingQueue {
    state: Mutex<QueueState>,
    available: Notify,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `id` unless it is already queued. Returns whether it was added.
    pub async fn enqueue(&self, id: TaskId) -> bool {
        {
            let mut state = self.state.lock().await;
            if !state.members.insert(id.clone()) {
                debug!(task_id = %id, "Task already queued, skipping");
                return false;
            }
            state.order.push_back(id);
        }
        self.available.notify_one();
        true
    }

    /// Remove and return the oldest queued id, waiting for one if empty.
    pub async fn dequeue(&self) -> TaskId {
        loop {
            // Register as a waiter before checking, so an enqueue racing the
            // check always reaches some consumer.
            let notified = self.available.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(id) = self.state.lock().await.pop() {
                return id;
            }
            notified.await;
        }
    }

    /// Non-blocking variant of [`dequeue`](Self::dequeue).
    pub async fn try_dequeue(&self) -> Option<TaskId> {
        self.state.lock().await.pop()
    }

    /// Put a claimed id back at the head of the queue.
    ///
    /// Used when the dispatch loop is stopped after dequeuing an id but
    /// before a slot was available for it.
    pub async fn requeue_front(&self, id: TaskId) -> bool {
        {
            let mut state = self.state.lock().await;
            if !state.members.insert(id.clone()) {
                return false;
            }
            state.order.push_front(id);
        }
        self.available.notify_one();
        true
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.order.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_fifo_order() {
        let queue = PendingQueue::new();
        for id in ["a", "b", "c"] {
            assert!(queue.enqueue(TaskId::from(id)).await);
        }

        assert_eq!(queue.dequeue().await.as_str(), "a");
        assert_eq!(queue.dequeue().await.as_str(), "b");
        assert_eq!(queue.dequeue().await.as_str(), "c");
        assert!(queue.is_empty().await);
    }

    #[tokio::test]
    async fn test_duplicate_enqueue_is_ignored() {
        let queue = PendingQueue::new();
        assert!(queue.enqueue(TaskId::from("a")).await);
        assert!(!queue.enqueue(TaskId::from("a")).await);
        assert_eq!(queue.len().await, 1);

        // Once dequeued, the id may be queued again
        queue.dequeue().await;
        assert!(queue.enqueue(TaskId::from("a")).await);
        assert_eq!(queue.len().await, 1);
    }

    #[tokio::test]
    async fn test_dequeue_waits_for_enqueue() {
        let queue = Arc::new(PendingQueue::new());

        let waiter = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.dequeue().await })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());

        queue.enqueue(TaskId::from("late")).await;
        let id = timeout(Duration::from_secs(1), waiter)
            .await
            .expect("dequeue should wake up")
            .unwrap();
        assert_eq!(id.as_str(), "late");
    }

    #[tokio::test]
    async fn test_empty_dequeue_blocks() {
        let queue = PendingQueue::new();
        let result = timeout(Duration::from_millis(50), queue.dequeue()).await;
        assert!(result.is_err());
        assert!(queue.try_dequeue().await.is_none());
    }

    #[tokio::test]
    async fn test_each_enqueue_wakes_one_consumer() {
        let queue = Arc::new(PendingQueue::new());
        let mut consumers = Vec::new();
        for _ in 0..3 {
            let queue = queue.clone();
            consumers.push(tokio::spawn(async move { queue.dequeue().await }));
        }
        tokio::time::sleep(Duration::from_millis(20)).await;

        for id in ["x", "y", "z"] {
            queue.enqueue(TaskId::from(id)).await;
        }

        let mut got = Vec::new();
        for consumer in consumers {
            let id = timeout(Duration::from_secs(1), consumer).await.unwrap().unwrap();
            got.push(id.as_str().to_string());
        }
        got.sort();
        assert_eq!(got, vec!["x", "y", "z"]);
        assert!(queue.is_empty().await);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_competing_consumers_drain_everything() {
        const ROUNDS: usize = 2000;
        let queue = Arc::new(PendingQueue::new());

        let consumers: Vec<_> = (0..2)
            .map(|_| {
                let queue = queue.clone();
                tokio::spawn(async move {
                    let mut taken = 0;
                    while !queue.dequeue().await.as_str().starts_with("stop") {
                        taken += 1;
                    }
                    taken
                })
            })
            .collect();

        for i in 0..ROUNDS {
            queue.enqueue(TaskId::from(format!("t{i}"))).await;
            if i % 7 == 0 {
                tokio::task::yield_now().await;
            }
        }
        // Queued after every item, one per consumer
        queue.enqueue(TaskId::from("stop-0")).await;
        queue.enqueue(TaskId::from("stop-1")).await;

        let mut total = 0;
        for consumer in consumers {
            total += timeout(Duration::from_secs(5), consumer)
                .await
                .expect("a consumer missed a wakeup")
                .unwrap();
        }
        assert_eq!(total, ROUNDS);
        assert!(queue.is_empty().await);
    }

    #[tokio::test]
    async fn test_requeue_front() {
        let queue = PendingQueue::new();
        queue.enqueue(TaskId::from("b")).await;
        assert!(queue.requeue_front(TaskId::from("a")).await);
        assert!(!queue.requeue_front(TaskId::from("b")).await);

        assert_eq!(queue.dequeue().await.as_str(), "a");
        assert_eq!(queue.dequeue().await.as_str(), "b");
    }
}
