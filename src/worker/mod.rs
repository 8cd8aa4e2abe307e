//! Download worker pool
//!
//! A single dispatch loop pulls task ids from the [`PendingQueue`], takes one
//! of `concurrency` semaphore slots and spawns the task body into that slot.
//! Bodies drive the task through `downloading` to a terminal status via the
//! [`TaskRegistry`].
//!
//! [`PendingQueue`]: crate::tasks::PendingQueue
//! [`TaskRegistry`]: crate::tasks::TaskRegistry

mod pool;
mod runner;

pub use pool::WorkerPool;
pub use runner::run_task;
