//! Task registry, pending queue and outcome recording.
//!
//! - [`TaskRegistry`] - live pending/downloading tasks, evicts on terminal update
//! - [`PendingQueue`] - FIFO of ids awaiting a worker slot
//! - [`OutcomeRecorder`] - one audit line per finished task

pub mod model;
pub mod queue;
pub mod recorder;
pub mod registry;

pub use model::{Task, TaskId, TaskKind, TaskStatus, TaskUpdate};
pub use queue::PendingQueue;
pub use recorder::{Outcome, OutcomeRecorder};
pub use registry::{RegisterError, TaskRegistry};
