//! Append-only audit log of terminal task outcomes.
//!
//! Each completed or failed task produces exactly one line in either the
//! success or the failure log:
//!
//! ```text
//! 2026-10-18T09:12:44.123Z [SUCCESS] id=<id> type=video url=<url> result={"done":true}
//! 2026-10-18T09:13:02.871Z [FAILURE] id=<id> type=audio url=<url> error=exit code 1
//! ```
//!
//! Writing is best-effort: errors are logged and counted, never returned to
//! the registry.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use super::model::{Task, TaskStatus};
use crate::config::OutcomeLogConfig;
use crate::observability::Metrics;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("task {0} is not in a terminal state")]
    NotTerminal(String),

    #[error("failed to format timestamp: {0}")]
    Timestamp(#[from] time::error::Format),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Which log a record goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

impl Outcome {
    pub fn tag(&self) -> &'static str {
        match self {
            Outcome::Success => "SUCCESS",
            Outcome::Failure => "FAILURE",
        }
    }

    fn for_status(status: TaskStatus) -> Option<Self> {
        match status {
            TaskStatus::Completed => Some(Outcome::Success),
            TaskStatus::Failed => Some(Outcome::Failure),
            TaskStatus::Pending | TaskStatus::Downloading => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OutcomeRecorder {
    dir: PathBuf,
    success_file: String,
    failure_file: String,
    metrics: Arc<Metrics>,
}

impl OutcomeRecorder {
    pub fn new(config: &OutcomeLogConfig, metrics: Arc<Metrics>) -> Self {
        Self {
            dir: config.dir.clone(),
            success_file: config.success_file.clone(),
            failure_file: config.failure_file.clone(),
            metrics,
        }
    }

    pub fn log_path(&self, outcome: Outcome) -> PathBuf {
        match outcome {
            Outcome::Success => self.dir.join(&self.success_file),
            Outcome::Failure => self.dir.join(&self.failure_file),
        }
    }

    /// Record a terminal task, swallowing any write failure.
    pub async fn record(&self, task: &Task) {
        if let Err(e) = self.try_record(task).await {
            self.metrics.outcome_write_failed();
            warn!(task_id = %task.id, error = %e, "Failed to write outcome log");
        }
    }

    async fn try_record(&self, task: &Task) -> Result<(), RecordError> {
        let outcome = Outcome::for_status(task.status)
            .ok_or_else(|| RecordError::NotTerminal(task.id.to_string()))?;

        let timestamp = OffsetDateTime::now_utc().format(&Rfc3339)?;
        let line = format_line(&timestamp, outcome, task);
        let path = self.log_path(outcome);

        append_line(&self.dir, &path, &line).await?;
        debug!(task_id = %task.id, path = %path.display(), "Outcome recorded");
        Ok(())
    }
}

/// Render one audit record. Line breaks inside the payload are flattened so
/// the record always occupies a single line.
pub fn format_line(timestamp: &str, outcome: Outcome, task: &Task) -> String {
    let detail = match outcome {
        Outcome::Success => format!("result={}", single_line(task.result.as_deref())),
        Outcome::Failure => format!("error={}", single_line(task.error.as_deref())),
    };

    format!(
        "{} [{}] id={} type={} url={} {}",
        timestamp,
        outcome.tag(),
        task.id,
        task.kind,
        task.url,
        detail
    )
}

fn single_line(value: Option<&str>) -> String {
    value.unwrap_or_default().replace("\r\n", " ").replace('\n', " ")
}

async fn append_line(dir: &Path, path: &Path, line: &str) -> Result<(), RecordError> {
    tokio::fs::create_dir_all(dir).await?;

    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;

    file.write_all(format!("{line}\n").as_bytes()).await?;
    file.flush().await?;
    Ok(())
}
