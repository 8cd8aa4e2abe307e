//! Task data model: identifiers, kinds, lifecycle states and partial updates.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a download task.
///
/// Generated as a UUIDv7 so ids are time-ordered and never reused within
/// (or across) process lifetimes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh time-sortable id.
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// What the downloader should fetch for a url.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    #[default]
    Video,
    Audio,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Video => "video",
            TaskKind::Audio => "audio",
        }
    }

    /// Lenient parse used by the HTTP layer: anything that is not `audio`
    /// is treated as a video request.
    pub fn from_lenient(value: Option<&str>) -> Self {
        match value {
            Some("audio") => TaskKind::Audio,
            _ => TaskKind::Video,
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a task.
///
/// `Pending -> Downloading -> {Completed | Failed}`. Terminal states are
/// never observable through the registry because the task is evicted as
/// part of the same update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Pending,
    Downloading,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// One download request and its current state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub url: String,
    #[serde(rename = "type")]
    pub kind: TaskKind,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Task {
    pub(crate) fn new(url: String, kind: TaskKind) -> Self {
        Self {
            id: TaskId::generate(),
            url,
            kind,
            status: TaskStatus::Pending,
            result: None,
            error: None,
            created_at: chrono::Utc::now(),
        }
    }

    /// Merge a partial update into this task.
    pub(crate) fn apply(&mut self, update: TaskUpdate) {
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(result) = update.result {
            self.result = Some(result);
            self.error = None;
        }
        if let Some(error) = update.error {
            self.error = Some(error);
            self.result = None;
        }
    }
}

/// Partial set of fields merged into a stored task by `TaskRegistry::update`.
///
/// Only the transition constructors are public so `result` and `error` can
/// only ever accompany their matching terminal status.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskUpdate {
    status: Option<TaskStatus>,
    result: Option<String>,
    error: Option<String>,
}

impl TaskUpdate {
    pub fn downloading() -> Self {
        Self {
            status: Some(TaskStatus::Downloading),
            ..Default::default()
        }
    }

    pub fn completed(result: impl Into<String>) -> Self {
        Self {
            status: Some(TaskStatus::Completed),
            result: Some(result.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: Some(TaskStatus::Failed),
            result: None,
            error: Some(error.into()),
        }
    }

    pub fn status(&self) -> Option<TaskStatus> {
        self.status
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_some_and(|s| s.is_terminal())
    }
}
