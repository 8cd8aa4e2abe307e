//! Media download capability
//!
//! The worker pool only sees the [`Downloader`] trait; [`YtDlp`] is the
//! production implementation that shells out to the `yt-dlp` binary.

pub mod mock;
mod ytdlp;

pub use mock::MockDownloader;
pub use ytdlp::YtDlp;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tasks::TaskKind;

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("failed to start {binary}: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{}", exit_message(.code, .stderr))]
    Exited { code: Option<i32>, stderr: String },

    #[error("{0}")]
    Other(String),
}

fn exit_message(code: &Option<i32>, stderr: &str) -> String {
    let stderr = stderr.trim();
    if !stderr.is_empty() {
        return stderr.to_string();
    }
    match code {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    }
}

pub type Result<T> = std::result::Result<T, DownloadError>;

/// Success payload of a download, serialized into the task's `result`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadOutput {
    pub done: bool,
}

impl DownloadOutput {
    pub fn done() -> Self {
        Self { done: true }
    }
}

/// Fetches media for a url. Implementations must be safe to call from
/// several worker slots at once.
#[async_trait]
pub trait Downloader: Send + Sync {
    async fn download_video(&self, url: &str) -> Result<DownloadOutput>;

    async fn download_audio(&self, url: &str) -> Result<DownloadOutput>;

    /// Dispatch on the task kind.
    async fn download(&self, kind: TaskKind, url: &str) -> Result<DownloadOutput> {
        match kind {
            TaskKind::Video => self.download_video(url).await,
            TaskKind::Audio => self.download_audio(url).await,
        }
    }
}
