use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::{DownloadError, DownloadOutput, Downloader, Result};
use crate::config::DownloaderConfig;
use crate::tasks::TaskKind;

/// Downloader backed by the external `yt-dlp` binary.
#[derive(Debug, Clone)]
pub struct YtDlp {
    config: DownloaderConfig,
}

impl YtDlp {
    pub fn new(config: DownloaderConfig) -> Self {
        Self { config }
    }

    /// Full argument list for one invocation.
    pub fn build_args(&self, kind: TaskKind, url: &str) -> Vec<String> {
        let dir = match kind {
            TaskKind::Video => &self.config.video_dir,
            TaskKind::Audio => &self.config.audio_dir,
        };
        let output = dir.join(&self.config.output_template);

        let mut args = vec![
            "-o".to_string(),
            output.to_string_lossy().into_owned(),
            "--no-playlist".to_string(),
        ];

        match kind {
            TaskKind::Video => {
                args.push("-f".to_string());
                args.push(self.config.video_format.clone());
            }
            TaskKind::Audio => {
                args.push("-x".to_string());
                args.push("--audio-format".to_string());
                args.push(self.config.audio_format.clone());
            }
        }

        args.push(url.to_string());
        args
    }

    async fn run(&self, kind: TaskKind, url: &str) -> Result<DownloadOutput> {
        let args = self.build_args(kind, url);
        info!(binary = %self.config.binary, %kind, url, "Starting yt-dlp");

        let mut child = Command::new(&self.config.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| DownloadError::Spawn {
                binary: self.config.binary.clone(),
                source,
            })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let stdout_task = tokio::spawn(forward_lines(stdout, url.to_string(), "stdout"));
        let stderr_task = tokio::spawn(forward_lines(stderr, url.to_string(), "stderr"));

        let status = child
            .wait()
            .await
            .map_err(|e| DownloadError::Other(format!("failed to wait for yt-dlp: {e}")))?;

        let _ = stdout_task.await;
        let stderr = stderr_task.await.unwrap_or_default();

        if status.success() {
            info!(%kind, url, "yt-dlp finished");
            Ok(DownloadOutput::done())
        } else {
            Err(DownloadError::Exited {
                code: status.code(),
                stderr,
            })
        }
    }
}

/// Forward a child stream to tracing line by line and return what was read.
///
/// Lines are decoded lossily; the pipe is drained until EOF so the child never
/// sees a closed reader.
async fn forward_lines<R>(stream: Option<R>, url: String, name: &'static str) -> String
where
    R: AsyncRead + Unpin,
{
    let Some(stream) = stream else {
        return String::new();
    };

    let mut reader = BufReader::new(stream);
    let mut collected = String::new();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                let line = line.trim_end_matches(['\n', '\r']);
                debug!(url = %url, stream = name, "{}", line);
                collected.push_str(line);
                collected.push('\n');
            }
            Err(e) => {
                warn!(url = %url, stream = name, error = %e, "Failed to read yt-dlp output");
                break;
            }
        }
    }
    collected
}

#[async_trait]
impl Downloader for YtDlp {
    async fn download_video(&self, url: &str) -> Result<DownloadOutput> {
        self.run(TaskKind::Video, url).await
    }

    async fn download_audio(&self, url: &str) -> Result<DownloadOutput> {
        self.run(TaskKind::Audio, url).await
    }
}
