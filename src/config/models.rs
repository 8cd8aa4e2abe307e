use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub worker: WorkerConfig,
    #[serde(default)]
    pub downloader: DownloaderConfig,
    #[serde(default)]
    pub outcomes: OutcomeLogConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    /// Maximum accepted request body for task submission
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8787))
}

fn default_max_body_bytes() -> usize {
    64 * 1024
}

/// Worker pool configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorkerConfig {
    /// Maximum number of simultaneous downloads
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Pause after an unexpected dispatch loop error
    #[serde(default = "default_loop_error_backoff_ms")]
    pub loop_error_backoff_ms: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            loop_error_backoff_ms: default_loop_error_backoff_ms(),
        }
    }
}

fn default_concurrency() -> usize {
    2
}

fn default_loop_error_backoff_ms() -> u64 {
    500
}

/// yt-dlp invocation settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DownloaderConfig {
    #[serde(default = "default_binary")]
    pub binary: String,
    #[serde(default = "default_video_dir")]
    pub video_dir: PathBuf,
    #[serde(default = "default_audio_dir")]
    pub audio_dir: PathBuf,
    /// yt-dlp output template, joined onto the kind-specific directory
    #[serde(default = "default_output_template")]
    pub output_template: String,
    #[serde(default = "default_video_format")]
    pub video_format: String,
    #[serde(default = "default_audio_format")]
    pub audio_format: String,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            video_dir: default_video_dir(),
            audio_dir: default_audio_dir(),
            output_template: default_output_template(),
            video_format: default_video_format(),
            audio_format: default_audio_format(),
        }
    }
}

fn default_binary() -> String {
    "yt-dlp".to_string()
}

fn default_video_dir() -> PathBuf {
    PathBuf::from("download/video")
}

fn default_audio_dir() -> PathBuf {
    PathBuf::from("download/audio")
}

fn default_output_template() -> String {
    "%(title)s.%(ext)s".to_string()
}

fn default_video_format() -> String {
    "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]".to_string()
}

fn default_audio_format() -> String {
    "mp3".to_string()
}

/// Outcome audit log locations
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutcomeLogConfig {
    #[serde(default = "default_log_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_success_file")]
    pub success_file: String,
    #[serde(default = "default_failure_file")]
    pub failure_file: String,
}

impl Default for OutcomeLogConfig {
    fn default() -> Self {
        Self {
            dir: default_log_dir(),
            success_file: default_success_file(),
            failure_file: default_failure_file(),
        }
    }
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("download")
}

fn default_success_file() -> String {
    "success.log".to_string()
}

fn default_failure_file() -> String {
    "failure.log".to_string()
}
