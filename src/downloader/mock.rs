//! Scripted in-memory downloader for tests and local development

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

use super::{DownloadError, DownloadOutput, Downloader, Result};
use crate::tasks::TaskKind;

/// Downloader that sleeps for a fixed delay and then succeeds, unless the
/// url was scripted to fail or panic. Tracks how many calls overlap.
#[derive(Debug, Default)]
pub struct MockDownloader {
    delay: Duration,
    failures: HashMap<String, String>,
    panics: Vec<String>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    calls: Mutex<Vec<(TaskKind, String)>>,
}

impl MockDownloader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Make downloads of `url` fail with `message`.
    pub fn fail_on(mut self, url: impl Into<String>, message: impl Into<String>) -> Self {
        self.failures.insert(url.into(), message.into());
        self
    }

    /// Make downloads of `url` panic.
    pub fn panic_on(mut self, url: impl Into<String>) -> Self {
        self.panics.push(url.into());
        self
    }

    /// Highest number of overlapping calls observed so far.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Calls received so far, in start order.
    pub async fn calls(&self) -> Vec<(TaskKind, String)> {
        self.calls.lock().await.clone()
    }

    async fn run(&self, kind: TaskKind, url: &str) -> Result<DownloadOutput> {
        self.calls.lock().await.push((kind, url.to_string()));

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let _guard = InFlightGuard(&self.in_flight);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if self.panics.iter().any(|p| p == url) {
            panic!("scripted panic for {url}");
        }

        match self.failures.get(url) {
            Some(message) => Err(DownloadError::Other(message.clone())),
            None => Ok(DownloadOutput::done()),
        }
    }
}

struct InFlightGuard<'a>(&'a AtomicUsize);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Downloader for MockDownloader {
    async fn download_video(&self, url: &str) -> Result<DownloadOutput> {
        self.run(TaskKind::Video, url).await
    }

    async fn download_audio(&self, url: &str) -> Result<DownloadOutput> {
        self.run(TaskKind::Audio, url).await
    }
}
