//! Direct media URL resolution for video posts.
//!
//! A watch permalink is handed to an external resolver which returns
//! playable URLs ranked best first. Resolution is always optional: callers
//! fall back to the permalink when it fails.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::debug;

use crate::app::{PagefeedError, Result};

/// Configuration for the external video resolver
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// Resolve direct URLs at all (default: true)
    pub enabled: bool,

    /// Resolver executable (default: "yt-dlp")
    pub binary: String,

    /// Format preference passed to the resolver
    pub format: String,

    /// Time budget per video in seconds (default: 20)
    pub timeout_secs: u64,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            binary: "yt-dlp".to_string(),
            format: "hd/sd/best".to_string(),
            timeout_secs: 20,
        }
    }
}

impl VideoConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Turns a video watch URL into direct media URLs.
#[async_trait]
pub trait VideoResolver: Send + Sync {
    /// Ranked direct URLs, best first.
    async fn resolve(&self, watch_url: &str) -> Result<Vec<String>>;
}

/// Pick the URL to embed from a ranked resolver output: the first progressive
/// MP4, otherwise the first HTTP URL.
pub fn pick_direct_url(urls: &[String]) -> Option<String> {
    let http: Vec<&String> = urls.iter().filter(|u| u.starts_with("http")).collect();
    http.iter()
        .find(|u| u.contains(".mp4"))
        .or_else(|| http.first())
        .map(|u| u.to_string())
}

/// Resolver backed by the `yt-dlp` executable (`yt-dlp -g -f <format> <url>`).
pub struct YtDlpResolver {
    config: VideoConfig,
}

impl YtDlpResolver {
    pub fn new(config: VideoConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl VideoResolver for YtDlpResolver {
    async fn resolve(&self, watch_url: &str) -> Result<Vec<String>> {
        debug!(url = %watch_url, "Resolving direct video URL");

        let run = Command::new(&self.config.binary)
            .args(["-g", "-f", &self.config.format, watch_url])
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.config.timeout(), run)
            .await
            .map_err(|_| {
                PagefeedError::Timeout(format!(
                    "{} did not answer within {}s",
                    self.config.binary, self.config.timeout_secs
                ))
            })?
            .map_err(|e| {
                PagefeedError::VideoResolve(format!("Failed to run {}: {}", self.config.binary, e))
            })?;

        if !output.status.success() {
            return Err(PagefeedError::VideoResolve(format!(
                "{} exited with {}",
                self.config.binary, output.status
            )));
        }

        let urls = parse_output(&String::from_utf8_lossy(&output.stdout));
        if urls.is_empty() {
            return Err(PagefeedError::VideoResolve("No URLs in resolver output".into()));
        }
        Ok(urls)
    }
}

fn parse_output(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

/// Resolver used when direct resolution is turned off; always fails so the
/// permalink fallback applies.
pub struct DisabledResolver;

#[async_trait]
impl VideoResolver for DisabledResolver {
    async fn resolve(&self, _watch_url: &str) -> Result<Vec<String>> {
        Err(PagefeedError::VideoResolve("Video resolution disabled".into()))
    }
}
