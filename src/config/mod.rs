//! Configuration management for pagefeed.
//!
//! Configuration is read from `~/.config/pagefeed/config.toml` unless a path
//! is given on the command line. If the file doesn't exist, a default
//! configuration with comments is created.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::feed::FeedConfig;
use crate::scraper::ScraperConfig;
use crate::video::VideoConfig;

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub output: OutputConfig,
    pub scraper: ScraperConfig,
    pub video: VideoConfig,
    pub feed: FeedConfig,
}

/// Where caches, feeds and debug artifacts are written.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub cache_dir: PathBuf,
    pub feeds_dir: PathBuf,
    pub debug_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("cache"),
            feeds_dir: PathBuf::from("feeds"),
            debug_dir: PathBuf::from("debug"),
        }
    }
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, creates a default one with comments.
    /// Missing fields in the config file will use default values.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from `path`, creating it with defaults if missing.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            Self::create_default_config(path)?;
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the default config file path: `~/.config/pagefeed/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("pagefeed").join("config.toml"))
    }

    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(())
    }

    /// Generate the default config file content with comments.
    fn default_config_content() -> String {
        r##"# pagefeed configuration
#
# Every key is optional; anything left out uses the built-in default.
# Delays are jittered ranges in milliseconds: { min_ms = ..., max_ms = ... }

[output]
# Last successful scrape per page, used when a fresh scrape finds nothing
cache_dir = "cache"
# Generated RSS files
feeds_dir = "feeds"
# Screenshots and HTML captured when a scrape finds few posts or fails
debug_dir = "debug"

[scraper]
# Run browser in headless mode (no visible window)
headless = true

viewport_width = 1366
viewport_height = 768
locale = "en-US"
timezone = "UTC"

# Budgets in seconds
navigation_timeout_secs = 90
operation_timeout_secs = 30

# Wait after the first page load
initial_settle = { min_ms = 8000, max_ms = 12000 }

# Progressive scrolling: at most this many iterations, stopping early once
# the page height has not changed for `stable_height_rounds` iterations
max_scroll_iterations = 20
stable_height_rounds = 3
wheel_bursts = 5
wheel_delta = 1200.0
wheel_pause = { min_ms = 2000, max_ms = 3500 }
scroll_settle = { min_ms = 5000, max_ms = 8000 }

# Waiting for the first post after scrolling
block_wait_attempts = 3
block_wait_timeout_secs = 15
block_wait_backoff_ms = 5000

# Posts examined per page
max_blocks = 25

# Fewer posts than this saves debug artifacts
low_yield_threshold = 3

# Selector matching one post (or comment) in the feed
block_selector = "div[role=\"article\"]"

# Words that mark the end of a post body, earliest match wins
footer_markers = [
    "All reactions:",
    "View more comments",
    "Write a comment",
    "Most relevant",
    "View all",
    "replies",
    "shares",
    "comments",
]

# Caption expansion controls, by visible text
expansion_phrases = ["See more", "আরও দেখুন", "See More", "আরও", "আরও দেখুন..."]

[video]
# Resolve direct video URLs with an external tool; when disabled or when
# resolution fails, feeds link to the video's watch page instead
enabled = true
binary = "yt-dlp"
format = "hd/sd/best"
timeout_secs = 20

[feed]
language = "en"
generator = "pagefeed"
# {name} is replaced by the page name
description_template = "Unofficial RSS feed for {name}"
"##
        .to_string()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}
