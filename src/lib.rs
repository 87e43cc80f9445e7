//! # pagefeed
//!
//! Turns public social-network pages into RSS feeds by reading them in a
//! headless browser.
//!
//! ## Architecture
//!
//! ```text
//! accounts.json → Runner → Scraper → Vec<Post> → Store (cache) → FeedEmitter
//!                                       ↑ empty?  ← cached posts ←┘
//! ```
//!
//! - [`scraper`]: page loading and the post extraction heuristics
//! - [`video`]: direct video URL resolution
//! - [`feed`]: RSS 2.0 generation with media embedding
//! - [`store`]: JSON post cache
//! - [`runner`]: per-page orchestration with a bounded worker pool
//!
//! ## Quick Start
//!
//! ```bash
//! # Scrape every page listed in accounts.json and write feeds/
//! pagefeed run accounts.json
//!
//! # Rebuild feeds from the cache only
//! pagefeed render
//!
//! # Try a single page
//! pagefeed scrape --name "Big Club" https://www.facebook.com/bigclub
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together all components:
/// scraper, store, feed emitter, runner.
pub mod app;

/// Configuration management.
///
/// Loads from `~/.config/pagefeed/config.toml` with sections for output
/// directories, the scraper, video resolution and feed metadata.
pub mod config;

/// Command-line interface using clap.
///
/// - `run [ACCOUNTS]` - Scrape pages and write feeds
/// - `render [ACCOUNTS]` - Write feeds from the cache
/// - `scrape --name NAME URL` - Print one page's posts as JSON
pub mod cli;

/// Core domain models.
///
/// - [`Post`](domain::Post): One extracted post
/// - [`PageTarget`](domain::PageTarget): A monitored page
pub mod domain;

/// RSS 2.0 feed generation.
pub mod feed;

/// Per-page orchestration.
///
/// - [`process_target`](runner::process_target): Scrape, cache, emit, cache fallback
/// - [`ParallelRunner`](runner::ParallelRunner): Concurrent targets with a semaphore
pub mod runner;

/// Post extraction from pages rendered in headless Chrome.
///
/// - [`ChromeScraper`](scraper::ChromeScraper): Chrome-based scraper
/// - [`PageScraper`](scraper::PageScraper): The extraction pipeline over any page
/// - [`PageSession`](scraper::PageSession): Async trait over a browser page
/// - [`ScraperConfig`](scraper::ScraperConfig): Budgets, delays and selector lists
pub mod scraper;

/// JSON persistence of the last scrape per page.
///
/// - [`Store`](store::Store): Trait defining storage operations
/// - [`JsonStore`](store::JsonStore): File-per-page implementation
pub mod store;

/// Direct media URL resolution for video posts.
pub mod video;
