//! Per-target orchestration: scrape, cache, emit, fall back to the cache.

pub mod parallel;

pub use parallel::{ParallelRunner, DEFAULT_WORKERS};

use std::path::Path;

use tracing::{error, info, warn};

use crate::domain::{PageTarget, Post};
use crate::feed::FeedEmitter;
use crate::scraper::Scraper;
use crate::store::Store;

/// Where the posts of a feed came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostSource {
    Fresh,
    Cache,
    /// Scrape found nothing and there was no cache
    Unavailable,
}

/// Result of processing one target.
#[derive(Debug, Clone)]
pub struct TargetRun {
    pub target: PageTarget,
    pub source: PostSource,
    pub posts: usize,
    pub feed_written: bool,
}

/// Scrape a target and emit its feed, falling back to cached posts.
///
/// Never fails: every error is logged and reflected in the returned run.
pub async fn process_target(
    scraper: &dyn Scraper,
    store: &(dyn Store + Send + Sync),
    emitter: &FeedEmitter,
    feeds_dir: &Path,
    target: &PageTarget,
) -> TargetRun {
    info!(page = %target.name, "Processing page");

    let fresh = match scraper.scrape(target).await {
        Ok(report) => report.posts,
        Err(e) => {
            error!(page = %target.name, error = %e, "Scrape failed");
            Vec::new()
        }
    };

    if !fresh.is_empty() {
        info!(page = %target.name, posts = fresh.len(), "Scraped fresh posts");
        if let Err(e) = store.save_posts(target, &fresh) {
            warn!(page = %target.name, error = %e, "Failed to save cache");
        }
        let feed_written = emit(emitter, feeds_dir, target, &fresh).await;
        return TargetRun {
            target: target.clone(),
            source: PostSource::Fresh,
            posts: fresh.len(),
            feed_written,
        };
    }

    warn!(page = %target.name, "No fresh posts, checking cache");
    let cached = match store.load_posts(target) {
        Ok(posts) => posts,
        Err(e) => {
            warn!(page = %target.name, error = %e, "Failed to load cache");
            Vec::new()
        }
    };

    if cached.is_empty() {
        warn!(page = %target.name, "No data available (scrape failed and no cache)");
        return TargetRun {
            target: target.clone(),
            source: PostSource::Unavailable,
            posts: 0,
            feed_written: false,
        };
    }

    let feed_written = emit(emitter, feeds_dir, target, &cached).await;
    info!(page = %target.name, posts = cached.len(), "Generated feed from cache");
    TargetRun {
        target: target.clone(),
        source: PostSource::Cache,
        posts: cached.len(),
        feed_written,
    }
}

/// Write the feed for a target, logging instead of failing.
pub async fn emit(emitter: &FeedEmitter, feeds_dir: &Path, target: &PageTarget, posts: &[Post]) -> bool {
    let path = target.feed_path(feeds_dir);
    match emitter.write(&path, posts, &target.name, &target.url).await {
        Ok(()) => true,
        Err(e) => {
            error!(page = %target.name, path = %path.display(), error = %e, "Failed to write feed");
            false
        }
    }
}
