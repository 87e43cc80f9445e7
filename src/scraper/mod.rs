//! Post extraction from a rendered page.
//!
//! # Architecture
//!
//! ```text
//! PageTarget → PageSession (navigate) → ObstructionRemover → ContentLoader
//!            → per block: expand → snapshot → PostClassifier → MediaResolver
//!              → timestamp → PostAssembler → Vec<Post>
//! ```
//!
//! All DOM access goes through the [`PageSession`] trait and a small set of
//! in-page scripts ([`extractor`]). Each script returns a plain JSON
//! observation, and every heuristic (post vs comment, text cleaning, media
//! selection, timestamps) runs in Rust over those observations, so the whole
//! pipeline can be driven by a scripted page in tests.
//!
//! # Usage
//!
//! ```rust,ignore
//! use pagefeed::scraper::{ChromeScraper, Scraper, ScraperConfig};
//!
//! let scraper = ChromeScraper::new(ScraperConfig::default(), resolver).with_debug_root("debug");
//! let report = scraper.scrape(&target).await?;
//! println!("{} posts", report.posts.len());
//! ```

mod assembler;
mod chrome;
mod classifier;
mod config;
pub mod extractor;
mod loader;
mod media;
mod obstruction;
mod page;
mod pipeline;
pub mod timestamp;

pub use assembler::{BlockExtraction, PostAssembler};
pub use chrome::{ChromePage, ChromeScraper};
pub use classifier::{Classification, PostClassifier};
pub use config::{DelayRange, DismissControl, ScraperConfig};
pub use extractor::{BlockSnapshot, ContentExtractor};
pub use loader::{ContentLoader, LoadReport, ScrollState};
pub use media::{MediaResolution, MediaResolver};
pub use obstruction::{ObstructionRemover, ObstructionReport};
pub use page::PageSession;
pub use pipeline::{BlockOutcome, DebugArtifacts, PageScraper, ScrapeContext, ScrapeReport};

use async_trait::async_trait;

use crate::app::Result;
use crate::domain::PageTarget;

/// Result of one best-effort step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Done,
    /// Nothing to do, e.g. the control was not on the page
    Skipped(String),
    Failed(String),
}

impl StepOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, StepOutcome::Failed(_))
    }
}

/// A named step and how it went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub step: String,
    pub outcome: StepOutcome,
}

impl StepReport {
    pub fn new(step: impl Into<String>, outcome: StepOutcome) -> Self {
        Self {
            step: step.into(),
            outcome,
        }
    }
}

/// Trait for page scraping implementations
#[async_trait]
pub trait Scraper: Send + Sync {
    /// Scrape the posts of one page target.
    ///
    /// Navigation timeouts yield an empty report; `Err` means the run failed
    /// as a whole and the caller should fall back to cached posts.
    async fn scrape(&self, target: &PageTarget) -> Result<ScrapeReport>;
}
