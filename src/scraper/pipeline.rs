use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::app::{PagefeedError, Result};
use crate::domain::{PageTarget, Post};
use crate::scraper::assembler::{BlockExtraction, PostAssembler};
use crate::scraper::classifier::{Classification, PostClassifier};
use crate::scraper::extractor::ContentExtractor;
use crate::scraper::loader::{ContentLoader, LoadReport};
use crate::scraper::media::MediaResolver;
use crate::scraper::obstruction::{ObstructionRemover, ObstructionReport};
use crate::scraper::page::PageSession;
use crate::scraper::timestamp::{self, TimeSource};
use crate::scraper::{ScraperConfig, StepOutcome};
use crate::video::VideoResolver;

/// What happened to one content block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockOutcome {
    Accepted,
    Comment,
    TooShort,
    Failed(String),
}

/// State of one target run, passed through every stage.
#[derive(Debug)]
pub struct ScrapeContext {
    pub target: PageTarget,
    /// When the run began; per-block times use the moment the block is read
    pub started_at: DateTime<Utc>,
    pub navigation: StepOutcome,
    pub obstruction: Option<ObstructionReport>,
    pub load: Option<LoadReport>,
    pub blocks: Vec<BlockOutcome>,
    pub posts: Vec<Post>,
}

impl ScrapeContext {
    pub fn new(target: PageTarget, started_at: DateTime<Utc>) -> Self {
        Self {
            target,
            started_at,
            navigation: StepOutcome::Skipped("not started".into()),
            obstruction: None,
            load: None,
            blocks: Vec::new(),
            posts: Vec::new(),
        }
    }

    fn into_report(self, low_yield: bool) -> ScrapeReport {
        ScrapeReport {
            target: self.target,
            navigation: self.navigation,
            obstruction: self.obstruction,
            load: self.load,
            blocks: self.blocks,
            posts: self.posts,
            low_yield,
        }
    }
}

/// Outcome of scraping one target. Posts are in page order.
#[derive(Debug)]
pub struct ScrapeReport {
    pub target: PageTarget,
    pub navigation: StepOutcome,
    pub obstruction: Option<ObstructionReport>,
    pub load: Option<LoadReport>,
    pub blocks: Vec<BlockOutcome>,
    pub posts: Vec<Post>,
    pub low_yield: bool,
}

impl ScrapeReport {
    pub fn count(&self, outcome: &BlockOutcome) -> usize {
        self.blocks.iter().filter(|b| *b == outcome).count()
    }
}

/// Best-effort diagnostics written next to a target's other outputs.
#[derive(Debug, Clone, Default)]
pub struct DebugArtifacts {
    dir: Option<PathBuf>,
}

impl DebugArtifacts {
    pub const SCREENSHOT: &'static str = "debug_screenshot.png";
    pub const HTML: &'static str = "debug_html.html";
    pub const ERROR_SCREENSHOT: &'static str = "debug_error.png";

    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
        }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Full-page screenshot and HTML snapshot.
    pub async fn capture_low_yield(&self, page: &dyn PageSession) {
        let Some(dir) = self.prepare().await else {
            return;
        };

        if let Err(e) = page.screenshot(&dir.join(Self::SCREENSHOT), true).await {
            warn!(error = %e, "Failed to capture debug screenshot");
        }

        match page.html().await {
            Ok(html) => {
                if let Err(e) = tokio::fs::write(dir.join(Self::HTML), html).await {
                    warn!(error = %e, "Failed to write debug HTML");
                }
            }
            Err(e) => warn!(error = %e, "Failed to read page HTML"),
        }
        info!(dir = %dir.display(), "Saved debug artifacts");
    }

    /// Viewport screenshot after a failed run.
    pub async fn capture_error(&self, page: &dyn PageSession) {
        let Some(dir) = self.prepare().await else {
            return;
        };

        match page.screenshot(&dir.join(Self::ERROR_SCREENSHOT), false).await {
            Ok(()) => info!(dir = %dir.display(), "Saved error screenshot"),
            Err(e) => warn!(error = %e, "Failed to capture error screenshot"),
        }
    }

    async fn prepare(&self) -> Option<PathBuf> {
        let dir = self.dir.clone()?;
        match tokio::fs::create_dir_all(&dir).await {
            Ok(()) => Some(dir),
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "Failed to create debug directory");
                None
            }
        }
    }
}

/// Runs the extraction pipeline for one target against an open page.
pub struct PageScraper<'a> {
    config: &'a ScraperConfig,
    videos: &'a dyn VideoResolver,
    remover: ObstructionRemover,
    loader: ContentLoader,
    extractor: ContentExtractor,
    classifier: PostClassifier,
    assembler: PostAssembler,
}

impl<'a> PageScraper<'a> {
    pub fn new(config: &'a ScraperConfig, videos: &'a dyn VideoResolver) -> Self {
        Self {
            config,
            videos,
            remover: ObstructionRemover::new(config.clone()),
            loader: ContentLoader::new(config.clone()),
            extractor: ContentExtractor::new(config.clone()),
            classifier: PostClassifier::new(config.clone()),
            assembler: PostAssembler::new(config.clone()),
        }
    }

    /// Scrape `target` on `page`.
    ///
    /// A navigation timeout yields an empty report. Any other failure of the
    /// run as a whole takes an error screenshot and is returned.
    pub async fn run(
        &self,
        page: &dyn PageSession,
        target: &PageTarget,
        debug: &DebugArtifacts,
    ) -> Result<ScrapeReport> {
        let mut ctx = ScrapeContext::new(target.clone(), Utc::now());
        info!(page = %target.name, url = %target.url, "Scraping page");

        if let Err(e) = self.scrape_into(page, &mut ctx).await {
            error!(page = %target.name, error = %e, "Scrape failed");
            debug.capture_error(page).await;
            return Err(e);
        }

        if ctx.navigation.is_failed() {
            return Ok(ctx.into_report(false));
        }

        let low_yield = self.assembler.is_low_yield(ctx.posts.len());
        let elapsed = Utc::now().signed_duration_since(ctx.started_at);
        info!(
            page = %target.name,
            posts = ctx.posts.len(),
            elapsed_secs = elapsed.num_seconds(),
            "Extraction finished"
        );
        if low_yield {
            warn!(
                page = %target.name,
                posts = ctx.posts.len(),
                threshold = self.config.low_yield_threshold,
                "Few posts found, capturing debug artifacts"
            );
            debug.capture_low_yield(page).await;
        }

        Ok(ctx.into_report(low_yield))
    }

    async fn scrape_into(&self, page: &dyn PageSession, ctx: &mut ScrapeContext) -> Result<()> {
        match page
            .goto(&ctx.target.url, self.config.navigation_timeout())
            .await
        {
            Ok(()) => ctx.navigation = StepOutcome::Done,
            Err(PagefeedError::Timeout(reason)) => {
                warn!(url = %ctx.target.url, %reason, "Navigation timed out");
                ctx.navigation = StepOutcome::Failed(reason);
                return Ok(());
            }
            Err(e) => return Err(e),
        }
        tokio::time::sleep(self.config.initial_settle.sample()).await;

        ctx.obstruction = Some(self.remover.clear(page).await);
        let load = self.loader.load(page, &self.remover).await;
        let blocks_present = load.blocks_present;
        ctx.load = Some(load);
        if !blocks_present {
            return Ok(());
        }

        let count = self.extractor.count_blocks(page).await?;
        let limit = count.min(self.config.max_blocks);
        info!(found = count, processing = limit, "Processing content blocks");

        for index in 0..limit {
            let outcome = match self.process_block(page, ctx, index).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(index, error = %e, "Block extraction failed, skipping");
                    BlockOutcome::Failed(e.to_string())
                }
            };
            ctx.blocks.push(outcome);
        }
        Ok(())
    }

    async fn process_block(
        &self,
        page: &dyn PageSession,
        ctx: &mut ScrapeContext,
        index: usize,
    ) -> Result<BlockOutcome> {
        match self.extractor.expand(page, index).await {
            Ok(true) => {
                debug!(index, "Expanded caption");
                tokio::time::sleep(self.config.expansion_pause.sample()).await;
            }
            Ok(false) => {}
            Err(e) => warn!(index, error = %e, "Caption expansion failed"),
        }

        let Some(snapshot) = self.extractor.snapshot(page, index).await? else {
            return Ok(BlockOutcome::Failed("block no longer present".into()));
        };

        let body = match self.classifier.classify(&snapshot, &ctx.target.name) {
            Classification::Comment => {
                info!(index, "Skipping comment");
                return Ok(BlockOutcome::Comment);
            }
            Classification::TooShort => {
                debug!(index, "Skipping block without usable text");
                return Ok(BlockOutcome::TooShort);
            }
            Classification::Post { body } => body,
        };

        let permalink = self
            .assembler
            .resolve_permalink(&snapshot.links, &ctx.target.url);
        let media = MediaResolver::new(self.config, self.videos)
            .resolve(&snapshot, permalink.as_deref())
            .await;

        // Relative times are relative to when the block was read
        let captured_at = Utc::now();
        let resolved = timestamp::resolve(&snapshot.text, index, captured_at);
        match &resolved.source {
            TimeSource::Parsed(expr) => debug!(index, expression = %expr, "Parsed timestamp"),
            TimeSource::Estimated => debug!(index, "Estimated timestamp from position"),
        }

        let post = self.assembler.assemble(
            &ctx.target.url,
            BlockExtraction {
                index,
                body,
                permalink,
                media,
                published_at: resolved.at,
            },
            captured_at,
        );
        info!(
            index,
            post = ctx.posts.len() + 1,
            media = %post.media_kind,
            title = %post.title,
            "Post found"
        );
        ctx.posts.push(post);
        Ok(BlockOutcome::Accepted)
    }
}
