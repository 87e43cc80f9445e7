use tracing::{debug, info, warn};

use crate::scraper::extractor::ContentExtractor;
use crate::scraper::obstruction::ObstructionRemover;
use crate::scraper::page::PageSession;
use crate::scraper::{ScraperConfig, StepOutcome, StepReport};

/// Scroll-height tracking for one page run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrollState {
    pub last_height: Option<u64>,
    pub unchanged_rounds: usize,
    pub iterations: usize,
}

impl ScrollState {
    pub fn new(initial_height: Option<u64>) -> Self {
        Self {
            last_height: initial_height,
            ..Default::default()
        }
    }

    /// Record the height seen after an iteration. `None` (probe failed)
    /// counts as no progress. Returns true once the height has been unchanged
    /// for `stable_rounds` consecutive iterations.
    pub fn observe(&mut self, height: Option<u64>, stable_rounds: usize) -> bool {
        self.iterations += 1;

        let progressed = match (self.last_height, height) {
            (Some(last), Some(new)) => new != last,
            (None, Some(_)) => true,
            (_, None) => false,
        };

        if progressed {
            self.unchanged_rounds = 0;
            self.last_height = height;
        } else {
            self.unchanged_rounds += 1;
        }

        self.unchanged_rounds >= stable_rounds
    }
}

/// What happened while loading a page's feed.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub scroll: ScrollState,
    /// Loading stopped because the page stopped growing
    pub stabilized: bool,
    /// At least one content block was present after loading
    pub blocks_present: bool,
    pub steps: Vec<StepReport>,
}

/// Drives progressive scrolling until the feed stops growing.
pub struct ContentLoader {
    config: ScraperConfig,
    extractor: ContentExtractor,
}

impl ContentLoader {
    pub fn new(config: ScraperConfig) -> Self {
        let extractor = ContentExtractor::new(config.clone());
        Self { config, extractor }
    }

    pub async fn load(&self, page: &dyn PageSession, remover: &ObstructionRemover) -> LoadReport {
        let mut report = LoadReport::default();

        let initial = self.probe_height(page, &mut report).await;
        report.scroll = ScrollState::new(initial);

        for iteration in 1..=self.config.max_scroll_iterations {
            for _ in 0..self.config.wheel_bursts {
                if let Err(e) = page.wheel(self.config.wheel_delta).await {
                    report.steps.push(StepReport::new("wheel", StepOutcome::Failed(e.to_string())));
                }
                tokio::time::sleep(self.config.wheel_pause.sample()).await;
            }

            // Mouse events can be swallowed by overlays; force it from script too.
            if let Err(e) = self.extractor.scroll_to_bottom(page).await {
                report
                    .steps
                    .push(StepReport::new("scroll to bottom", StepOutcome::Failed(e.to_string())));
            }

            tokio::time::sleep(self.config.scroll_settle.sample()).await;
            info!(
                iteration,
                budget = self.config.max_scroll_iterations,
                "Scroll iteration completed"
            );

            remover.clear(page).await;

            let height = self.probe_height(page, &mut report).await;
            if report.scroll.observe(height, self.config.stable_height_rounds) {
                info!(iteration, "Page height stable, stopping scroll");
                report.stabilized = true;
                break;
            }
            if report.scroll.unchanged_rounds > 0 {
                debug!(
                    unchanged = report.scroll.unchanged_rounds,
                    needed = self.config.stable_height_rounds,
                    "Page height unchanged"
                );
            }
        }

        report.blocks_present = self.wait_for_blocks(page, &mut report).await;
        report
    }

    async fn probe_height(&self, page: &dyn PageSession, report: &mut LoadReport) -> Option<u64> {
        match self.extractor.scroll_height(page).await {
            Ok(height) => Some(height),
            Err(e) => {
                report
                    .steps
                    .push(StepReport::new("scroll height", StepOutcome::Failed(e.to_string())));
                None
            }
        }
    }

    async fn wait_for_blocks(&self, page: &dyn PageSession, report: &mut LoadReport) -> bool {
        let attempts = self.config.block_wait_attempts.max(1);

        for attempt in 1..=attempts {
            match page
                .wait_for_selector(&self.config.block_selector, self.config.block_wait_timeout())
                .await
            {
                Ok(()) => {
                    let count = self.extractor.count_blocks(page).await.unwrap_or(0);
                    info!(count, "Content blocks loaded");
                    report
                        .steps
                        .push(StepReport::new("wait for blocks", StepOutcome::Done));
                    return true;
                }
                Err(e) => {
                    report.steps.push(StepReport::new(
                        format!("wait for blocks (attempt {})", attempt),
                        StepOutcome::Failed(e.to_string()),
                    ));
                    if attempt < attempts {
                        warn!(attempt, "No content blocks yet, retrying");
                        tokio::time::sleep(self.config.block_wait_backoff(attempt)).await;
                    }
                }
            }
        }

        warn!(
            selector = %self.config.block_selector,
            "No content blocks found after scrolling"
        );
        false
    }
}
