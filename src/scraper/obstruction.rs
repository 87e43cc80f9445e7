use serde_json::Value;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::scraper::extractor::{
    ContentExtractor, CLICK_MATCHING_JS, SWEEP_OBSTRUCTIONS_JS, UNLOCK_SCROLL_JS,
};
use crate::scraper::page::PageSession;
use crate::scraper::{DismissControl, ScraperConfig, StepOutcome, StepReport};

/// Result of one obstruction sweep, one report per step.
#[derive(Debug, Clone, Default)]
pub struct ObstructionReport {
    pub steps: Vec<StepReport>,
}

impl ObstructionReport {
    pub fn failures(&self) -> impl Iterator<Item = &StepReport> {
        self.steps.iter().filter(|s| s.outcome.is_failed())
    }

    pub fn completed(&self, step: &str) -> bool {
        self.steps
            .iter()
            .any(|s| s.step == step && s.outcome == StepOutcome::Done)
    }
}

/// Clears login walls, cookie banners and sticky sheets from a page.
///
/// Every step is attempted regardless of what happened to the previous one.
pub struct ObstructionRemover {
    config: ScraperConfig,
    extractor: ContentExtractor,
}

impl ObstructionRemover {
    pub fn new(config: ScraperConfig) -> Self {
        let extractor = ContentExtractor::new(config.clone());
        Self { config, extractor }
    }

    pub async fn clear(&self, page: &dyn PageSession) -> ObstructionReport {
        let mut report = ObstructionReport::default();

        for control in &self.config.dismiss_controls {
            let outcome = self.dismiss(page, control).await;
            report.steps.push(StepReport::new(format!("dismiss {}", control.label()), outcome));
        }

        let sweep = match page
            .call_function(SWEEP_OBSTRUCTIONS_JS, self.extractor.sweep_args())
            .await
        {
            Ok(removed) => {
                let removed = removed.as_u64().unwrap_or(0);
                if removed > 0 {
                    debug!(removed, "Removed blocking overlays");
                }
                StepOutcome::Done
            }
            Err(e) => StepOutcome::Failed(e.to_string()),
        };
        report.steps.push(StepReport::new("sweep overlays", sweep));

        let unlock = match page.call_function(UNLOCK_SCROLL_JS, Value::Null).await {
            Ok(_) => StepOutcome::Done,
            Err(e) => StepOutcome::Failed(e.to_string()),
        };
        report.steps.push(StepReport::new("unlock scroll", unlock));

        let escape = match page.press_key("Escape").await {
            Ok(()) => StepOutcome::Done,
            Err(e) => StepOutcome::Failed(e.to_string()),
        };
        report.steps.push(StepReport::new("escape", escape));

        for failure in report.failures() {
            warn!(step = %failure.step, outcome = ?failure.outcome, "Obstruction step failed");
        }

        report
    }

    async fn dismiss(&self, page: &dyn PageSession, control: &DismissControl) -> StepOutcome {
        let limit = self.config.dismiss_timeout();

        let clicked = match &control.text {
            None => page.click(&control.selector, limit).await,
            Some(_) => {
                let args = self.extractor.click_matching_args(control);
                match timeout(limit, page.call_function(CLICK_MATCHING_JS, args)).await {
                    Ok(result) => result.map(|v| v.as_bool().unwrap_or(false)),
                    Err(_) => return StepOutcome::Failed("click timed out".to_string()),
                }
            }
        };

        match clicked {
            Ok(true) => {
                debug!(control = %control.label(), "Dismissed popup");
                StepOutcome::Done
            }
            Ok(false) => StepOutcome::Skipped("not present".to_string()),
            Err(e) => StepOutcome::Failed(e.to_string()),
        }
    }
}
