use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::emulation::{
    SetGeolocationOverrideParams, SetLocaleOverrideParams, SetTimezoneOverrideParams,
};
use chromiumoxide::cdp::browser_protocol::input::{DispatchMouseEventParams, DispatchMouseEventType};
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::error::CdpError;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use futures::StreamExt;
use serde_json::Value;
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::app::{PagefeedError, Result};
use crate::domain::PageTarget;
use crate::scraper::config::ScraperConfig;
use crate::scraper::page::PageSession;
use crate::scraper::pipeline::{DebugArtifacts, PageScraper, ScrapeReport};
use crate::scraper::Scraper;
use crate::video::VideoResolver;

const SELECTOR_POLL: Duration = Duration::from_millis(250);

/// Run a CDP call under a time budget.
async fn bounded<T, F>(what: &str, budget: Duration, call: F) -> Result<T>
where
    F: Future<Output = std::result::Result<T, CdpError>>,
{
    match tokio::time::timeout(budget, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(CdpError::Timeout)) => Err(PagefeedError::Timeout(format!(
            "{}: browser request timed out",
            what
        ))),
        Ok(Err(e)) => Err(PagefeedError::Browser(format!("{}: {}", what, e))),
        Err(_) => Err(PagefeedError::Timeout(format!(
            "{} exceeded {}ms",
            what,
            budget.as_millis()
        ))),
    }
}

/// [`PageSession`] over a chromiumoxide page.
pub struct ChromePage {
    page: Page,
    operation_timeout: Duration,
    center: (f64, f64),
}

impl ChromePage {
    pub fn new(page: Page, config: &ScraperConfig) -> Self {
        Self {
            page,
            operation_timeout: config.operation_timeout(),
            center: (
                f64::from(config.viewport_width) / 2.0,
                f64::from(config.viewport_height) / 2.0,
            ),
        }
    }

    /// Apply user agent, locale, timezone, geolocation and the init script.
    pub async fn configure(&self, config: &ScraperConfig) -> Result<()> {
        let budget = self.operation_timeout;

        if let Some(ref ua) = config.user_agent {
            bounded("set user agent", budget, self.page.set_user_agent(ua)).await?;
        }

        bounded(
            "set timezone",
            budget,
            self.page
                .execute(SetTimezoneOverrideParams::new(config.timezone.clone())),
        )
        .await?;

        bounded(
            "set locale",
            budget,
            self.page.execute(
                SetLocaleOverrideParams::builder()
                    .locale(config.locale.clone())
                    .build(),
            ),
        )
        .await?;

        bounded(
            "set geolocation",
            budget,
            self.page.execute(
                SetGeolocationOverrideParams::builder()
                    .latitude(config.latitude)
                    .longitude(config.longitude)
                    .accuracy(100.0)
                    .build(),
            ),
        )
        .await?;

        if let Some(ref script) = config.init_script {
            bounded(
                "add init script",
                budget,
                self.page
                    .execute(AddScriptToEvaluateOnNewDocumentParams::new(script.clone())),
            )
            .await?;
        }

        Ok(())
    }
}

#[async_trait]
impl PageSession for ChromePage {
    async fn goto(&self, url: &str, timeout: Duration) -> Result<()> {
        let navigate = async {
            self.page.goto(url).await?;
            self.page.wait_for_navigation().await?;
            Ok::<(), CdpError>(())
        };
        bounded("navigation", timeout, navigate).await
    }

    async fn call_function(&self, function: &str, args: Value) -> Result<Value> {
        let expression = format!("({})({})", function, serde_json::to_string(&args)?);
        let params = EvaluateParams::builder()
            .expression(expression)
            .await_promise(true)
            .return_by_value(true)
            .build()
            .map_err(PagefeedError::Script)?;

        let result = bounded(
            "evaluate",
            self.operation_timeout,
            self.page.evaluate_expression(params),
        )
        .await?;
        Ok(result.value().cloned().unwrap_or(Value::Null))
    }

    async fn click(&self, selector: &str, timeout: Duration) -> Result<bool> {
        let click = async {
            let found = self.page.find_elements(selector).await?;
            match found.first() {
                Some(element) => {
                    element.click().await?;
                    Ok::<bool, CdpError>(true)
                }
                None => Ok(false),
            }
        };
        bounded("click", timeout, click).await
    }

    async fn wheel(&self, delta_y: f64) -> Result<()> {
        let (x, y) = self.center;
        let params = DispatchMouseEventParams::builder()
            .r#type(DispatchMouseEventType::MouseWheel)
            .x(x)
            .y(y)
            .delta_x(0.0)
            .delta_y(delta_y)
            .build()
            .map_err(PagefeedError::Browser)?;

        bounded("mouse wheel", self.operation_timeout, self.page.execute(params)).await?;
        Ok(())
    }

    async fn press_key(&self, key: &str) -> Result<()> {
        let press = async {
            self.page.find_element("body").await?.press_key(key).await?;
            Ok::<(), CdpError>(())
        };
        bounded("key press", self.operation_timeout, press).await
    }

    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<()> {
        let poll = async {
            loop {
                match self.page.find_elements(selector).await {
                    Ok(found) if !found.is_empty() => return Ok::<(), CdpError>(()),
                    Ok(_) => {}
                    Err(e) => debug!(selector = %selector, error = %e, "Selector query failed"),
                }
                tokio::time::sleep(SELECTOR_POLL).await;
            }
        };
        bounded("wait for selector", timeout, poll).await
    }

    async fn screenshot(&self, path: &Path, full_page: bool) -> Result<()> {
        let params = ScreenshotParams::builder().full_page(full_page).build();
        let png = bounded("screenshot", self.operation_timeout, self.page.screenshot(params)).await?;
        tokio::fs::write(path, &png).await?;
        Ok(())
    }

    async fn html(&self) -> Result<String> {
        bounded("page content", self.operation_timeout, self.page.content()).await
    }

    async fn close(&self) -> Result<()> {
        bounded("close page", self.operation_timeout, self.page.clone().close()).await
    }
}

/// A launched browser, its CDP event task and its throwaway profile.
struct BrowserSession {
    browser: Browser,
    events: JoinHandle<()>,
    /// Removed when the session is dropped, after the browser has exited
    profile: TempDir,
}

impl BrowserSession {
    async fn shutdown(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!(error = %e, "Failed to close browser");
        }
        if let Err(e) = self.browser.wait().await {
            debug!(error = %e, "Browser process did not exit cleanly");
        }
        self.events.abort();
        debug!(profile = %self.profile.path().display(), "Removing browser profile");
    }
}

/// Fresh user data directory for one browser launch.
fn new_profile_dir() -> Result<TempDir> {
    Ok(tempfile::Builder::new().prefix("pagefeed-chrome-").tempdir()?)
}

/// Chrome-based scraper using chromiumoxide.
///
/// Each target gets its own browser process and profile directory, so
/// concurrent targets share no cookies, storage or page state.
pub struct ChromeScraper {
    config: ScraperConfig,
    videos: Arc<dyn VideoResolver>,
    debug_root: Option<PathBuf>,
}

impl ChromeScraper {
    pub fn new(config: ScraperConfig, videos: Arc<dyn VideoResolver>) -> Self {
        Self {
            config,
            videos,
            debug_root: None,
        }
    }

    /// Write debug artifacts under `{root}/{target filename}/`.
    pub fn with_debug_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.debug_root = Some(root.into());
        self
    }

    async fn launch(&self) -> Result<BrowserSession> {
        let profile = new_profile_dir()?;
        let mut builder = BrowserConfig::builder()
            .user_data_dir(profile.path())
            .window_size(self.config.viewport_width, self.config.viewport_height)
            .request_timeout(self.config.request_timeout());

        for arg in &self.config.launch_args {
            builder = builder.arg(arg.as_str());
        }

        if !self.config.headless {
            builder = builder.with_head();
        }

        let browser_config = builder
            .build()
            .map_err(|e| PagefeedError::Browser(format!("Failed to build browser config: {}", e)))?;

        let (browser, mut handler) = Browser::launch(browser_config).await.map_err(|e| {
            PagefeedError::Browser(format!(
                "Failed to launch browser: {}. Is Chrome or Chromium installed and in PATH?",
                e
            ))
        })?;

        let events = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler error: {}", e);
                }
            }
        });

        Ok(BrowserSession {
            browser,
            events,
            profile,
        })
    }

    async fn open_page(&self, browser: &Browser) -> Result<ChromePage> {
        let page = bounded(
            "new page",
            self.config.operation_timeout(),
            browser.new_page("about:blank"),
        )
        .await?;
        let page = ChromePage::new(page, &self.config);
        page.configure(&self.config).await?;
        Ok(page)
    }

    async fn scrape_with(&self, browser: &Browser, target: &PageTarget) -> Result<ScrapeReport> {
        let page = self.open_page(browser).await?;
        let debug = match self.debug_root {
            Some(ref root) => DebugArtifacts::new(target.debug_dir(root)),
            None => DebugArtifacts::disabled(),
        };

        let result = PageScraper::new(&self.config, self.videos.as_ref())
            .run(&page, target, &debug)
            .await;

        if let Err(e) = page.close().await {
            warn!(error = %e, "Failed to close page");
        }
        result
    }
}

#[async_trait]
impl Scraper for ChromeScraper {
    async fn scrape(&self, target: &PageTarget) -> Result<ScrapeReport> {
        let session = self.launch().await?;
        info!(
            page = %target.name,
            profile = %session.profile.path().display(),
            "Browser launched"
        );

        let result = self.scrape_with(&session.browser, target).await;
        session.shutdown().await;

        result
    }
}
