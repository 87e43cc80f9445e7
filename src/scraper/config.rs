use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// A jittered delay. Sampled uniformly between `min_ms` and `max_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DelayRange {
    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    pub const fn fixed(ms: u64) -> Self {
        Self::new(ms, ms)
    }

    pub fn sample(&self) -> Duration {
        let (lo, hi) = if self.min_ms <= self.max_ms {
            (self.min_ms, self.max_ms)
        } else {
            (self.max_ms, self.min_ms)
        };
        if lo == hi {
            return Duration::from_millis(lo);
        }
        Duration::from_millis(rand::thread_rng().gen_range(lo..=hi))
    }
}

/// A control that dismisses a popup when clicked.
///
/// When `text` is set, the first element matching `selector` whose visible
/// text contains it is clicked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DismissControl {
    pub selector: String,
    #[serde(default)]
    pub text: Option<String>,
}

impl DismissControl {
    pub fn selector(selector: &str) -> Self {
        Self {
            selector: selector.to_string(),
            text: None,
        }
    }

    pub fn with_text(selector: &str, text: &str) -> Self {
        Self {
            selector: selector.to_string(),
            text: Some(text.to_string()),
        }
    }

    pub fn label(&self) -> String {
        match &self.text {
            Some(text) => format!("{} \"{}\"", self.selector, text),
            None => self.selector.clone(),
        }
    }
}

/// Configuration for the page scraper
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// Whether to run the browser in headless mode (default: true)
    pub headless: bool,

    /// Extra Chrome command-line arguments
    pub launch_args: Vec<String>,

    /// Browser window size
    pub viewport_width: u32,
    pub viewport_height: u32,

    /// User agent string to use
    pub user_agent: Option<String>,
    pub locale: String,
    pub timezone: String,
    pub latitude: f64,
    pub longitude: f64,

    /// Navigation timeout in seconds (default: 90)
    pub navigation_timeout_secs: u64,

    /// Budget for a single page operation in seconds (default: 30)
    pub operation_timeout_secs: u64,

    /// Wait after navigation before touching the page
    pub initial_settle: DelayRange,

    /// Maximum scroll iterations (default: 20)
    pub max_scroll_iterations: usize,

    /// Wheel bursts per scroll iteration (default: 5)
    pub wheel_bursts: usize,

    /// Pixels per wheel burst (default: 1200)
    pub wheel_delta: f64,

    pub wheel_pause: DelayRange,
    pub scroll_settle: DelayRange,

    /// Consecutive unchanged scroll heights that end loading (default: 3)
    pub stable_height_rounds: usize,

    /// Content block wait: attempts, per-attempt timeout, backoff base
    pub block_wait_attempts: usize,
    pub block_wait_timeout_secs: u64,
    pub block_wait_backoff_ms: u64,

    /// Timeout for each dismiss control click in milliseconds (default: 1000)
    pub dismiss_timeout_ms: u64,

    /// Maximum content blocks inspected (default: 25)
    pub max_blocks: usize,

    /// Pause after a caption expansion attempt
    pub expansion_pause: DelayRange,

    /// Selector for content blocks (posts and comments alike)
    pub block_selector: String,

    pub dismiss_controls: Vec<DismissControl>,
    pub overlay_selectors: Vec<String>,
    pub login_wall_phrases: Vec<String>,
    pub sticky_selectors: Vec<String>,

    /// Selectors for a reply affordance, which marks a block as a comment
    pub reply_selectors: Vec<String>,
    /// Button text (case-insensitive substring) that marks a block as a comment
    pub reply_button_text: String,
    /// Substring of the block's accessible label that marks a comment
    pub comment_label_marker: String,

    pub expansion_phrases: Vec<String>,

    /// Selectors isolating the message body, in priority order
    pub message_selectors: Vec<String>,
    /// A message selector match must be longer than this (default: 10)
    pub min_message_chars: usize,

    pub footer_markers: Vec<String>,
    pub noise_lines: Vec<String>,

    /// Bodies shorter than this are discarded (default: 5)
    pub min_body_chars: usize,
    pub title_max_chars: usize,

    /// Link substrings that identify a post permalink, in priority order
    pub permalink_patterns: Vec<String>,
    pub fallback_permalink_patterns: Vec<String>,

    /// Selectors for links that can carry a video identifier
    pub video_link_selectors: Vec<String>,
    /// Watch permalink, `{id}` is replaced by the video identifier
    pub watch_url_template: String,

    pub thumbnail_selectors: Vec<String>,
    /// Image strategies tried before scanning every image, in order
    pub image_selectors: Vec<String>,
    pub image_noise_patterns: Vec<String>,
    pub min_image_dimension: u32,

    /// Fewer posts than this is a low-yield run (default: 3)
    pub low_yield_threshold: usize,

    /// Script installed before any page script runs
    pub init_script: Option<String>,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            headless: true,
            launch_args: strings(&[
                "--no-sandbox",
                "--disable-setuid-sandbox",
                "--disable-dev-shm-usage",
                "--disable-accelerated-2d-canvas",
                "--no-first-run",
                "--no-zygote",
                "--disable-gpu",
                "--disable-blink-features=AutomationControlled",
                "--disable-notifications",
                "--disable-popup-blocking",
                "--disable-background-networking",
                "--disable-client-side-phishing-detection",
                "--disable-default-apps",
                "--disable-hang-monitor",
                "--disable-prompt-on-repost",
                "--disable-sync",
                "--no-default-browser-check",
                "--no-pings",
            ]),
            viewport_width: 1366,
            viewport_height: 768,
            user_agent: Some(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                    .to_string(),
            ),
            locale: "en-US".to_string(),
            timezone: "UTC".to_string(),
            latitude: 37.7749,
            longitude: -122.4194,
            navigation_timeout_secs: 90,
            operation_timeout_secs: 30,
            initial_settle: DelayRange::new(8000, 12000),
            max_scroll_iterations: 20,
            wheel_bursts: 5,
            wheel_delta: 1200.0,
            wheel_pause: DelayRange::new(2000, 3500),
            scroll_settle: DelayRange::new(5000, 8000),
            stable_height_rounds: 3,
            block_wait_attempts: 3,
            block_wait_timeout_secs: 15,
            block_wait_backoff_ms: 5000,
            dismiss_timeout_ms: 1000,
            max_blocks: 25,
            expansion_pause: DelayRange::fixed(2000),
            block_selector: "div[role=\"article\"]".to_string(),
            dismiss_controls: vec![
                DismissControl::selector("div[aria-label=\"Close\"]"),
                DismissControl::with_text("div[role=\"button\"]", "Not Now"),
                DismissControl::with_text("div[role=\"button\"]", "Decline"),
                DismissControl::selector("div[aria-label=\"Decline optional cookies\"]"),
                DismissControl::with_text("div[role=\"button\"]", "Allow all cookies"),
            ],
            overlay_selectors: strings(&[
                "div[role=\"dialog\"]",
                "div[role=\"banner\"]",
                "div[id^=\"mount_0_0_\"] > div > div > div > div > div[style*=\"position: fixed\"]",
            ]),
            login_wall_phrases: strings(&["Log In", "Join Facebook", "See more on Facebook"]),
            sticky_selectors: strings(&["div[data-testid=\"bottom_sheet\"]"]),
            reply_selectors: strings(&["div[aria-label=\"Reply\"]"]),
            reply_button_text: "Reply".to_string(),
            comment_label_marker: "comment".to_string(),
            expansion_phrases: strings(&["See more", "আরও দেখুন", "See More", "আরও", "আরও দেখুন..."]),
            message_selectors: strings(&[
                "div[data-ad-preview=\"message\"]",
                "div[data-ad-comet-preview=\"message\"]",
                "div[dir=\"auto\"].xdj266r",
                "div.x11i5rnm.xat24cr.x1mh8g0r.x1vvkbs.xtl81vo",
                "div[id^=\"mount_0_0_\"] div[dir=\"auto\"]",
            ]),
            min_message_chars: 10,
            footer_markers: strings(&[
                "All reactions:",
                "View more comments",
                "Write a comment",
                "Most relevant",
                "View all",
                "replies",
                "shares",
                "comments",
            ]),
            noise_lines: strings(&[
                "Like",
                "Comment",
                "Share",
                "Send",
                "Write a comment...",
                "Shares",
                "Comments",
                "Reply",
                "Follow",
                "Join",
            ]),
            min_body_chars: 5,
            title_max_chars: 80,
            permalink_patterns: strings(&["/posts/", "/photos/", "/videos/"]),
            fallback_permalink_patterns: strings(&["/posts/", "/permalink.php"]),
            video_link_selectors: strings(&[
                "a[href*=\"/videos/\"]",
                "a[href*=\"/watch/\"]",
                "a[href*=\"/reel/\"]",
            ]),
            watch_url_template: "https://www.facebook.com/watch/?v={id}".to_string(),
            thumbnail_selectors: strings(&["img[data-imgperflogname=\"feedImage\"]"]),
            image_selectors: strings(&[
                "img[data-imgperflogname=\"feedImage\"]",
                "a[href*=\"/photo\"] img, a[href*=\"/photos/\"] img",
            ]),
            image_noise_patterns: strings(&[
                "emoji.php",
                "rsrc.php",
                "static.xx",
                "static.fb",
                "p50x50",
                "s100x100",
                "s80x80",
                "s64x64",
                "s40x40",
                "s32x32",
                "cp0_dst-jpg_s",
                "_s80x80",
                "data:image/svg",
                "platform-lookaside",
                "safe_image.php",
            ]),
            min_image_dimension: 100,
            low_yield_threshold: 3,
            init_script: Some(
                "Object.defineProperty(navigator, 'webdriver', { get: () => undefined });"
                    .to_string(),
            ),
        }
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

impl ScraperConfig {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_secs)
    }

    /// Deadline for a single CDP request. Navigation is one request, so this
    /// is never shorter than the navigation budget.
    pub fn request_timeout(&self) -> Duration {
        self.navigation_timeout().max(self.operation_timeout())
    }

    pub fn dismiss_timeout(&self) -> Duration {
        Duration::from_millis(self.dismiss_timeout_ms)
    }

    pub fn block_wait_timeout(&self) -> Duration {
        Duration::from_secs(self.block_wait_timeout_secs)
    }

    /// Backoff before the next block wait attempt (1-based).
    pub fn block_wait_backoff(&self, attempt: usize) -> Duration {
        Duration::from_millis(self.block_wait_backoff_ms.saturating_mul(attempt as u64))
    }

    /// Watch permalink for a video identifier.
    pub fn watch_url(&self, video_id: &str) -> String {
        self.watch_url_template.replace("{id}", video_id)
    }

    /// Create a config with every delay removed, for replaying recorded pages
    pub fn immediate() -> Self {
        Self {
            initial_settle: DelayRange::fixed(0),
            wheel_pause: DelayRange::fixed(0),
            scroll_settle: DelayRange::fixed(0),
            expansion_pause: DelayRange::fixed(0),
            block_wait_backoff_ms: 0,
            ..Default::default()
        }
    }
}
