use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::app::{PagefeedError, Result};
use crate::scraper::page::PageSession;
use crate::scraper::{DismissControl, ScraperConfig};

/// Number of elements matching `opts.selector`.
pub const COUNT_BLOCKS_JS: &str = r#"(opts) => document.querySelectorAll(opts.selector).length"#;

pub const SCROLL_HEIGHT_JS: &str =
    r#"() => (document.body ? document.body.scrollHeight : document.documentElement.scrollHeight)"#;

pub const SCROLL_TO_BOTTOM_JS: &str = r#"() => {
    window.scrollTo(0, document.body ? document.body.scrollHeight : 0);
    return true;
}"#;

/// Click the first `opts.selector` element whose text contains `opts.text`.
pub const CLICK_MATCHING_JS: &str = r#"(opts) => {
    const nodes = Array.from(document.querySelectorAll(opts.selector));
    const target = nodes.find(el => (el.innerText || el.textContent || '').includes(opts.text));
    if (!target) return false;
    target.click();
    return true;
}"#;

/// Remove login-wall overlays and sticky sheets. Returns the removed count.
pub const SWEEP_OBSTRUCTIONS_JS: &str = r#"(opts) => {
    const queryAll = (selector) => {
        try { return Array.from(document.querySelectorAll(selector)); } catch (e) { return []; }
    };
    let removed = 0;
    for (const selector of opts.overlaySelectors) {
        queryAll(selector).forEach(el => {
            const text = el.innerText || '';
            if (opts.phrases.some(p => text.includes(p))) {
                el.remove();
                removed += 1;
            }
        });
    }
    for (const selector of opts.stickySelectors) {
        queryAll(selector).forEach(el => {
            el.remove();
            removed += 1;
        });
    }
    return removed;
}"#;

pub const UNLOCK_SCROLL_JS: &str = r#"() => {
    if (document.body) document.body.style.overflow = 'auto';
    document.documentElement.style.overflow = 'auto';
    return true;
}"#;

/// Press every "see more" control inside block `opts.index`.
pub const EXPAND_BLOCK_JS: &str = r#"(opts) => {
    const block = document.querySelectorAll(opts.blockSelector)[opts.index];
    if (!block) return false;
    const phrases = opts.phrases;
    const elements = Array.from(block.querySelectorAll(
        'div[role="button"], span[role="button"], a[role="button"], div, span, a'));
    let clicked = false;
    elements.forEach(el => {
        if (el.children.length > 3) return;
        const text = (el.innerText || el.textContent || '').trim();
        if (phrases.includes(text) || (text.includes('...') && phrases.some(p => text.includes(p)))) {
            ['mousedown', 'mouseup', 'click'].forEach(type => {
                el.dispatchEvent(new MouseEvent(type, {
                    view: window, bubbles: true, cancelable: true, buttons: 1
                }));
            });
            clicked = true;
        }
    });
    return clicked;
}"#;

/// Read everything the extraction heuristics need from block `opts.index`.
pub const SNAPSHOT_BLOCK_JS: &str = r#"(opts) => {
    const block = document.querySelectorAll(opts.blockSelector)[opts.index];
    if (!block) return null;
    const query = (root, selector) => {
        try { return root.querySelector(selector); } catch (e) { return null; }
    };
    const queryAll = (root, selector) => {
        try { return Array.from(root.querySelectorAll(selector)); } catch (e) { return []; }
    };
    const srcOf = (el) => (el ? el.getAttribute('src') : null);
    const hasReply = opts.replySelectors.some(s => query(block, s) !== null);
    const video = query(block, 'video');
    const videoContainer = query(block, 'div[data-video-id]');
    return {
        index: opts.index,
        ariaLabel: block.getAttribute('aria-label'),
        hasReply: hasReply,
        buttonTexts: queryAll(block, 'div[role="button"]')
            .map(el => (el.innerText || '').trim())
            .filter(text => text.length > 0),
        text: block.innerText || '',
        messages: opts.messageSelectors.map(s => {
            const el = query(block, s);
            return el ? (el.innerText || '') : null;
        }),
        links: queryAll(block, 'a[href]').map(a => a.getAttribute('href')),
        videoLinks: opts.videoLinkSelectors.flatMap(s => queryAll(block, s).map(a => a.href)),
        video: video ? { src: video.getAttribute('src'), poster: video.getAttribute('poster') } : null,
        dataVideoId: videoContainer ? videoContainer.getAttribute('data-video-id') : null,
        thumbnails: opts.thumbnailSelectors.map(s => srcOf(query(block, s))),
        imageCandidates: opts.imageSelectors.map(s => srcOf(query(block, s))),
        images: queryAll(block, 'img').map(img => ({
            src: img.getAttribute('src'),
            width: img.getAttribute('width'),
            height: img.getAttribute('height'),
            inSvg: !!img.closest('svg'),
        })),
    };
}"#;

/// What the page reported about one content block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BlockSnapshot {
    pub index: usize,
    pub aria_label: Option<String>,
    /// A reply selector matched inside the block
    pub has_reply: bool,
    /// Trimmed text of every button in the block
    pub button_texts: Vec<String>,
    /// Rendered text of the whole block
    pub text: String,
    /// Text of the first match for each message selector, in selector order
    pub messages: Vec<Option<String>>,
    /// Raw `href` attributes of every link
    pub links: Vec<String>,
    /// Resolved URLs of links matching the video link selectors
    pub video_links: Vec<String>,
    pub video: Option<VideoElement>,
    pub data_video_id: Option<String>,
    /// Source of the first match for each thumbnail selector
    pub thumbnails: Vec<Option<String>>,
    /// Source of the first match for each image selector
    pub image_candidates: Vec<Option<String>>,
    pub images: Vec<ImageElement>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoElement {
    pub src: Option<String>,
    pub poster: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageElement {
    pub src: Option<String>,
    pub width: Option<String>,
    pub height: Option<String>,
    pub in_svg: bool,
}

impl BlockSnapshot {
    /// A block with only rendered text, as seen when no known markup matched.
    pub fn from_text(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
            ..Default::default()
        }
    }
}

/// Builds the arguments for the in-page scripts from the configured
/// strategy lists and runs them against a page.
#[derive(Debug, Clone)]
pub struct ContentExtractor {
    config: ScraperConfig,
}

impl ContentExtractor {
    pub fn new(config: ScraperConfig) -> Self {
        Self { config }
    }

    pub fn count_args(&self) -> Value {
        json!({ "selector": self.config.block_selector })
    }

    pub fn click_matching_args(&self, control: &DismissControl) -> Value {
        json!({
            "selector": control.selector,
            "text": control.text.clone().unwrap_or_default(),
        })
    }

    pub fn sweep_args(&self) -> Value {
        json!({
            "overlaySelectors": self.config.overlay_selectors,
            "phrases": self.config.login_wall_phrases,
            "stickySelectors": self.config.sticky_selectors,
        })
    }

    pub fn expansion_args(&self, index: usize) -> Value {
        json!({
            "blockSelector": self.config.block_selector,
            "index": index,
            "phrases": self.config.expansion_phrases,
        })
    }

    pub fn snapshot_args(&self, index: usize) -> Value {
        json!({
            "blockSelector": self.config.block_selector,
            "index": index,
            "replySelectors": self.config.reply_selectors,
            "messageSelectors": self.config.message_selectors,
            "videoLinkSelectors": self.config.video_link_selectors,
            "thumbnailSelectors": self.config.thumbnail_selectors,
            "imageSelectors": self.config.image_selectors,
        })
    }

    pub async fn count_blocks(&self, page: &dyn PageSession) -> Result<usize> {
        let value = page.call_function(COUNT_BLOCKS_JS, self.count_args()).await?;
        value
            .as_u64()
            .map(|n| n as usize)
            .ok_or_else(|| PagefeedError::Script(format!("Unexpected block count: {}", value)))
    }

    pub async fn scroll_height(&self, page: &dyn PageSession) -> Result<u64> {
        let value = page.call_function(SCROLL_HEIGHT_JS, Value::Null).await?;
        value
            .as_f64()
            .map(|h| h.max(0.0) as u64)
            .ok_or_else(|| PagefeedError::Script(format!("Unexpected scroll height: {}", value)))
    }

    pub async fn scroll_to_bottom(&self, page: &dyn PageSession) -> Result<()> {
        page.call_function(SCROLL_TO_BOTTOM_JS, Value::Null).await?;
        Ok(())
    }

    /// Trigger caption expansion inside a block. Returns whether a control was pressed.
    pub async fn expand(&self, page: &dyn PageSession, index: usize) -> Result<bool> {
        let value = page
            .call_function(EXPAND_BLOCK_JS, self.expansion_args(index))
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    /// Snapshot a block. `Ok(None)` when the block vanished from the DOM.
    pub async fn snapshot(&self, page: &dyn PageSession, index: usize) -> Result<Option<BlockSnapshot>> {
        let value = page
            .call_function(SNAPSHOT_BLOCK_JS, self.snapshot_args(index))
            .await?;
        if value.is_null() {
            return Ok(None);
        }
        let snapshot: BlockSnapshot = serde_json::from_value(value)?;
        Ok(Some(snapshot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_args_carry_strategy_lists() {
        let extractor = ContentExtractor::new(ScraperConfig::default());
        let args = extractor.snapshot_args(3);

        assert_eq!(args["index"], 3);
        assert_eq!(args["blockSelector"], "div[role=\"article\"]");
        assert_eq!(args["replySelectors"][0], "div[aria-label=\"Reply\"]");
        assert_eq!(args["messageSelectors"].as_array().unwrap().len(), 5);
        assert_eq!(
            args["messageSelectors"][0],
            "div[data-ad-preview=\"message\"]"
        );
    }

    #[test]
    fn test_expansion_args_include_localized_phrases() {
        let extractor = ContentExtractor::new(ScraperConfig::default());
        let args = extractor.expansion_args(0);
        let phrases: Vec<&str> = args["phrases"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|p| p.as_str())
            .collect();
        assert!(phrases.contains(&"See more"));
        assert!(phrases.contains(&"আরও দেখুন"));
    }

    #[test]
    fn test_click_matching_args_without_text() {
        let extractor = ContentExtractor::new(ScraperConfig::default());
        let args = extractor.click_matching_args(&DismissControl::selector("div.x"));
        assert_eq!(args["selector"], "div.x");
        assert_eq!(args["text"], "");
    }

    #[test]
    fn test_snapshot_deserializes_page_output() {
        let raw = json!({
            "index": 2,
            "ariaLabel": null,
            "hasReply": false,
            "buttonTexts": ["Like", "Share"],
            "text": "Page name\nHello there everyone\n3h",
            "messages": [null, "Hello there everyone", null, null, null],
            "links": ["/page/posts/123?__cft__=x"],
            "videoLinks": [],
            "video": null,
            "dataVideoId": null,
            "thumbnails": [null],
            "imageCandidates": [null, null],
            "images": [{"src": "https://scontent.xx/a.jpg", "width": "600", "height": "400", "inSvg": false}]
        });
        let snapshot: BlockSnapshot = serde_json::from_value(raw).unwrap();
        assert_eq!(snapshot.index, 2);
        assert_eq!(snapshot.messages[1].as_deref(), Some("Hello there everyone"));
        assert_eq!(snapshot.button_texts, vec!["Like", "Share"]);
        assert_eq!(snapshot.images[0].width.as_deref(), Some("600"));
        assert!(!snapshot.images[0].in_svg);
    }

    #[test]
    fn test_snapshot_tolerates_missing_fields() {
        let snapshot: BlockSnapshot = serde_json::from_value(json!({ "text": "hi" })).unwrap();
        assert_eq!(snapshot.text, "hi");
        assert!(snapshot.links.is_empty());
        assert!(snapshot.video.is_none());
    }

    #[test]
    fn test_scripts_are_function_expressions() {
        for script in [
            COUNT_BLOCKS_JS,
            SCROLL_HEIGHT_JS,
            SCROLL_TO_BOTTOM_JS,
            CLICK_MATCHING_JS,
            SWEEP_OBSTRUCTIONS_JS,
            UNLOCK_SCROLL_JS,
            EXPAND_BLOCK_JS,
            SNAPSHOT_BLOCK_JS,
        ] {
            assert!(script.trim_start().starts_with('('), "{}", script);
            assert!(script.contains("=>"));
        }
    }
}
