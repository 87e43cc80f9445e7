#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use pagefeed::app::{PagefeedError, Result};
use pagefeed::scraper::extractor::{
    BlockSnapshot, CLICK_MATCHING_JS, COUNT_BLOCKS_JS, EXPAND_BLOCK_JS, SCROLL_HEIGHT_JS,
    SCROLL_TO_BOTTOM_JS, SNAPSHOT_BLOCK_JS, SWEEP_OBSTRUCTIONS_JS, UNLOCK_SCROLL_JS,
};
use pagefeed::scraper::PageSession;
use pagefeed::video::VideoResolver;

pub const PAGE_URL: &str = "https://www.facebook.com/bigclub";
pub const PAGE_NAME: &str = "Big Club";

/// How navigation behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Ok,
    Timeout,
    Crash,
}

/// A scripted page. Each in-page script is answered from canned data.
pub struct FakePage {
    pub navigation: Navigation,
    /// Heights returned by successive probes; the last one repeats
    heights: Mutex<VecDeque<u64>>,
    last_height: Mutex<u64>,
    /// Snapshot per block index; `None` makes the snapshot call fail
    pub blocks: Vec<Option<BlockSnapshot>>,
    pub blocks_appear: bool,
    pub fail_sweep: bool,
    pub fail_count: bool,
    /// Selectors accepted by `click`
    pub clickable: Vec<String>,
    calls: Mutex<Vec<String>>,
    pub screenshots: Mutex<Vec<PathBuf>>,
}

impl FakePage {
    pub fn new(blocks: Vec<BlockSnapshot>) -> Self {
        Self {
            navigation: Navigation::Ok,
            heights: Mutex::new(VecDeque::new()),
            last_height: Mutex::new(1000),
            blocks: blocks.into_iter().map(Some).collect(),
            blocks_appear: true,
            fail_sweep: false,
            fail_count: false,
            clickable: Vec::new(),
            calls: Mutex::new(Vec::new()),
            screenshots: Mutex::new(Vec::new()),
        }
    }

    pub fn with_heights(self, heights: &[u64]) -> Self {
        *self.heights.lock().unwrap() = heights.iter().copied().collect();
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count_calls(&self, name: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == name).count()
    }

    fn record(&self, name: &str) {
        self.calls.lock().unwrap().push(name.to_string());
    }

    fn next_height(&self) -> u64 {
        let mut last = self.last_height.lock().unwrap();
        if let Some(height) = self.heights.lock().unwrap().pop_front() {
            *last = height;
        }
        *last
    }
}

#[async_trait]
impl PageSession for FakePage {
    async fn goto(&self, url: &str, _timeout: Duration) -> Result<()> {
        self.record("goto");
        match self.navigation {
            Navigation::Ok => Ok(()),
            // What the browser adapter reports when its request deadline passes
            Navigation::Timeout => Err(PagefeedError::Timeout(format!(
                "navigation to {}: browser request timed out",
                url
            ))),
            Navigation::Crash => Err(PagefeedError::Browser("target crashed".into())),
        }
    }

    async fn call_function(&self, function: &str, args: Value) -> Result<Value> {
        if function == COUNT_BLOCKS_JS {
            self.record("count");
            if self.fail_count {
                return Err(PagefeedError::Browser("execution context destroyed".into()));
            }
            Ok(json!(self.blocks.len()))
        } else if function == SCROLL_HEIGHT_JS {
            self.record("height");
            Ok(json!(self.next_height()))
        } else if function == SCROLL_TO_BOTTOM_JS {
            self.record("scroll");
            Ok(json!(true))
        } else if function == CLICK_MATCHING_JS {
            self.record("click text");
            Ok(json!(false))
        } else if function == SWEEP_OBSTRUCTIONS_JS {
            self.record("sweep");
            if self.fail_sweep {
                Err(PagefeedError::Script("sweep failed".into()))
            } else {
                Ok(json!(0))
            }
        } else if function == UNLOCK_SCROLL_JS {
            self.record("unlock");
            Ok(json!(true))
        } else if function == EXPAND_BLOCK_JS {
            self.record("expand");
            Ok(json!(false))
        } else if function == SNAPSHOT_BLOCK_JS {
            self.record("snapshot");
            let index = args["index"].as_u64().unwrap_or(0) as usize;
            match self.blocks.get(index) {
                Some(Some(block)) => Ok(serde_json::to_value(block)?),
                Some(None) => Err(PagefeedError::Script("block detached".into())),
                None => Ok(Value::Null),
            }
        } else {
            Err(PagefeedError::Script("unknown script".into()))
        }
    }

    async fn click(&self, selector: &str, _timeout: Duration) -> Result<bool> {
        self.record("click");
        Ok(self.clickable.iter().any(|s| s == selector))
    }

    async fn wheel(&self, _delta_y: f64) -> Result<()> {
        self.record("wheel");
        Ok(())
    }

    async fn press_key(&self, _key: &str) -> Result<()> {
        self.record("key");
        Ok(())
    }

    async fn wait_for_selector(&self, selector: &str, _timeout: Duration) -> Result<()> {
        self.record("wait");
        if self.blocks_appear {
            Ok(())
        } else {
            Err(PagefeedError::Timeout(format!("waiting for {}", selector)))
        }
    }

    async fn screenshot(&self, path: &Path, _full_page: bool) -> Result<()> {
        self.record("screenshot");
        std::fs::write(path, b"png")?;
        self.screenshots.lock().unwrap().push(path.to_path_buf());
        Ok(())
    }

    async fn html(&self) -> Result<String> {
        self.record("html");
        Ok("<html><body></body></html>".to_string())
    }

    async fn close(&self) -> Result<()> {
        self.record("close");
        Ok(())
    }
}

/// Resolver answering from a fixed table of watch URLs.
#[derive(Default)]
pub struct TableResolver {
    pub urls: HashMap<String, Vec<String>>,
}

impl TableResolver {
    pub fn with(mut self, watch_url: &str, direct: &str) -> Self {
        self.urls.insert(watch_url.to_string(), vec![direct.to_string()]);
        self
    }
}

#[async_trait]
impl VideoResolver for TableResolver {
    async fn resolve(&self, watch_url: &str) -> Result<Vec<String>> {
        self.urls
            .get(watch_url)
            .cloned()
            .ok_or_else(|| PagefeedError::VideoResolve("not in table".into()))
    }
}

pub fn text_block(index: usize, text: &str) -> BlockSnapshot {
    BlockSnapshot::from_text(index, text)
}

pub fn post_block(index: usize, body: &str, post_id: &str) -> BlockSnapshot {
    let mut block = BlockSnapshot::from_text(index, format!("{}\n3h\n{}\nLike\nComment\nShare", PAGE_NAME, body));
    block.links = vec![
        "/bigclub".to_string(),
        format!("/bigclub/posts/{}?__cft__[0]=abc", post_id),
    ];
    block
}

pub fn comment_block(index: usize) -> BlockSnapshot {
    let mut block = BlockSnapshot::from_text(index, "Jane Doe\nGreat news, see you there!\nReply");
    block.button_texts = vec!["Like".to_string(), "Reply · 2".to_string()];
    block
}
