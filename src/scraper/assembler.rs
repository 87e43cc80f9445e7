use chrono::{DateTime, Utc};
use url::Url;

use crate::domain::Post;
use crate::scraper::media::MediaResolution;
use crate::scraper::ScraperConfig;

/// Everything recovered from one accepted block.
#[derive(Debug, Clone)]
pub struct BlockExtraction {
    pub index: usize,
    pub body: String,
    pub permalink: Option<String>,
    pub media: MediaResolution,
    pub published_at: DateTime<Utc>,
}

/// Turns block extractions into [`Post`] records.
pub struct PostAssembler {
    config: ScraperConfig,
}

impl PostAssembler {
    pub fn new(config: ScraperConfig) -> Self {
        Self { config }
    }

    /// Find the post permalink among a block's raw link targets.
    ///
    /// The primary patterns are tried over all links before the fallback
    /// patterns. Relative links are resolved against the page URL; tracking
    /// query strings are dropped except on `permalink.php` links, which are
    /// identified by their query.
    pub fn resolve_permalink(&self, links: &[String], page_url: &str) -> Option<String> {
        let base = Url::parse(page_url).ok();

        [
            &self.config.permalink_patterns,
            &self.config.fallback_permalink_patterns,
        ]
        .into_iter()
        .find_map(|patterns| {
            links
                .iter()
                .filter(|href| patterns.iter().any(|p| href.contains(p.as_str())))
                .find_map(|href| normalize_link(href, base.as_ref()))
        })
    }

    /// Build the post record; the permalink doubles as the guid.
    pub fn assemble(&self, page_url: &str, block: BlockExtraction, generated_at: DateTime<Utc>) -> Post {
        let title = Post::title_for(&block.body, self.config.title_max_chars);
        let (link, guid) = match block.permalink {
            Some(permalink) => (permalink.clone(), permalink),
            None => (
                page_url.to_string(),
                Post::synthesized_guid(page_url, block.index, generated_at),
            ),
        };

        Post {
            title,
            description: block.body,
            link,
            guid,
            published_at: block.published_at,
            media_kind: block.media.kind,
            image_url: block.media.image_url,
            video_url: block.media.video_url,
        }
    }

    /// Fewer posts than the threshold warrants a debug capture.
    pub fn is_low_yield(&self, post_count: usize) -> bool {
        post_count < self.config.low_yield_threshold
    }
}

fn normalize_link(href: &str, base: Option<&Url>) -> Option<String> {
    let mut url = match base {
        Some(base) => base.join(href).ok()?,
        None => Url::parse(href).ok()?,
    };
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    if !url.path().contains("permalink.php") {
        url.set_query(None);
    }
    url.set_fragment(None);
    Some(url.to_string())
}
