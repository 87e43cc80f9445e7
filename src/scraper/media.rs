use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info, warn};
use url::Url;

use crate::domain::MediaKind;
use crate::scraper::extractor::{BlockSnapshot, ImageElement};
use crate::scraper::ScraperConfig;
use crate::video::{pick_direct_url, VideoResolver};

/// Video identifier patterns, tried in order against each video link.
static VIDEO_ID_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"/videos/(\d+)").unwrap(),
        Regex::new(r"/reel/(\d+)").unwrap(),
        Regex::new(r"[?&]v=(\d+)").unwrap(),
    ]
});

/// Media found for one block.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MediaResolution {
    pub kind: MediaKind,
    pub image_url: Option<String>,
    pub video_url: Option<String>,
}

impl MediaResolution {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn image(url: String) -> Self {
        Self {
            kind: MediaKind::Image,
            image_url: Some(url),
            video_url: None,
        }
    }
}

/// Classifies a block as video, image or text-only and resolves its URLs.
pub struct MediaResolver<'a> {
    config: &'a ScraperConfig,
    videos: &'a dyn VideoResolver,
}

impl<'a> MediaResolver<'a> {
    pub fn new(config: &'a ScraperConfig, videos: &'a dyn VideoResolver) -> Self {
        Self { config, videos }
    }

    /// Video is checked before image; a block is never both.
    pub async fn resolve(&self, snapshot: &BlockSnapshot, permalink: Option<&str>) -> MediaResolution {
        if snapshot.video.is_some() {
            return self.resolve_video(snapshot, permalink).await;
        }

        match select_image(snapshot, self.config) {
            Some(url) => {
                debug!(index = snapshot.index, url = %url, "Image found");
                MediaResolution::image(url)
            }
            None => MediaResolution::none(),
        }
    }

    async fn resolve_video(&self, snapshot: &BlockSnapshot, permalink: Option<&str>) -> MediaResolution {
        let poster = self.poster(snapshot);

        let video_url = match extract_video_id(snapshot) {
            Some(id) => {
                info!(index = snapshot.index, video_id = %id, "Video identifier found");
                Some(self.resolve_id(&id).await)
            }
            None => {
                warn!(index = snapshot.index, "Video element without an identifier");
                direct_source(snapshot).or_else(|| permalink.map(String::from))
            }
        };

        match video_url {
            Some(url) => MediaResolution {
                kind: MediaKind::Video,
                image_url: poster,
                video_url: Some(url),
            },
            None => {
                warn!(index = snapshot.index, "No usable video URL, keeping the poster only");
                match poster {
                    Some(url) => MediaResolution::image(url),
                    None => MediaResolution::none(),
                }
            }
        }
    }

    /// Direct URL from the resolver, or the watch permalink when that fails.
    async fn resolve_id(&self, id: &str) -> String {
        let watch_url = self.config.watch_url(id);
        match self.videos.resolve(&watch_url).await {
            Ok(urls) => match pick_direct_url(&urls) {
                Some(url) => {
                    info!(video_id = %id, "Resolved direct video URL");
                    url
                }
                None => {
                    warn!(video_id = %id, "Resolver returned no HTTP URL, using watch permalink");
                    watch_url
                }
            },
            Err(e) => {
                warn!(video_id = %id, error = %e, "Video resolution failed, using watch permalink");
                watch_url
            }
        }
    }

    /// The video's own poster, else the first thumbnail strategy that matched.
    fn poster(&self, snapshot: &BlockSnapshot) -> Option<String> {
        snapshot
            .video
            .as_ref()
            .and_then(|v| v.poster.clone())
            .filter(|p| p.starts_with("http"))
            .or_else(|| {
                snapshot
                    .thumbnails
                    .iter()
                    .flatten()
                    .find(|src| src.starts_with("http"))
                    .cloned()
            })
    }
}

/// Video identifier from the block's video links, then `data-video-id`.
pub fn extract_video_id(snapshot: &BlockSnapshot) -> Option<String> {
    for link in &snapshot.video_links {
        for pattern in VIDEO_ID_PATTERNS.iter() {
            if let Some(id) = pattern.captures(link).and_then(|c| c.get(1)) {
                return Some(id.as_str().to_string());
            }
        }
    }

    snapshot
        .data_video_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(String::from)
}

/// The `<video src>` when it is a fetchable URL rather than a blob.
fn direct_source(snapshot: &BlockSnapshot) -> Option<String> {
    snapshot
        .video
        .as_ref()
        .and_then(|v| v.src.as_deref())
        .filter(|src| src.starts_with("http") && Url::parse(src).is_ok())
        .map(String::from)
}

/// First image accepted by the configured strategies, then by a scan of
/// every image in the block.
pub fn select_image(snapshot: &BlockSnapshot, config: &ScraperConfig) -> Option<String> {
    snapshot
        .image_candidates
        .iter()
        .flatten()
        .find(|src| src.starts_with("http"))
        .cloned()
        .or_else(|| {
            snapshot
                .images
                .iter()
                .find(|img| is_content_image(img, config))
                .and_then(|img| img.src.clone())
        })
}

/// Reject icons, avatars, emoji and tracking pixels.
pub fn is_content_image(image: &ImageElement, config: &ScraperConfig) -> bool {
    let Some(src) = image.src.as_deref() else {
        return false;
    };
    if !src.starts_with("http") {
        return false;
    }
    if config
        .image_noise_patterns
        .iter()
        .any(|pattern| src.contains(pattern.as_str()))
    {
        return false;
    }

    // Only reject on size when both dimensions are declared and readable.
    let width = image.width.as_deref().and_then(|w| w.trim().parse::<u32>().ok());
    let height = image.height.as_deref().and_then(|h| h.trim().parse::<u32>().ok());
    if let (Some(w), Some(h)) = (width, height) {
        if w < config.min_image_dimension || h < config.min_image_dimension {
            return false;
        }
    }

    // Profile pictures are drawn through an SVG mask.
    !image.in_svg
}
