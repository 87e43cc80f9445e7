//! RSS 2.0 feed generation.
//!
//! One feed per page target. Items are sorted newest first and carry their
//! media twice: as an `<enclosure>` for feed readers that download
//! attachments, and as HTML appended to the description for readers that
//! only render the description.

use std::path::Path;

use chrono::{DateTime, Utc};
use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};
use serde::{Deserialize, Serialize};
use tracing::info;
use url::Url;

use crate::app::Result;
use crate::domain::{MediaKind, Post};

pub const MIME_MP4: &str = "video/mp4";
pub const MIME_HLS: &str = "application/x-mpegURL";
pub const MIME_JPEG: &str = "image/jpeg";

/// Channel-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Channel language tag
    pub language: String,

    /// Generator identity
    pub generator: String,

    /// Channel description, `{name}` is replaced by the page name
    pub description_template: String,

    /// Hosts whose video URLs are permalinks rather than playable media.
    /// Subdomains match too.
    pub permalink_hosts: Vec<String>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            generator: "pagefeed".to_string(),
            description_template: "Unofficial RSS feed for {name}".to_string(),
            permalink_hosts: vec!["facebook.com".to_string()],
        }
    }
}

/// An `<enclosure>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enclosure {
    pub url: String,
    pub mime: &'static str,
}

/// Media representation of one entry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EntryMedia {
    pub enclosure: Option<Enclosure>,
    /// HTML appended to the escaped body
    pub markup: String,
}

pub struct FeedEmitter {
    config: FeedConfig,
}

impl FeedEmitter {
    pub fn new(config: FeedConfig) -> Self {
        Self { config }
    }

    /// Render the feed document for one page.
    pub fn render(&self, posts: &[Post], page_name: &str, page_url: &str, now: DateTime<Utc>) -> String {
        let mut sorted: Vec<&Post> = posts.iter().collect();
        sorted.sort_by(|a, b| b.published_at.cmp(&a.published_at));

        let items = sorted
            .iter()
            .map(|post| self.render_item(post))
            .collect::<Vec<_>>()
            .join("\n");

        let description = self.config.description_template.replace("{name}", page_name);
        let items = if items.is_empty() {
            String::new()
        } else {
            format!("{}\n", items)
        };

        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:atom="http://www.w3.org/2005/Atom">
  <channel>
    <title>{title}</title>
    <link>{link}</link>
    <atom:link href="{self_link}" rel="self" type="application/rss+xml"/>
    <description>{description}</description>
    <language>{language}</language>
    <generator>{generator}</generator>
    <lastBuildDate>{build_date}</lastBuildDate>
{items}  </channel>
</rss>
"#,
            title = text(page_name),
            link = text(page_url),
            self_link = attr(page_url),
            description = text(&description),
            language = text(&self.config.language),
            generator = text(&self.config.generator),
            build_date = now.to_rfc2822(),
        )
    }

    fn render_item(&self, post: &Post) -> String {
        let media = self.entry_media(post);
        let description = format!("{}{}", text(&post.description), media.markup);
        let enclosure = media
            .enclosure
            .map(|e| {
                format!(
                    "\n      <enclosure url=\"{}\" length=\"0\" type=\"{}\"/>",
                    attr(&e.url),
                    e.mime
                )
            })
            .unwrap_or_default();

        format!(
            r#"    <item>
      <title>{title}</title>
      <link>{link}</link>
      <description>{description}</description>
      <guid isPermaLink="false">{guid}</guid>
      <pubDate>{pub_date}</pubDate>{enclosure}
    </item>"#,
            title = text(&post.title),
            link = text(&post.link),
            description = text(&description),
            guid = text(&post.guid),
            pub_date = post.published_at.to_rfc2822(),
        )
    }

    /// Enclosure and description markup for a post's media.
    pub fn entry_media(&self, post: &Post) -> EntryMedia {
        match (post.media_kind, post.video_url.as_deref(), post.image_url.as_deref()) {
            (MediaKind::Video, Some(video), poster) if self.is_permalink(video) => {
                let mut markup = format!(
                    r#"<br/><br/><a href="{}">Watch video</a>"#,
                    attr(video)
                );
                if let Some(poster) = poster {
                    markup.push_str(&format!(
                        r#"<br/><br/><a href="{}"><img src="{}" style="max-width:100%" alt="Video thumbnail"/></a>"#,
                        attr(video),
                        attr(poster)
                    ));
                }
                EntryMedia {
                    enclosure: poster.map(|p| Enclosure {
                        url: p.to_string(),
                        mime: MIME_JPEG,
                    }),
                    markup,
                }
            }
            (MediaKind::Video, Some(video), poster) => {
                let mime = video_mime(video);
                let poster_attr = poster
                    .map(|p| format!(r#" poster="{}""#, attr(p)))
                    .unwrap_or_default();
                EntryMedia {
                    enclosure: Some(Enclosure {
                        url: video.to_string(),
                        mime,
                    }),
                    markup: format!(
                        r#"<br/><br/><video controls width="100%"{}><source src="{}" type="{}">Your browser does not support the video tag.</video>"#,
                        poster_attr,
                        attr(video),
                        mime
                    ),
                }
            }
            (MediaKind::Image, _, Some(image)) => EntryMedia {
                enclosure: Some(Enclosure {
                    url: image.to_string(),
                    mime: MIME_JPEG,
                }),
                markup: format!(r#"<br/><br/><img src="{}" style="max-width:100%"/>"#, attr(image)),
            },
            _ => EntryMedia::default(),
        }
    }

    /// Whether a video URL points at a watch page on the network itself.
    pub fn is_permalink(&self, video_url: &str) -> bool {
        let Some(host) = Url::parse(video_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_lowercase))
        else {
            return false;
        };
        self.config
            .permalink_hosts
            .iter()
            .any(|h| host == *h || host.ends_with(&format!(".{}", h)))
    }

    /// Render and write the feed, creating parent directories.
    pub async fn write(&self, path: &Path, posts: &[Post], page_name: &str, page_url: &str) -> Result<()> {
        let document = self.render(posts, page_name, page_url, Utc::now());
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, document).await?;
        info!(path = %path.display(), entries = posts.len(), "Feed written");
        Ok(())
    }
}

/// MIME type for a direct video URL.
pub fn video_mime(url: &str) -> &'static str {
    if url.contains(".m3u8") {
        MIME_HLS
    } else {
        MIME_MP4
    }
}
