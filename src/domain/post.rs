use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of media attached to a post. A post carries exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    #[default]
    None,
    Image,
    Video,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::None => "none",
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "none" => Ok(MediaKind::None),
            "image" => Ok(MediaKind::Image),
            "video" => Ok(MediaKind::Video),
            other => Err(format!("Unknown media kind: {}", other)),
        }
    }
}

/// One public post recovered from a page.
///
/// The serialized field names match the cache records written by earlier
/// versions of the scraper (`pubDate`, `image`, `video`, `media_type`), so old
/// caches still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub title: String,
    pub description: String,
    pub link: String,
    pub guid: String,
    #[serde(rename = "pubDate")]
    pub published_at: DateTime<Utc>,
    #[serde(rename = "media_type", with = "media_type_field", default)]
    pub media_kind: MediaKind,
    #[serde(rename = "image", default)]
    pub image_url: Option<String>,
    #[serde(rename = "video", default)]
    pub video_url: Option<String>,
}

impl Post {
    /// Build the preview title: the first `max_chars` characters of the body,
    /// followed by `...` when the body is longer.
    pub fn title_for(description: &str, max_chars: usize) -> String {
        if description.chars().count() > max_chars {
            let head: String = description.chars().take(max_chars).collect();
            format!("{}...", head)
        } else {
            description.to_string()
        }
    }

    /// Identifier used when no permalink could be resolved.
    ///
    /// Includes the generation time, so it is not stable across runs.
    pub fn synthesized_guid(page_url: &str, index: usize, generated_at: DateTime<Utc>) -> String {
        format!("{}#{}_{}", page_url, index, generated_at.timestamp())
    }

    /// Check the media invariants: `video` carries a video URL, `image` an
    /// image URL, and only `video` posts carry a video URL.
    pub fn media_is_consistent(&self) -> bool {
        match self.media_kind {
            MediaKind::Video => self.video_url.is_some(),
            MediaKind::Image => self.image_url.is_some() && self.video_url.is_none(),
            MediaKind::None => self.video_url.is_none() && self.image_url.is_none(),
        }
    }
}

mod media_type_field {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::MediaKind;

    pub fn serialize<S: Serializer>(kind: &MediaKind, serializer: S) -> Result<S::Ok, S::Error> {
        match kind {
            MediaKind::None => serializer.serialize_none(),
            other => serializer.serialize_some(other.as_str()),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<MediaKind, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw {
            Some(value) => value.parse().map_err(D::Error::custom),
            None => Ok(MediaKind::None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_post() -> Post {
        Post {
            title: "Hello".into(),
            description: "Hello world".into(),
            link: "https://www.facebook.com/page/posts/1".into(),
            guid: "https://www.facebook.com/page/posts/1".into(),
            published_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            media_kind: MediaKind::Image,
            image_url: Some("https://scontent.example/img.jpg".into()),
            video_url: None,
        }
    }

    #[test]
    fn test_title_short_body_unchanged() {
        assert_eq!(Post::title_for("Short body", 80), "Short body");
    }

    #[test]
    fn test_title_truncates_long_body() {
        let body = "a".repeat(81);
        let title = Post::title_for(&body, 80);
        assert_eq!(title, format!("{}...", "a".repeat(80)));
    }

    #[test]
    fn test_title_counts_characters_not_bytes() {
        let body = "আ".repeat(80);
        assert_eq!(Post::title_for(&body, 80), body);
    }

    #[test]
    fn test_synthesized_guid_format() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let guid = Post::synthesized_guid("https://www.facebook.com/page", 4, at);
        assert_eq!(guid, "https://www.facebook.com/page#4_1704067200");
    }

    #[test]
    fn test_media_consistency() {
        let mut post = sample_post();
        assert!(post.media_is_consistent());

        post.media_kind = MediaKind::Video;
        assert!(!post.media_is_consistent());

        post.video_url = Some("https://www.facebook.com/watch/?v=1".into());
        assert!(post.media_is_consistent());
    }

    #[test]
    fn test_serializes_cache_field_names() {
        let value = serde_json::to_value(sample_post()).unwrap();
        assert_eq!(value["media_type"], "image");
        assert_eq!(value["image"], "https://scontent.example/img.jpg");
        assert!(value["video"].is_null());
        assert_eq!(value["pubDate"], "2024-03-01T12:00:00Z");
    }

    #[test]
    fn test_none_media_serializes_as_null() {
        let mut post = sample_post();
        post.media_kind = MediaKind::None;
        post.image_url = None;
        let value = serde_json::to_value(post).unwrap();
        assert!(value["media_type"].is_null());
    }

    #[test]
    fn test_deserializes_legacy_cache_record() {
        let raw = r#"{
            "title": "Hi there",
            "description": "Hi there friends",
            "link": "https://www.facebook.com/page",
            "guid": "https://www.facebook.com/page#0_1700000000",
            "pubDate": "2023-11-14T22:13:20.123456+00:00",
            "image": null,
            "video": null,
            "media_type": null
        }"#;
        let post: Post = serde_json::from_str(raw).unwrap();
        assert_eq!(post.media_kind, MediaKind::None);
        assert_eq!(post.published_at.timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_media_kind_from_str() {
        assert_eq!("VIDEO".parse::<MediaKind>().unwrap(), MediaKind::Video);
        assert_eq!("none".parse::<MediaKind>().unwrap(), MediaKind::None);
        assert!("gif".parse::<MediaKind>().is_err());
    }
}
