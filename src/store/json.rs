use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::app::Result;
use crate::domain::{PageTarget, Post};
use crate::store::Store;

/// One pretty-printed JSON array per target at `{cache_dir}/{filename}_cache.json`.
pub struct JsonStore {
    cache_dir: PathBuf,
}

impl JsonStore {
    pub fn new<P: AsRef<Path>>(cache_dir: P) -> Self {
        Self {
            cache_dir: cache_dir.as_ref().to_path_buf(),
        }
    }

    pub fn path_for(&self, target: &PageTarget) -> PathBuf {
        target.cache_path(&self.cache_dir)
    }
}

impl Store for JsonStore {
    fn save_posts(&self, target: &PageTarget, posts: &[Post]) -> Result<()> {
        fs::create_dir_all(&self.cache_dir)?;
        let path = self.path_for(target);
        let content = serde_json::to_string_pretty(posts)?;
        fs::write(&path, content)?;
        info!(path = %path.display(), posts = posts.len(), "Cache saved");
        Ok(())
    }

    fn load_posts(&self, target: &PageTarget) -> Result<Vec<Post>> {
        let path = self.path_for(target);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "No cache file");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let posts: Vec<Post> = serde_json::from_str(&content)?;
        info!(path = %path.display(), posts = posts.len(), "Loaded posts from cache");
        Ok(posts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MediaKind;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn setup() -> (TempDir, JsonStore, PageTarget) {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::new(dir.path().join("cache"));
        let target = PageTarget::new("Big Club", "https://www.facebook.com/bigclub", "bigclub");
        (dir, store, target)
    }

    fn sample_post() -> Post {
        Post {
            title: "Match day".into(),
            description: "Match day at the stadium".into(),
            link: "https://www.facebook.com/bigclub/posts/1".into(),
            guid: "https://www.facebook.com/bigclub/posts/1".into(),
            published_at: Utc.with_ymd_and_hms(2024, 6, 15, 9, 30, 0).unwrap(),
            media_kind: MediaKind::Video,
            image_url: Some("https://scontent.xx.fbcdn.net/poster.jpg".into()),
            video_url: Some("https://www.facebook.com/watch/?v=1".into()),
        }
    }

    #[test]
    fn test_save_and_load() {
        let (_dir, store, target) = setup();
        store.save_posts(&target, &[sample_post()]).unwrap();

        assert!(store.path_for(&target).ends_with("bigclub_cache.json"));
        let loaded = store.load_posts(&target).unwrap();
        assert_eq!(loaded, vec![sample_post()]);
    }

    #[test]
    fn test_missing_cache_is_empty() {
        let (_dir, store, target) = setup();
        assert!(store.load_posts(&target).unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_cache_is_error() {
        let (_dir, store, target) = setup();
        fs::create_dir_all(dir_of(&store)).unwrap();
        fs::write(store.path_for(&target), "not json").unwrap();
        assert!(store.load_posts(&target).is_err());
    }

    #[test]
    fn test_save_overwrites() {
        let (_dir, store, target) = setup();
        store.save_posts(&target, &[sample_post(), sample_post()]).unwrap();
        store.save_posts(&target, &[sample_post()]).unwrap();
        assert_eq!(store.load_posts(&target).unwrap().len(), 1);
    }

    #[test]
    fn test_loads_records_from_earlier_versions() {
        let (_dir, store, target) = setup();
        fs::create_dir_all(dir_of(&store)).unwrap();
        let legacy = r#"[
  {
    "title": "Road closed",
    "description": "Road closed until Friday",
    "link": "https://www.facebook.com/bigclub",
    "guid": "https://www.facebook.com/bigclub#0_1718445600",
    "pubDate": "2024-06-15T09:00:00.123456+00:00",
    "image": null,
    "video": null,
    "media_type": null
  }
]"#;
        fs::write(store.path_for(&target), legacy).unwrap();

        let loaded = store.load_posts(&target).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].media_kind, MediaKind::None);
        assert_eq!(loaded[0].title, "Road closed");
    }

    fn dir_of(store: &JsonStore) -> &Path {
        &store.cache_dir
    }
}
