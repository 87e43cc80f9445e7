use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::app::{PagefeedError, Result};

/// A monitored page and the file stem used for its cache and feed outputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageTarget {
    pub name: String,
    pub url: String,
    pub filename: String,
}

impl PageTarget {
    pub fn new(name: impl Into<String>, url: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            filename: filename.into(),
        }
    }

    /// Create a target whose file stem is derived from the display name.
    pub fn from_name(name: impl Into<String>, url: impl Into<String>) -> Self {
        let name = name.into();
        let filename = slugify(&name);
        Self::new(name, url, filename)
    }

    pub fn cache_path(&self, cache_dir: &Path) -> PathBuf {
        cache_dir.join(format!("{}_cache.json", self.filename))
    }

    pub fn feed_path(&self, feeds_dir: &Path) -> PathBuf {
        feeds_dir.join(format!("{}.xml", self.filename))
    }

    pub fn debug_dir(&self, debug_root: &Path) -> PathBuf {
        debug_root.join(&self.filename)
    }

    /// Load the list of targets from an accounts file: a JSON array of
    /// `{"name", "url", "filename"}` objects.
    pub fn load_all(path: &Path) -> Result<Vec<PageTarget>> {
        let content = fs::read_to_string(path).map_err(|e| {
            PagefeedError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let targets: Vec<PageTarget> = serde_json::from_str(&content).map_err(|e| {
            PagefeedError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })?;

        for target in &targets {
            if target.filename.trim().is_empty() {
                return Err(PagefeedError::Config(format!(
                    "Target {} has an empty filename",
                    target.name
                )));
            }
            url::Url::parse(&target.url)?;
        }

        Ok(targets)
    }
}

fn slugify(name: &str) -> String {
    let slug: String = name
        .chars()
        .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    let slug = slug
        .split('_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_");

    if slug.is_empty() {
        "page".to_string()
    } else {
        slug
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_output_paths() {
        let target = PageTarget::new("News", "https://www.facebook.com/news", "news");
        assert_eq!(
            target.cache_path(Path::new("cache")),
            PathBuf::from("cache/news_cache.json")
        );
        assert_eq!(
            target.feed_path(Path::new("feeds")),
            PathBuf::from("feeds/news.xml")
        );
        assert_eq!(
            target.debug_dir(Path::new("debug")),
            PathBuf::from("debug/news")
        );
    }

    #[test]
    fn test_from_name_slugifies() {
        let target = PageTarget::from_name("City Council — Updates!", "https://example.com");
        assert_eq!(target.filename, "city_council_updates");
    }

    #[test]
    fn test_load_all_accounts_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"name": "News", "url": "https://www.facebook.com/news", "filename": "news"}},
                {{"name": "Club", "url": "https://www.facebook.com/club", "filename": "club"}}
            ]"#
        )
        .unwrap();

        let targets = PageTarget::load_all(file.path()).unwrap();
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[1].name, "Club");
    }

    #[test]
    fn test_load_all_rejects_bad_url() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"name": "News", "url": "not a url", "filename": "news"}}]"#
        )
        .unwrap();

        assert!(PageTarget::load_all(file.path()).is_err());
    }

    #[test]
    fn test_load_all_missing_file() {
        let err = PageTarget::load_all(Path::new("/nonexistent/accounts.json")).unwrap_err();
        assert!(matches!(err, PagefeedError::Config(_)));
    }
}
