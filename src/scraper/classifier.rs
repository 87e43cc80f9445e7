//! Post-vs-comment classification and body text cleaning.

use tracing::warn;

use crate::scraper::extractor::BlockSnapshot;
use crate::scraper::ScraperConfig;

/// Outcome of classifying one content block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// A reply or comment sharing the post markup
    Comment,
    /// Nothing usable survived cleaning
    TooShort,
    Post { body: String },
}

pub struct PostClassifier {
    config: ScraperConfig,
}

impl PostClassifier {
    pub fn new(config: ScraperConfig) -> Self {
        Self { config }
    }

    pub fn classify(&self, snapshot: &BlockSnapshot, page_name: &str) -> Classification {
        if self.is_comment(snapshot) {
            return Classification::Comment;
        }

        let body = self.extract_body(snapshot, page_name);
        if body.chars().count() < self.config.min_body_chars {
            Classification::TooShort
        } else {
            Classification::Post { body }
        }
    }

    pub fn is_comment(&self, snapshot: &BlockSnapshot) -> bool {
        if snapshot.has_reply || self.has_reply_button(snapshot) {
            return true;
        }
        let marker = self.config.comment_label_marker.to_lowercase();
        !marker.is_empty()
            && snapshot
                .aria_label
                .as_deref()
                .is_some_and(|label| label.to_lowercase().contains(&marker))
    }

    /// A button whose text contains the reply label, ignoring case.
    fn has_reply_button(&self, snapshot: &BlockSnapshot) -> bool {
        let label = self.config.reply_button_text.trim().to_lowercase();
        !label.is_empty()
            && snapshot
                .button_texts
                .iter()
                .any(|text| text.to_lowercase().contains(&label))
    }

    /// Cleaned body text: the first message selector match that is long
    /// enough, otherwise the trimmed block text.
    pub fn extract_body(&self, snapshot: &BlockSnapshot, page_name: &str) -> String {
        let raw = match self.message_text(snapshot) {
            Some(message) => message.to_string(),
            None => {
                if self
                    .config
                    .expansion_phrases
                    .iter()
                    .any(|p| snapshot.text.contains(p.as_str()))
                {
                    warn!(index = snapshot.index, "Expansion control still visible after expanding");
                }
                self.clean_block_text(&snapshot.text)
            }
        };

        let normalized = normalize_whitespace(&raw);
        strip_leading_name(&normalized, page_name)
    }

    fn message_text<'a>(&self, snapshot: &'a BlockSnapshot) -> Option<&'a str> {
        snapshot
            .messages
            .iter()
            .flatten()
            .map(String::as_str)
            .find(|text| text.trim().chars().count() > self.config.min_message_chars)
    }

    /// Cut the block text at the first footer marker and drop UI noise lines.
    pub fn clean_block_text(&self, text: &str) -> String {
        let content = truncate_at_footer(text, &self.config.footer_markers);

        content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .filter(|line| !self.config.noise_lines.iter().any(|noise| noise == line))
            .filter(|line| !is_timestamp_artifact(line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Everything before the earliest occurrence of any marker.
pub fn truncate_at_footer<'a>(text: &'a str, markers: &[String]) -> &'a str {
    let cutoff = markers
        .iter()
        .filter(|m| !m.is_empty())
        .filter_map(|marker| text.find(marker.as_str()))
        .min()
        .unwrap_or(text.len());
    &text[..cutoff]
}

/// Short lines with a digit are relative timestamps like "3h" or "2 d".
fn is_timestamp_artifact(line: &str) -> bool {
    line.chars().count() < 5 && line.chars().any(|c| c.is_ascii_digit())
}

pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Remove a case-insensitive leading occurrence of the page name.
pub fn strip_leading_name(text: &str, page_name: &str) -> String {
    let name_len = page_name.chars().count();
    if name_len == 0 {
        return text.to_string();
    }

    let head: String = text.chars().take(name_len).collect();
    if head.to_lowercase() == page_name.to_lowercase() {
        text.chars().skip(name_len).collect::<String>().trim().to_string()
    } else {
        text.to_string()
    }
}
