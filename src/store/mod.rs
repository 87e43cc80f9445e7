pub mod json;

use crate::app::Result;
use crate::domain::{PageTarget, Post};

pub use json::JsonStore;

/// Last successful extraction per target, used when a fresh scrape yields
/// nothing.
pub trait Store {
    /// Replace the cached posts of a target.
    fn save_posts(&self, target: &PageTarget, posts: &[Post]) -> Result<()>;

    /// Cached posts of a target; empty when nothing was cached yet.
    fn load_posts(&self, target: &PageTarget) -> Result<Vec<Post>>;
}
