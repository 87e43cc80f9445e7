pub mod post;
pub mod target;

pub use post::{MediaKind, Post};
pub use target::PageTarget;
