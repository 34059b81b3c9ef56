//! Markdown rendering for resolved pages and block trees.
//!
//! Rendering is pure: no I/O, no errors. Unknown or malformed content
//! degrades to empty output.

mod frontmatter;
mod inline;
mod render;

pub use frontmatter::{render_frontmatter, render_page};
pub use inline::render_rich_text;
pub use render::render_blocks;
