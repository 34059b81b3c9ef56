//! Ingestion of pages and block trees from the document API.
//!
//! This crate provides:
//! - [`convert_block`]: maps one API block record onto [`blockscribe_shared::Block`]
//! - [`Crawler`]: sequential, cancellable reader with:
//!   - [`Crawler::fetch_block_tree`]: recursive, paginated block tree retrieval
//!   - [`Crawler::resolve_page`]: page record + block tree → [`blockscribe_shared::Page`]
//!   - [`Crawler::query_database`]: time-filtered database query stream
//!   - [`Crawler::crawl_pages`]: depth-limited walk over child-page links
//!
//! Streams hand pages to a consumer callback one at a time; the callback
//! returns [`std::ops::ControlFlow::Break`] to stop all further fetching.

mod convert;
mod engine;
mod graph;
mod page;
mod query;
mod tree;

#[cfg(test)]
mod fake;

pub use convert::convert_block;
pub use engine::{Crawler, StreamSummary};
pub use graph::{ChildPageScan, CrawlOptions};
