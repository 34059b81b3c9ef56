//! Shared types, error model, and configuration for Blockscribe.
//!
//! This crate is the foundation depended on by all other Blockscribe crates.
//! It provides:
//! - [`BlockscribeError`]: the unified error type
//! - Domain types ([`Page`], [`Block`], [`BlockContent`], [`PropertyValue`])
//! - Raw API records ([`PageRecord`], [`BlockRecord`], [`PaginatedList`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod records;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    ApiConfig, AppConfig, CrawlDefaults, config_dir, config_file_path, init_config, load_config,
    load_config_from, resolve_token,
};
pub use error::{BlockscribeError, Result};
pub use records::{BlockRecord, DatabaseRecord, PageRecord, PaginatedList};
pub use types::{
    Annotations, Block, BlockContent, BlockType, DatabaseMetadata, Page, PageMetadata,
    PropertyValue, RichText, normalize_properties, plain_text,
};
