//! Access to the hierarchical-document API.
//!
//! Everything that ingests content talks to the API through the
//! [`DocumentApi`] trait, never through HTTP details. [`HttpDocumentApi`] is
//! the production implementation; tests substitute in-memory fakes.

mod http;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Value, json};

use blockscribe_shared::{BlockRecord, DatabaseRecord, PageRecord, PaginatedList, Result};

pub use http::HttpDocumentApi;

/// Largest page size the API accepts for any listing.
pub const MAX_PAGE_SIZE: u32 = 100;

// ---------------------------------------------------------------------------
// QueryFilter
// ---------------------------------------------------------------------------

/// Server-side filter for collection queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryFilter {
    /// Rows whose `last_edited_time` is at or after the instant.
    EditedSince(DateTime<Utc>),
}

impl QueryFilter {
    /// The filter object in the API's query body format.
    pub fn to_json(&self) -> Value {
        match self {
            Self::EditedSince(since) => json!({
                "timestamp": "last_edited_time",
                "last_edited_time": {
                    "on_or_after": since.to_rfc3339_opts(SecondsFormat::Millis, true)
                }
            }),
        }
    }

    /// Whether a row satisfies the filter when checked locally.
    pub fn matches(&self, record: &PageRecord) -> bool {
        match self {
            Self::EditedSince(since) => record.last_edited_time >= *since,
        }
    }
}

// ---------------------------------------------------------------------------
// DocumentApi
// ---------------------------------------------------------------------------

/// The four calls the ingestion core needs from the document API.
///
/// Implementations own transport concerns: authentication, transient
/// rate-limit retries, and mapping failures into [`blockscribe_shared::BlockscribeError`].
#[async_trait]
pub trait DocumentApi: Send + Sync {
    /// One page of rows from a collection (database) matching `filter`.
    async fn query_collection(
        &self,
        collection_id: &str,
        filter: &QueryFilter,
        cursor: Option<&str>,
        page_size: u32,
    ) -> Result<PaginatedList<PageRecord>>;

    /// One page of a block's (or page's) direct children.
    async fn get_block_children(
        &self,
        block_id: &str,
        cursor: Option<&str>,
        page_size: u32,
    ) -> Result<PaginatedList<BlockRecord>>;

    async fn get_page(&self, page_id: &str) -> Result<PageRecord>;

    async fn get_database(&self, database_id: &str) -> Result<DatabaseRecord>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(edited: DateTime<Utc>) -> PageRecord {
        PageRecord {
            id: "p1".into(),
            created_time: edited,
            last_edited_time: edited,
            url: String::new(),
            archived: false,
            properties: Default::default(),
        }
    }

    #[test]
    fn edited_since_serializes_as_timestamp_filter() {
        let since = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let filter = QueryFilter::EditedSince(since);
        assert_eq!(
            filter.to_json(),
            json!({
                "timestamp": "last_edited_time",
                "last_edited_time": { "on_or_after": "2024-03-01T12:00:00.000Z" }
            })
        );
    }

    #[test]
    fn edited_since_is_inclusive() {
        let since = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let filter = QueryFilter::EditedSince(since);
        assert!(filter.matches(&record(since)));
        assert!(filter.matches(&record(since + chrono::Duration::seconds(1))));
        assert!(!filter.matches(&record(since - chrono::Duration::seconds(1))));
    }
}
