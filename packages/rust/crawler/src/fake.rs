//! In-memory [`DocumentApi`] for tests.
//!
//! Listings are paginated with a configurable chunk size; cursors are the
//! decimal offset of the next item. Every call is recorded as a key like
//! `children:b1@0`, `query:db1@2`, `page:p1`, or `database:db1`, and any key
//! registered with [`FakeApi::fail_on`] returns an API error instead.
//! Requested page sizes and query filters are logged separately.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{Value, json};

use blockscribe_client::{DocumentApi, QueryFilter};
use blockscribe_shared::{
    BlockRecord, BlockscribeError, DatabaseRecord, PageRecord, PaginatedList, Result,
};

#[derive(Default)]
pub(crate) struct FakeApi {
    pages: HashMap<String, PageRecord>,
    children: HashMap<String, Vec<BlockRecord>>,
    rows: HashMap<String, Vec<PageRecord>>,
    databases: HashMap<String, DatabaseRecord>,
    fail_on: HashSet<String>,
    stall_on: HashSet<String>,
    chunk: Option<usize>,
    calls: Mutex<Vec<String>>,
    page_sizes: Mutex<Vec<u32>>,
    filters: Mutex<Vec<Value>>,
}

/// A page record with a title property.
pub(crate) fn page_record(id: &str, last_edited: &str, title: &str) -> PageRecord {
    serde_json::from_value(json!({
        "id": id,
        "created_time": "2023-01-01T00:00:00Z",
        "last_edited_time": last_edited,
        "url": format!("https://www.notion.so/{id}"),
        "properties": {
            "Name": { "type": "title", "title": [{ "plain_text": title }] }
        }
    }))
    .expect("valid page record")
}

/// A text-bearing block record of the given API type.
pub(crate) fn text_block(id: &str, kind: &str, text: &str) -> BlockRecord {
    serde_json::from_value(json!({
        "id": id,
        "type": kind,
        "has_children": false,
        kind: { "rich_text": [{ "plain_text": text }] }
    }))
    .expect("valid block record")
}

pub(crate) fn child_page_block(id: &str, title: &str) -> BlockRecord {
    serde_json::from_value(json!({
        "id": id,
        "type": "child_page",
        "has_children": false,
        "child_page": { "title": title }
    }))
    .expect("valid block record")
}

/// Mark a block record as having children.
pub(crate) fn parent(mut record: BlockRecord) -> BlockRecord {
    record.has_children = true;
    record
}

impl FakeApi {
    pub(crate) fn page(mut self, id: &str, last_edited: &str, title: &str) -> Self {
        self.pages
            .insert(id.to_string(), page_record(id, last_edited, title));
        self
    }

    pub(crate) fn children(mut self, parent_id: &str, blocks: Vec<BlockRecord>) -> Self {
        self.children.insert(parent_id.to_string(), blocks);
        self
    }

    pub(crate) fn rows(mut self, database_id: &str, rows: Vec<PageRecord>) -> Self {
        self.rows.insert(database_id.to_string(), rows);
        self
    }

    pub(crate) fn database(mut self, id: &str, title: &str) -> Self {
        let record = serde_json::from_value(json!({
            "id": id,
            "title": [{ "plain_text": title }],
            "url": format!("https://www.notion.so/{id}")
        }))
        .expect("valid database record");
        self.databases.insert(id.to_string(), record);
        self
    }

    /// Page size used for every listing, regardless of what the caller asks for.
    pub(crate) fn chunked(mut self, chunk: usize) -> Self {
        self.chunk = Some(chunk);
        self
    }

    pub(crate) fn fail_on(mut self, key: &str) -> Self {
        self.fail_on.insert(key.to_string());
        self
    }

    /// Never complete the call with this key.
    pub(crate) fn stall_on(mut self, key: &str) -> Self {
        self.stall_on.insert(key.to_string());
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }

    /// `page_size` of every listing call, in call order.
    pub(crate) fn page_sizes(&self) -> Vec<u32> {
        self.page_sizes.lock().expect("page size lock").clone()
    }

    /// Query filters as sent, in call order.
    pub(crate) fn filters(&self) -> Vec<Value> {
        self.filters.lock().expect("filter lock").clone()
    }

    fn record_listing(&self, page_size: u32) {
        self.page_sizes.lock().expect("page size lock").push(page_size);
    }

    async fn record(&self, key: String) -> Result<()> {
        self.calls.lock().expect("calls lock").push(key.clone());
        if self.stall_on.contains(&key) {
            std::future::pending::<()>().await;
        }
        if self.fail_on.contains(&key) {
            return Err(BlockscribeError::Api {
                status: 500,
                code: "internal_server_error".into(),
                message: format!("injected failure for {key}"),
            });
        }
        Ok(())
    }

    fn paginate<T: Clone>(
        &self,
        items: &[T],
        cursor: Option<&str>,
        page_size: u32,
    ) -> PaginatedList<T> {
        let size = self.chunk.unwrap_or(page_size as usize).max(1);
        let start = cursor.and_then(|c| c.parse().ok()).unwrap_or(0usize).min(items.len());
        let end = (start + size).min(items.len());
        let has_more = end < items.len();
        PaginatedList {
            results: items[start..end].to_vec(),
            next_cursor: has_more.then(|| end.to_string()),
            has_more,
        }
    }
}

#[async_trait]
impl DocumentApi for FakeApi {
    async fn query_collection(
        &self,
        collection_id: &str,
        filter: &QueryFilter,
        cursor: Option<&str>,
        page_size: u32,
    ) -> Result<PaginatedList<PageRecord>> {
        self.record_listing(page_size);
        self.filters.lock().expect("filter lock").push(filter.to_json());
        self.record(format!("query:{collection_id}@{}", cursor.unwrap_or("0")))
            .await?;
        let rows = self.rows.get(collection_id).cloned().unwrap_or_default();
        Ok(self.paginate(&rows, cursor, page_size))
    }

    async fn get_block_children(
        &self,
        block_id: &str,
        cursor: Option<&str>,
        page_size: u32,
    ) -> Result<PaginatedList<BlockRecord>> {
        self.record_listing(page_size);
        self.record(format!("children:{block_id}@{}", cursor.unwrap_or("0")))
            .await?;
        let blocks = self.children.get(block_id).cloned().unwrap_or_default();
        Ok(self.paginate(&blocks, cursor, page_size))
    }

    async fn get_page(&self, page_id: &str) -> Result<PageRecord> {
        self.record(format!("page:{page_id}")).await?;
        self.pages.get(page_id).cloned().ok_or_else(|| BlockscribeError::Api {
            status: 404,
            code: "object_not_found".into(),
            message: format!("no page {page_id}"),
        })
    }

    async fn get_database(&self, database_id: &str) -> Result<DatabaseRecord> {
        self.record(format!("database:{database_id}")).await?;
        self.databases
            .get(database_id)
            .cloned()
            .ok_or_else(|| BlockscribeError::Api {
                status: 404,
                code: "object_not_found".into(),
                message: format!("no database {database_id}"),
            })
    }
}
