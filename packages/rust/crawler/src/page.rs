//! Page detail resolution and lightweight metadata lookups.

use tracing::{debug, instrument};

use blockscribe_shared::{
    DatabaseMetadata, Page, PageMetadata, PageRecord, Result, normalize_properties,
};

use crate::engine::Crawler;

impl Crawler {
    /// Combine a raw page record with its fetched block tree.
    ///
    /// Fails as a whole if any part of the tree cannot be fetched.
    #[instrument(skip_all, fields(page_id = %record.id))]
    pub async fn resolve_page(&self, record: PageRecord) -> Result<Page> {
        let blocks = self
            .fetch_block_tree(&record.id)
            .await
            .map_err(|e| e.context(format!("resolve page {}", record.id)))?;

        debug!(root_blocks = blocks.len(), "page resolved");

        Ok(Page {
            properties: normalize_properties(&record.properties),
            id: record.id,
            blocks,
            created_time: record.created_time,
            last_edited_time: record.last_edited_time,
            url: record.url,
        })
    }

    /// ID, title, and URL of a page, without its content.
    pub async fn page_metadata(&self, page_id: &str) -> Result<PageMetadata> {
        let record = self
            .call(self.api.get_page(page_id))
            .await
            .map_err(|e| e.context(format!("fetch page {page_id}")))?;
        Ok(PageMetadata::from(&record))
    }

    /// ID, title, and URL of a database.
    pub async fn database_metadata(&self, database_id: &str) -> Result<DatabaseMetadata> {
        let record = self
            .call(self.api.get_database(database_id))
            .await
            .map_err(|e| e.context(format!("fetch database {database_id}")))?;
        Ok(DatabaseMetadata::from(&record))
    }
}
