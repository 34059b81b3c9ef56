//! Recursive, paginated retrieval of block trees.

use tracing::debug;

use blockscribe_client::MAX_PAGE_SIZE;
use blockscribe_shared::{Block, Result};

use crate::convert::convert_block;
use crate::engine::{BoxFuture, Crawler};

impl Crawler {
    /// Fetch the full subtree below a block or page, in API order.
    ///
    /// Every child reporting `has_children` is expanded recursively with no
    /// depth limit. Any failed request aborts the whole subtree; the error
    /// names the block whose listing failed.
    pub fn fetch_block_tree<'a>(&'a self, block_id: &'a str) -> BoxFuture<'a, Result<Vec<Block>>> {
        Box::pin(async move {
            let mut blocks = Vec::new();
            let mut cursor: Option<String> = None;

            loop {
                let list = self
                    .call(
                        self.api
                            .get_block_children(block_id, cursor.as_deref(), MAX_PAGE_SIZE),
                    )
                    .await
                    .map_err(|e| e.context(format!("fetch children of block {block_id}")))?;

                for record in &list.results {
                    let mut block = convert_block(record);
                    if record.has_children {
                        block.children = self.fetch_block_tree(&record.id).await?;
                    }
                    blocks.push(block);
                }

                match list.continuation() {
                    Some(next) => cursor = Some(next.to_string()),
                    None => break,
                }
            }

            debug!(block_id, children = blocks.len(), "fetched block children");
            Ok(blocks)
        })
    }
}
