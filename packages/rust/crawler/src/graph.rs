//! Depth-limited crawl over child-page links.

use std::ops::ControlFlow;

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};

use blockscribe_client::MAX_PAGE_SIZE;
use blockscribe_shared::{BlockType, BlockscribeError, CrawlDefaults, Page, Result};

use crate::engine::{BoxFuture, Crawler, PageSink, StreamSummary};

// ---------------------------------------------------------------------------
// Options & scan result
// ---------------------------------------------------------------------------

/// Parameters for [`Crawler::crawl_pages`].
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    /// Only pages edited at or after this instant are yielded.
    pub since: DateTime<Utc>,
    /// Follow child-page links below the root.
    pub recursive: bool,
    /// Deepest level to expand (root is depth 0); 0 means unlimited.
    pub max_depth: u32,
}

impl CrawlOptions {
    /// Recursive, unlimited-depth crawl of pages edited since `since`.
    pub fn new(since: DateTime<Utc>) -> Self {
        Self {
            since,
            recursive: true,
            max_depth: 0,
        }
    }

    /// Take `recursive` and `max_depth` from the `[crawl]` config section.
    pub fn from_defaults(since: DateTime<Utc>, defaults: &CrawlDefaults) -> Self {
        Self {
            since,
            recursive: defaults.recursive,
            max_depth: defaults.max_depth,
        }
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    fn expands(&self, depth: u32) -> bool {
        self.recursive && (self.max_depth == 0 || depth < self.max_depth)
    }
}

/// Child-page IDs directly under a page.
#[derive(Debug, Default)]
pub struct ChildPageScan {
    /// IDs found, in block order.
    pub ids: Vec<String>,
    /// Set when a listing request failed; `ids` holds what was found before it.
    pub error: Option<BlockscribeError>,
}

// ---------------------------------------------------------------------------
// Crawler operations
// ---------------------------------------------------------------------------

impl Crawler {
    /// List the `child_page` blocks directly under `page_id`.
    ///
    /// Single level only: child pages nested inside other blocks are not
    /// discovered. A failed listing request ends the scan and is reported in
    /// [`ChildPageScan::error`]. Returns `Err` only on cancellation.
    pub async fn scan_child_pages(&self, page_id: &str) -> Result<ChildPageScan> {
        let mut scan = ChildPageScan::default();
        let mut cursor: Option<String> = None;

        loop {
            let list = match self
                .call(
                    self.api
                        .get_block_children(page_id, cursor.as_deref(), MAX_PAGE_SIZE),
                )
                .await
            {
                Ok(list) => list,
                Err(e) if e.is_cancelled() => return Err(e),
                Err(e) => {
                    scan.error = Some(e.context(format!("scan child pages of {page_id}")));
                    break;
                }
            };

            scan.ids.extend(
                list.results
                    .iter()
                    .filter(|b| BlockType::from_api_name(&b.kind) == BlockType::ChildPage)
                    .map(|b| b.id.clone()),
            );

            match list.continuation() {
                Some(next) => cursor = Some(next.to_string()),
                None => break,
            }
        }

        Ok(scan)
    }

    /// Walk the page graph from `root_page_id`, yielding each page edited
    /// since `options.since`.
    ///
    /// Pages are visited depth-first in block order. A page that cannot be
    /// fetched or resolved is yielded as an error; whether the crawl goes on
    /// is up to `on_page`. A failed child-page scan is yielded too, and the
    /// crawl continues with the children found before the failure. Pages
    /// reachable through two parents are visited twice.
    ///
    /// Returns `Err` only when the cancellation token fires.
    #[instrument(skip(self, options, on_page), fields(recursive = options.recursive, max_depth = options.max_depth))]
    pub async fn crawl_pages<F>(
        &self,
        root_page_id: &str,
        options: &CrawlOptions,
        mut on_page: F,
    ) -> Result<StreamSummary>
    where
        F: FnMut(Result<Page>) -> ControlFlow<()> + Send,
    {
        let mut walk = Walk {
            crawler: self,
            options,
            on_page: &mut on_page,
            summary: StreamSummary::default(),
        };
        walk.visit(root_page_id.to_string(), 0).await?;

        info!(
            pages = walk.summary.pages,
            errors = walk.summary.errors,
            stopped = walk.summary.stopped_by_consumer,
            "page crawl finished"
        );
        Ok(walk.summary)
    }
}

// ---------------------------------------------------------------------------
// Walk
// ---------------------------------------------------------------------------

/// State of one crawl: the consumer and what it has been handed so far.
struct Walk<'a, 's> {
    crawler: &'a Crawler,
    options: &'a CrawlOptions,
    on_page: &'a mut PageSink<'s>,
    summary: StreamSummary,
}

impl Walk<'_, '_> {
    fn emit(&mut self, item: Result<Page>) -> ControlFlow<()> {
        self.summary.emit(self.on_page, item)
    }

    fn visit(&mut self, page_id: String, depth: u32) -> BoxFuture<'_, Result<ControlFlow<()>>> {
        Box::pin(async move {
            let crawler = self.crawler;

            let record = match crawler.call(crawler.api.get_page(&page_id)).await {
                Ok(record) => record,
                Err(e) if e.is_cancelled() => return Err(e),
                Err(e) => {
                    let err = e.context(format!("fetch page {page_id}"));
                    warn!(error = %err, depth, "page fetch failed");
                    return Ok(self.emit(Err(err)));
                }
            };

            if record.last_edited_time >= self.options.since {
                let flow = match crawler.resolve_page(record).await {
                    Err(e) if e.is_cancelled() => return Err(e),
                    Err(e) => {
                        warn!(error = %e, depth, "page resolution failed");
                        self.emit(Err(e))
                    }
                    Ok(page) => self.emit(Ok(page)),
                };
                if flow.is_break() {
                    return Ok(flow);
                }
            } else {
                debug!(page_id = %page_id, depth, "page edited before cutoff, not yielded");
            }

            if !self.options.expands(depth) {
                return Ok(ControlFlow::Continue(()));
            }

            let scan = crawler.scan_child_pages(&page_id).await?;
            if let Some(err) = scan.error {
                warn!(error = %err, found = scan.ids.len(), "child page scan incomplete");
                if self.emit(Err(err)).is_break() {
                    return Ok(ControlFlow::Break(()));
                }
            }

            debug!(page_id = %page_id, depth, children = scan.ids.len(), "descending into child pages");
            for child in scan.ids {
                if self.visit(child, depth + 1).await?.is_break() {
                    return Ok(ControlFlow::Break(()));
                }
            }

            Ok(ControlFlow::Continue(()))
        })
    }
}
