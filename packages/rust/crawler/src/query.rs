//! Time-filtered, cursor-paginated database query stream.

use std::ops::ControlFlow;

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};

use blockscribe_client::{MAX_PAGE_SIZE, QueryFilter};
use blockscribe_shared::{Page, Result};

use crate::engine::{Crawler, PageSink, StreamSummary};

impl Crawler {
    /// Yield every page of `database_id` edited at or after `since`.
    ///
    /// Pages are resolved one at a time, in query order, and handed to
    /// `on_page` as soon as they are complete. A page whose block tree cannot
    /// be fetched is yielded as an error and the stream moves on. A failed
    /// query request is yielded as an error and ends the stream, since there
    /// is no cursor to continue from. Returning `Break` from `on_page` stops
    /// the stream before any further request is made.
    ///
    /// Returns `Err` only when the cancellation token fires.
    #[instrument(skip(self, since, on_page), fields(since = %since))]
    pub async fn query_database<F>(
        &self,
        database_id: &str,
        since: DateTime<Utc>,
        mut on_page: F,
    ) -> Result<StreamSummary>
    where
        F: FnMut(Result<Page>) -> ControlFlow<()> + Send,
    {
        let summary = self.run_query(database_id, since, &mut on_page).await?;
        info!(
            pages = summary.pages,
            errors = summary.errors,
            stopped = summary.stopped_by_consumer,
            "database query finished"
        );
        Ok(summary)
    }

    async fn run_query(
        &self,
        database_id: &str,
        since: DateTime<Utc>,
        on_page: &mut PageSink<'_>,
    ) -> Result<StreamSummary> {
        let filter = QueryFilter::EditedSince(since);
        let mut summary = StreamSummary::default();
        let mut cursor: Option<String> = None;

        loop {
            let list = match self
                .call(self.api.query_collection(
                    database_id,
                    &filter,
                    cursor.as_deref(),
                    MAX_PAGE_SIZE,
                ))
                .await
            {
                Ok(list) => list,
                Err(e) if e.is_cancelled() => return Err(e),
                Err(e) => {
                    let err = e.context(format!("query collection {database_id}"));
                    warn!(error = %err, "collection query failed");
                    summary.emit(on_page, Err(err));
                    return Ok(summary);
                }
            };

            let next = list.continuation().map(str::to_string);

            for record in list.results {
                if !filter.matches(&record) {
                    debug!(page_id = %record.id, "row edited before cutoff, skipped");
                    continue;
                }

                let item = match self.resolve_page(record).await {
                    Err(e) if e.is_cancelled() => return Err(e),
                    Err(e) => {
                        warn!(error = %e, "page resolution failed");
                        Err(e)
                    }
                    ok => ok,
                };

                if summary.emit(on_page, item).is_break() {
                    debug!("consumer stopped the query stream");
                    return Ok(summary);
                }
            }

            match next {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use std::ops::ControlFlow;
    use std::sync::Arc;

    use chrono::{DateTime, Utc};
    use serde_json::json;

    use crate::engine::Crawler;
    use crate::fake::{FakeApi, page_record, text_block};

    fn since() -> DateTime<Utc> {
        "2024-03-01T00:00:00Z".parse().unwrap()
    }

    fn rows(n: usize) -> Vec<blockscribe_shared::PageRecord> {
        (1..=n)
            .map(|i| page_record(&format!("p{i}"), "2024-03-05T00:00:00Z", &format!("Page {i}")))
            .collect()
    }

    #[tokio::test]
    async fn yields_resolved_pages_across_query_pages() {
        let api = Arc::new(
            FakeApi::default()
                .chunked(2)
                .rows("db", rows(3))
                .children("p2", vec![text_block("b", "paragraph", "body")]),
        );
        let crawler = Crawler::new(api.clone());

        let mut seen = Vec::new();
        let summary = crawler
            .query_database("db", since(), |item| {
                let page = item.expect("page resolves");
                seen.push((page.id.clone(), page.blocks.len()));
                ControlFlow::Continue(())
            })
            .await
            .unwrap();

        assert_eq!(
            seen,
            vec![("p1".into(), 0), ("p2".into(), 1), ("p3".into(), 0)]
        );
        assert_eq!(summary.pages, 3);
        assert!(!summary.stopped_by_consumer);
        assert_eq!(
            api.calls(),
            vec![
                "query:db@0",
                "children:p1@0",
                "children:p2@0",
                "query:db@2",
                "children:p3@0",
            ]
        );
    }

    #[tokio::test]
    async fn sends_edited_since_filter_and_full_page_size() {
        let api = Arc::new(FakeApi::default().chunked(2).rows("db", rows(3)));
        let crawler = Crawler::new(api.clone());

        crawler
            .query_database("db", since(), |_| ControlFlow::Continue(()))
            .await
            .unwrap();

        let expected = json!({
            "timestamp": "last_edited_time",
            "last_edited_time": { "on_or_after": "2024-03-01T00:00:00.000Z" }
        });
        assert_eq!(api.filters(), vec![expected.clone(), expected]);
        // Two query pages plus one block listing per row.
        assert_eq!(api.page_sizes(), vec![100u32; 5]);
    }

    #[tokio::test]
    async fn failed_page_is_yielded_and_stream_continues() {
        let api = Arc::new(FakeApi::default().rows("db", rows(3)).fail_on("children:p2@0"));
        let crawler = Crawler::new(api);

        let mut outcomes = Vec::new();
        let summary = crawler
            .query_database("db", since(), |item| {
                outcomes.push(item.map(|p| p.id).map_err(|e| e.to_string()));
                ControlFlow::Continue(())
            })
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0], Ok("p1".to_string()));
        assert!(outcomes[1].as_ref().unwrap_err().contains("resolve page p2"));
        assert_eq!(outcomes[2], Ok("p3".to_string()));
        assert_eq!(summary.errors, 1);
    }

    #[tokio::test]
    async fn early_stop_issues_no_further_requests() {
        let api = Arc::new(FakeApi::default().chunked(2).rows("db", rows(5)));
        let crawler = Crawler::new(api.clone());

        let mut count = 0;
        let summary = crawler
            .query_database("db", since(), |_| {
                count += 1;
                if count == 2 {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            })
            .await
            .unwrap();

        assert!(summary.stopped_by_consumer);
        assert_eq!(summary.pages, 2);
        assert_eq!(
            api.calls(),
            vec!["query:db@0", "children:p1@0", "children:p2@0"]
        );
    }

    #[tokio::test]
    async fn rows_before_cutoff_are_never_yielded() {
        let mut all = rows(2);
        all.insert(1, page_record("old", "2024-02-28T23:59:59Z", "Stale"));
        let api = Arc::new(FakeApi::default().rows("db", all));
        let crawler = Crawler::new(api.clone());

        let mut ids = Vec::new();
        crawler
            .query_database("db", since(), |item| {
                let page = item.unwrap();
                assert!(page.last_edited_time >= since());
                ids.push(page.id);
                ControlFlow::Continue(())
            })
            .await
            .unwrap();

        assert_eq!(ids, vec!["p1", "p2"]);
        assert!(!api.calls().contains(&"children:old@0".to_string()));
    }

    #[tokio::test]
    async fn query_failure_is_yielded_then_stream_ends() {
        let api = Arc::new(FakeApi::default().chunked(1).rows("db", rows(3)).fail_on("query:db@1"));
        let crawler = Crawler::new(api.clone());

        let mut outcomes = Vec::new();
        let summary = crawler
            .query_database("db", since(), |item| {
                outcomes.push(item.is_ok());
                ControlFlow::Continue(())
            })
            .await
            .unwrap();

        assert_eq!(outcomes, vec![true, false]);
        assert_eq!(summary.errors, 1);
        assert_eq!(api.calls().last().map(String::as_str), Some("query:db@1"));
    }

    #[tokio::test]
    async fn cancellation_aborts_with_error() {
        let api = Arc::new(FakeApi::default().rows("db", rows(3)));
        let crawler = Crawler::new(api.clone());
        let token = crawler.cancellation_token().clone();

        let err = crawler
            .query_database("db", since(), move |_| {
                token.cancel();
                ControlFlow::Continue(())
            })
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
        assert_eq!(api.calls(), vec!["query:db@0", "children:p1@0"]);
    }
}
