//! The [`Crawler`] handle shared by every ingestion operation.
//!
//! A crawler pairs a [`DocumentApi`] with a cancellation token. Every network
//! round-trip goes through [`Crawler::call`], so a fired token stops all
//! further requests, including ones already in flight.

use std::future::Future;
use std::ops::ControlFlow;
use std::pin::Pin;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use blockscribe_client::DocumentApi;
use blockscribe_shared::{BlockscribeError, Page, Result};

/// Boxed future used by the recursive fetchers.
pub(crate) type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Per-item consumer callback: return `Break` to stop the sequence.
pub(crate) type PageSink<'a> = dyn FnMut(Result<Page>) -> ControlFlow<()> + Send + 'a;

// ---------------------------------------------------------------------------
// StreamSummary
// ---------------------------------------------------------------------------

/// What a query stream or crawl handed to its consumer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamSummary {
    /// Pages yielded successfully.
    pub pages: usize,
    /// Error items yielded.
    pub errors: usize,
    /// The consumer returned `Break` before the sequence was exhausted.
    pub stopped_by_consumer: bool,
}

impl StreamSummary {
    /// Hand one item to the consumer, counting it.
    pub(crate) fn emit(
        &mut self,
        on_page: &mut PageSink<'_>,
        item: Result<Page>,
    ) -> ControlFlow<()> {
        match &item {
            Ok(_) => self.pages += 1,
            Err(_) => self.errors += 1,
        }
        let flow = on_page(item);
        if flow.is_break() {
            self.stopped_by_consumer = true;
        }
        flow
    }
}

// ---------------------------------------------------------------------------
// Crawler
// ---------------------------------------------------------------------------

/// Sequential, cancellable reader over a document API.
#[derive(Clone)]
pub struct Crawler {
    pub(crate) api: Arc<dyn DocumentApi>,
    cancel: CancellationToken,
}

impl Crawler {
    /// Create a crawler over `api` with a fresh, unfired cancellation token.
    pub fn new(api: Arc<dyn DocumentApi>) -> Self {
        Self {
            api,
            cancel: CancellationToken::new(),
        }
    }

    /// Observe an externally owned cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Run one API round-trip, racing it against the cancellation token.
    ///
    /// The request is never started once the token has fired.
    pub(crate) async fn call<T>(&self, request: impl Future<Output = Result<T>>) -> Result<T> {
        if self.cancel.is_cancelled() {
            return Err(BlockscribeError::Cancelled);
        }
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(BlockscribeError::Cancelled),
            result = request => result,
        }
    }
}
