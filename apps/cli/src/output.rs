//! Consumer side of the page streams: render, count, and decide when to stop.

use std::io::Write;
use std::ops::ControlFlow;
use std::time::Duration;

use blockscribe_markdown::render_page;
use blockscribe_shared::{BlockscribeError, Page, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;

/// When the consumer should stop the stream on its own.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct StopPolicy {
    /// Stop after this many pages have been written.
    pub limit: Option<usize>,
    /// Stop at the first error item.
    pub fail_fast: bool,
}

/// Writes each yielded page as Markdown and tracks progress.
pub(crate) struct PageWriter<W> {
    out: W,
    policy: StopPolicy,
    progress: ProgressBar,
    written: usize,
    failed: usize,
    first_error: Option<BlockscribeError>,
    output_error: Option<BlockscribeError>,
}

impl<W: Write> PageWriter<W> {
    pub(crate) fn new(out: W, policy: StopPolicy, progress: ProgressBar) -> Self {
        Self {
            out,
            policy,
            progress,
            written: 0,
            failed: 0,
            first_error: None,
            output_error: None,
        }
    }

    /// Handle one stream item.
    pub(crate) fn accept(&mut self, item: Result<Page>) -> ControlFlow<()> {
        match item {
            Ok(page) => {
                if self.limit_reached() {
                    return ControlFlow::Break(());
                }
                if let Err(e) = self.write_page(&page) {
                    warn!(page_id = %page.id, error = %e, "failed to write page");
                    self.output_error = Some(BlockscribeError::io("<stdout>", e));
                    return ControlFlow::Break(());
                }
                self.written += 1;
                self.progress
                    .set_message(format!("{} pages, {} errors", self.written, self.failed));

                if self.limit_reached() {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            }
            Err(e) => {
                self.progress.suspend(|| eprintln!("error: {e}"));
                self.record_error(e);
                self.progress
                    .set_message(format!("{} pages, {} errors", self.written, self.failed));

                if self.policy.fail_fast {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            }
        }
    }

    pub(crate) fn written(&self) -> usize {
        self.written
    }

    pub(crate) fn failed(&self) -> usize {
        self.failed
    }

    /// Finish the spinner. Fails if the output could not be written;
    /// otherwise hands back the first error item seen, if any.
    pub(crate) fn finish(self) -> Result<Option<BlockscribeError>> {
        self.progress.finish_and_clear();
        match self.output_error {
            Some(e) => Err(e),
            None => Ok(self.first_error),
        }
    }

    fn limit_reached(&self) -> bool {
        self.policy.limit.is_some_and(|limit| self.written >= limit)
    }

    fn write_page(&mut self, page: &Page) -> std::io::Result<()> {
        let title = page.title().unwrap_or_default();
        writeln!(self.out, "<!-- page {} {} -->", page.id, title.trim())?;
        self.out.write_all(render_page(page).as_bytes())?;
        writeln!(self.out)?;
        self.out.flush()
    }

    fn record_error(&mut self, e: BlockscribeError) {
        self.failed += 1;
        if self.first_error.is_none() {
            self.first_error = Some(e);
        }
    }
}

/// Spinner on stderr showing pages processed.
pub(crate) fn spinner(label: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {prefix} {msg}") {
        spinner.set_style(
            style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
    }
    spinner.set_prefix(label.to_string());
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}
