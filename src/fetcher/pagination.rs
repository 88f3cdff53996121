//! Pagination controller
//!
//! Drives one edition's search backwards in post id order. Each page moves the
//! cursor to one below its smallest id, accepted records are buffered and
//! flushed to the checkpoint store every few pages, and the run ends when the
//! API returns an empty page or the call budget is spent.
//!
//! A run picks up where the store left off: with a checkpoint the first
//! request starts just below the last committed post and batches are
//! appended, without one the first non-empty flush recreates the store.
//!
//! Includes safety mechanisms:
//! - A fixed call budget per run
//! - Empty response detection
//! - A cursor that must strictly decrease, whatever the API returns

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::edition::SearchWindow;
use crate::fetcher::{PageSource, SearchQuery};
use crate::harvester::config::{FLUSH_INTERVAL_PAGES, PAGE_BUDGET};
use crate::harvester::progress::RunProgress;
use crate::harvester::HarvestError;
use crate::metrics::{self, HarvestRunMetrics};
use crate::output::OutputResult;
use crate::parser::{PostParser, RejectionTally};
use crate::resume::{CheckpointStore, RunMode};
use crate::ResultRecord;

/// Terminal state of a pagination run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The edition's search window has not closed yet; nothing was fetched
    TooEarly,
    /// The API ran out of posts for the edition
    Exhausted,
    /// The call budget ran out before the posts did
    BudgetSpent,
}

impl RunOutcome {
    /// Short label for logs and metrics
    pub fn label(&self) -> &'static str {
        match self {
            RunOutcome::TooEarly => "too_early",
            RunOutcome::Exhausted => "exhausted",
            RunOutcome::BudgetSpent => "budget_spent",
        }
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Summary of one pagination run
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// Edition harvested
    pub edition: u32,
    /// How the run ended
    pub outcome: RunOutcome,
    /// Mode the run started in
    pub mode: RunMode,
    /// Search calls made
    pub pages: usize,
    /// Posts received
    pub posts_seen: usize,
    /// Records committed to the store
    pub records_written: usize,
    /// Posts dropped because they were already seen in this run or sit
    /// above the cursor
    pub duplicates_skipped: usize,
    /// Rejections by reason
    pub tally: RejectionTally,
}

impl RunReport {
    fn new(edition: u32, mode: RunMode) -> Self {
        Self {
            edition,
            outcome: RunOutcome::TooEarly,
            mode,
            pages: 0,
            posts_seen: 0,
            records_written: 0,
            duplicates_skipped: 0,
            tally: RejectionTally::default(),
        }
    }
}

/// Records accepted but not yet committed
struct Batch {
    records: Vec<ResultRecord>,
    seen_ids: HashSet<u64>,
    mode: RunMode,
}

impl Batch {
    fn new(mode: RunMode) -> Self {
        Self {
            records: Vec::new(),
            seen_ids: HashSet::new(),
            mode,
        }
    }

    /// Buffer a record unless its post was already seen; returns whether it was kept
    fn push(&mut self, record: ResultRecord) -> bool {
        if !self.seen_ids.insert(record.post_id) {
            return false;
        }
        self.records.push(record);
        true
    }
}

/// Fetch-parse-flush loop for one edition
pub struct PaginationController<'a, S, C> {
    source: &'a S,
    store: &'a mut C,
    page_budget: usize,
    flush_interval: usize,
    progress_enabled: bool,
}

impl<'a, S, C> PaginationController<'a, S, C>
where
    S: PageSource,
    C: CheckpointStore,
{
    /// Create a controller with the default budget and flush interval
    pub fn new(source: &'a S, store: &'a mut C) -> Self {
        Self {
            source,
            store,
            page_budget: PAGE_BUDGET,
            flush_interval: FLUSH_INTERVAL_PAGES,
            progress_enabled: false,
        }
    }

    /// Override the number of calls per run
    pub fn with_page_budget(mut self, page_budget: usize) -> Self {
        self.page_budget = page_budget.max(1);
        self
    }

    /// Override the number of pages between flushes
    pub fn with_flush_interval(mut self, flush_interval: usize) -> Self {
        self.flush_interval = flush_interval.max(1);
        self
    }

    /// Draw a terminal progress bar
    pub fn with_progress(mut self, enabled: bool) -> Self {
        self.progress_enabled = enabled;
        self
    }

    /// Run the loop for `edition` once
    ///
    /// # Errors
    /// Returns [`HarvestError::Fetch`] after committing the buffered records
    /// when a request fails, and [`HarvestError::Output`] when the store
    /// cannot be read or written.
    pub async fn run(
        &mut self,
        edition: u32,
        now: DateTime<Utc>,
    ) -> Result<RunReport, HarvestError> {
        let span = info_span!("harvest_run", edition);
        self.run_inner(edition, now).instrument(span).await
    }

    async fn run_inner(
        &mut self,
        edition: u32,
        now: DateTime<Utc>,
    ) -> Result<RunReport, HarvestError> {
        let window = SearchWindow::for_edition(edition);
        if window.is_too_early(now) {
            info!(
                until = %window.end(),
                "Search window still open, nothing to harvest yet"
            );
            return Ok(RunReport::new(edition, RunMode::Fresh));
        }

        let checkpoint = self.store.last_committed(edition)?;
        let mode = RunMode::for_checkpoint(checkpoint.as_ref());
        let mut cursor = checkpoint.map(|c| c.resume_cursor());
        match checkpoint {
            Some(c) => info!(last_post_id = c.last_post_id(), "Resuming below checkpoint"),
            None => info!("No checkpoint, starting fresh pass"),
        }

        let run_metrics = HarvestRunMetrics::start(edition);
        let progress = RunProgress::for_run(edition, self.page_budget, self.progress_enabled);
        let mut report = RunReport::new(edition, mode);
        let mut batch = Batch::new(mode);

        let outcome = loop {
            if report.pages >= self.page_budget {
                break RunOutcome::BudgetSpent;
            }

            let query = SearchQuery::for_window(&window, cursor);
            debug!(page = report.pages + 1, cursor = ?cursor, "Fetching search page");

            let mut page = match self.source.fetch_page(&query).await {
                Ok(page) => page,
                Err(e) => {
                    run_metrics.record_failure(&e.to_string());
                    progress.finish(format!("[{}] aborted", edition));
                    if let Err(flush_err) = self.flush(edition, &mut batch, &mut report) {
                        error!("Failed to flush after fetch error ({}): {}", e, flush_err);
                        return Err(flush_err.into());
                    }
                    return Err(HarvestError::Fetch(e));
                }
            };
            report.pages += 1;

            let Some(min_id) = page.min_id() else {
                debug!(page = report.pages, "Empty page received, posts exhausted");
                break RunOutcome::Exhausted;
            };

            let received = page.statuses.len();
            if let Some(current) = cursor {
                // Posts above the cursor are already committed
                page.statuses.retain(|post| post.id <= current);
                let above = received - page.statuses.len();
                if above > 0 {
                    warn!(
                        cursor = current,
                        above,
                        "Page ignored the cursor, dropping posts above it"
                    );
                    report.duplicates_skipped += above;
                }
            }

            let (records, tally) = PostParser::parse_page(&page.statuses, edition);
            metrics::record_rejections(&tally);
            report.posts_seen += received;
            report.tally.merge(&tally);

            let accepted = records.len();
            for record in records {
                if !batch.push(record) {
                    report.duplicates_skipped += 1;
                }
            }

            debug!(
                page = report.pages,
                posts = received,
                accepted,
                text_invalid = tally.text_invalid(),
                squares_invalid = tally.squares_invalid(),
                "Page processed"
            );
            progress.on_page(
                edition,
                report.pages,
                report.records_written + batch.records.len(),
            );

            if report.pages % self.flush_interval == 0 {
                self.flush(edition, &mut batch, &mut report)?;
            }

            let next = min_id.saturating_sub(1);
            if cursor.is_some_and(|current| next >= current) {
                warn!(
                    cursor = ?cursor,
                    min_id,
                    "Page did not move the cursor, treating posts as exhausted"
                );
                break RunOutcome::Exhausted;
            }
            cursor = Some(next);
        };

        self.flush(edition, &mut batch, &mut report)?;
        report.outcome = outcome;

        run_metrics.record_finished(outcome.label(), report.pages);
        progress.finish(format!(
            "[{}] {} records ({})",
            edition, report.records_written, outcome
        ));
        info!(
            outcome = %outcome,
            pages = report.pages,
            posts = report.posts_seen,
            records = report.records_written,
            duplicates = report.duplicates_skipped,
            text_invalid = report.tally.text_invalid(),
            squares_invalid = report.tally.squares_invalid(),
            "Harvest run finished"
        );

        Ok(report)
    }

    /// Commit the buffered records; the first non-empty commit of a fresh
    /// run recreates the store, every later one appends
    fn flush(&mut self, edition: u32, batch: &mut Batch, report: &mut RunReport) -> OutputResult<()> {
        if batch.records.is_empty() {
            return Ok(());
        }

        let written = self.store.write_batch(edition, &batch.records, batch.mode)?;
        metrics::record_records_flushed(edition, written);
        debug!(records = written, mode = ?batch.mode, "Batch committed");

        batch.records.clear();
        batch.mode = RunMode::Continuation;
        report.records_written += written;
        Ok(())
    }
}
