//! Ingestion driver
//!
//! Repeats pagination runs for an edition until the edition is finished, and
//! walks editions forward for the scheduled mode. Every run starts from the
//! store's checkpoint, so a run interrupted by a crash or a fatal error is
//! simply picked up by the next one.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, warn};

use super::config::{ExecutionMode, HarvestConfig};
use super::notify::{LogNotifier, Notifier};
use super::rate_limit::RateLimitedFetcher;
use super::HarvestError;
use crate::edition::latest_edition;
use crate::fetcher::pagination::{PaginationController, RunOutcome, RunReport};
use crate::fetcher::search_http::SearchHttpClient;
use crate::fetcher::{FetcherError, PageSource};
use crate::output::CsvResultStore;
use crate::resume::CheckpointStore;

/// Source of the current time
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Totals of all runs spent on one edition
#[derive(Debug, Clone, PartialEq)]
pub struct EditionSummary {
    /// Edition harvested
    pub edition: u32,
    /// Outcome of the last run
    pub outcome: RunOutcome,
    /// Pagination runs performed
    pub runs: usize,
    /// Search calls made
    pub pages: usize,
    /// Posts received
    pub posts_seen: usize,
    /// Records committed
    pub records_written: usize,
    /// Harvest stopped on a budget-spent run that committed nothing, so the
    /// edition is not finished
    pub stalled: bool,
}

impl EditionSummary {
    fn new(edition: u32) -> Self {
        Self {
            edition,
            outcome: RunOutcome::TooEarly,
            runs: 0,
            pages: 0,
            posts_seen: 0,
            records_written: 0,
            stalled: false,
        }
    }

    /// Whether the API ran out of posts for the edition
    pub fn is_complete(&self) -> bool {
        self.outcome == RunOutcome::Exhausted && !self.stalled
    }

    fn absorb(&mut self, report: &RunReport) {
        self.outcome = report.outcome;
        self.runs += 1;
        self.pages += report.pages;
        self.posts_seen += report.posts_seen;
        self.records_written += report.records_written;
    }
}

/// Runs pagination until editions are harvested
pub struct IngestionDriver<S, C> {
    source: S,
    store: C,
    mode: ExecutionMode,
    notifier: Box<dyn Notifier>,
    clock: Clock,
    page_budget: Option<usize>,
    flush_interval: Option<usize>,
}

impl IngestionDriver<RateLimitedFetcher<SearchHttpClient>, CsvResultStore> {
    /// Driver over the live search API and the CSV store
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built
    pub fn from_config(config: &HarvestConfig) -> Result<Self, HarvestError> {
        let client = SearchHttpClient::build_client().map_err(|e| {
            FetcherError::NetworkError(format!("Failed to build HTTP client: {e}"))
        })?;
        let transport =
            SearchHttpClient::new(Arc::new(client), &config.api_base, &config.bearer_token);
        let source = RateLimitedFetcher::with_pause(transport, config.rate_limit_pause);
        let store = CsvResultStore::new(config.resolved_data_dir());

        info!(
            mode = ?config.mode,
            data_dir = %store.data_dir().display(),
            "Harvester configured"
        );

        Ok(Self::new(source, store, config.mode)
            .with_page_budget(config.page_budget)
            .with_flush_interval(config.flush_interval))
    }
}

impl<S, C> IngestionDriver<S, C>
where
    S: PageSource,
    C: CheckpointStore,
{
    /// Create a driver; notifications go to the log and time is the system clock
    pub fn new(source: S, store: C, mode: ExecutionMode) -> Self {
        Self {
            source,
            store,
            mode,
            notifier: Box::new(LogNotifier),
            clock: Arc::new(Utc::now),
            page_budget: None,
            flush_interval: None,
        }
    }

    /// Deliver run summaries through `notifier`
    pub fn with_notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Box::new(notifier);
        self
    }

    /// Read the current time from `clock`
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Override the calls per pagination run
    pub fn with_page_budget(mut self, page_budget: usize) -> Self {
        self.page_budget = Some(page_budget);
        self
    }

    /// Override the pages between flushes
    pub fn with_flush_interval(mut self, flush_interval: usize) -> Self {
        self.flush_interval = Some(flush_interval);
        self
    }

    /// Execution mode
    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    /// Record store
    pub fn store(&self) -> &C {
        &self.store
    }

    /// One pagination run for `edition`
    ///
    /// # Errors
    /// Propagates the run's fetch or store error
    pub async fn run_once(&mut self, edition: u32) -> Result<RunReport, HarvestError> {
        let now = (self.clock)();
        let mut controller = PaginationController::new(&self.source, &mut self.store)
            .with_progress(self.mode.shows_progress());
        if let Some(page_budget) = self.page_budget {
            controller = controller.with_page_budget(page_budget);
        }
        if let Some(flush_interval) = self.flush_interval {
            controller = controller.with_flush_interval(flush_interval);
        }

        let report = controller.run(edition, now).await?;
        self.notifier.notify(&summary_line(&report));
        Ok(report)
    }

    /// Harvest one edition until the API has no more posts for it
    ///
    /// Runs that spend their call budget are followed by another run from
    /// the new checkpoint; the rate limiter absorbs the wait in between.
    ///
    /// # Errors
    /// Propagates the first fetch or store error
    pub async fn harvest_edition(&mut self, edition: u32) -> Result<EditionSummary, HarvestError> {
        let mut summary = EditionSummary::new(edition);

        loop {
            let report = self.run_once(edition).await?;
            summary.absorb(&report);

            if report.outcome != RunOutcome::BudgetSpent {
                break;
            }
            if report.records_written == 0 {
                // The checkpoint did not move, so the next run would repeat this one
                warn!(
                    edition,
                    pages = report.pages,
                    "Budget spent without a single accepted record, stopping edition"
                );
                summary.stalled = true;
                break;
            }
        }

        info!(
            edition,
            outcome = %summary.outcome,
            runs = summary.runs,
            records = summary.records_written,
            stalled = summary.stalled,
            "Edition harvest finished"
        );
        Ok(summary)
    }

    /// Harvest the newest edition whose search window has closed
    ///
    /// # Errors
    /// Returns an error before the first window has closed, or the harvest error
    pub async fn harvest_latest(&mut self) -> Result<EditionSummary, HarvestError> {
        let edition = latest_edition((self.clock)())?;
        info!(edition, "Resolved latest edition");
        self.harvest_edition(edition).await
    }

    /// Harvest `start` and every following edition until one is too early
    ///
    /// The summary of the too-early edition is not included.
    ///
    /// # Errors
    /// Propagates the first fetch or store error
    pub async fn harvest_forward(
        &mut self,
        start: u32,
    ) -> Result<Vec<EditionSummary>, HarvestError> {
        let mut summaries = Vec::new();
        let mut edition = Some(start);

        while let Some(current) = edition {
            let summary = self.harvest_edition(current).await?;
            if summary.outcome == RunOutcome::TooEarly {
                info!(edition = current, "Reached an open search window, stopping");
                break;
            }
            summaries.push(summary);
            edition = current.checked_add(1);
        }

        Ok(summaries)
    }
}

/// Notification text for a finished run; the count is of saved records
fn summary_line(report: &RunReport) -> String {
    match report.outcome {
        RunOutcome::TooEarly => format!("[{}] Too early to harvest", report.edition),
        RunOutcome::Exhausted => format!(
            "[{}] Processed {} posts - END OF POSTS",
            report.edition, report.records_written
        ),
        RunOutcome::BudgetSpent => format!(
            "[{}] Processed {} posts - Continuing...",
            report.edition, report.records_written
        ),
    }
}
