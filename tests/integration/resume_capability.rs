//! Integration tests for resume capability
//!
//! Runs the pagination controller and the driver against the CSV store in a
//! temporary directory, interrupting runs at the budget or with a fatal error,
//! and checks the file holds every post below the checkpoint exactly once.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;
use wordle_harvester::fetcher::pagination::{PaginationController, RunOutcome};
use wordle_harvester::fetcher::response::PostAuthor;
use wordle_harvester::fetcher::{
    FetcherError, FetcherResult, PageSource, RawPost, SearchPage, SearchQuery,
};
use wordle_harvester::harvester::{ExecutionMode, HarvestError, IngestionDriver, RecordingNotifier};
use wordle_harvester::output::CsvResultStore;
use wordle_harvester::resume::{CheckpointStore, RunMode};

const EDITION: u32 = 250;

/// Serves ids below the cursor, optionally failing on one call
struct Feed {
    top: u64,
    per_page: u64,
    fail_on_call: Option<usize>,
    calls: AtomicUsize,
}

impl Feed {
    fn new(top: u64, per_page: u64) -> Self {
        Self {
            top,
            per_page,
            fail_on_call: None,
            calls: AtomicUsize::new(0),
        }
    }

    fn failing_on(mut self, call: usize) -> Self {
        self.fail_on_call = Some(call);
        self
    }
}

fn create_post(id: u64) -> RawPost {
    // Every third post carries a grid with an interior win and is rejected
    let text = if id % 3 == 0 {
        "Wordle 250 3/6\n🟩🟩🟩🟩🟩\n⬛⬛⬛⬛⬛\n🟩🟩🟩🟩🟩"
    } else {
        "Wordle 250 2/6\n⬛🟨⬛⬛🟩\n🟩🟩🟩🟩🟩"
    };
    RawPost {
        id,
        created_at: "Fri Feb 25 07:15:00 +0000 2022".to_string(),
        user: PostAuthor { id: 10 + id % 5 },
        source: "<a href=\"http://tapbots.com/tweetbot\" rel=\"nofollow\">Tweetbot for i\u{039F}S</a>"
            .to_string(),
        in_reply_to_user_id: None,
        is_quote_status: true,
        retweet_count: 1,
        quote_count: None,
        favorite_count: 3,
        reply_count: None,
        lang: "es".to_string(),
        text: text.to_string(),
    }
}

#[async_trait]
impl PageSource for Feed {
    async fn fetch_page(&self, query: &SearchQuery) -> FetcherResult<SearchPage> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_on_call == Some(call) {
            return Err(FetcherError::NetworkError("connection reset".to_string()));
        }

        let top = query.max_id.unwrap_or(self.top).min(self.top);
        let bottom = top.saturating_sub(self.per_page);
        Ok(SearchPage {
            statuses: (bottom + 1..=top).rev().map(create_post).collect(),
            search_metadata: None,
        })
    }
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2022, 3, 10, 0, 0, 0).unwrap()
}

/// Accepted ids in `1..=top`, newest first
fn expected_ids(top: u64) -> Vec<u64> {
    (1..=top).rev().filter(|id| id % 3 != 0).collect()
}

fn stored_ids(store: &CsvResultStore) -> Vec<u64> {
    store
        .read_edition(EDITION)
        .unwrap()
        .iter()
        .map(|record| record.post_id)
        .collect()
}

#[tokio::test]
async fn test_resume_after_budget_has_no_gaps_or_duplicates() {
    let temp_dir = TempDir::new().unwrap();
    let mut store = CsvResultStore::new(temp_dir.path());

    let feed = Feed::new(600, 20);
    let report = PaginationController::new(&feed, &mut store)
        .with_page_budget(7)
        .with_flush_interval(2)
        .run(EDITION, now())
        .await
        .unwrap();
    assert_eq!(report.outcome, RunOutcome::BudgetSpent);

    let checkpoint = store.last_committed(EDITION).unwrap().unwrap();
    assert_eq!(checkpoint.last_post_id(), 461);

    let feed = Feed::new(600, 20);
    let report = PaginationController::new(&feed, &mut store)
        .run(EDITION, now())
        .await
        .unwrap();
    assert_eq!(report.outcome, RunOutcome::Exhausted);

    assert_eq!(report.mode, RunMode::Continuation);
    assert_eq!(stored_ids(&store), expected_ids(600));

    let contents = std::fs::read_to_string(store.path_for(EDITION)).unwrap();
    assert_eq!(contents.matches("post_id").count(), 1);
}

#[tokio::test]
async fn test_resume_after_fatal_error() {
    let temp_dir = TempDir::new().unwrap();
    let mut store = CsvResultStore::new(temp_dir.path());

    // Fails on the sixth call, after five pages were buffered but never flushed
    let feed = Feed::new(300, 25).failing_on(5);
    let result = PaginationController::new(&feed, &mut store)
        .run(EDITION, now())
        .await;
    assert!(matches!(
        result,
        Err(HarvestError::Fetch(FetcherError::NetworkError(_)))
    ));
    let committed: Vec<u64> = expected_ids(300).into_iter().filter(|id| *id > 175).collect();
    assert_eq!(stored_ids(&store), committed);

    let feed = Feed::new(300, 25);
    PaginationController::new(&feed, &mut store)
        .run(EDITION, now())
        .await
        .unwrap();

    assert_eq!(stored_ids(&store), expected_ids(300));
}

#[tokio::test]
async fn test_fresh_pass_replaces_header_only_file() {
    let temp_dir = TempDir::new().unwrap();
    let mut store = CsvResultStore::new(temp_dir.path());
    std::fs::write(store.path_for(EDITION), "time,post_id\n").unwrap();

    let feed = Feed::new(30, 10);
    PaginationController::new(&feed, &mut store)
        .run(EDITION, now())
        .await
        .unwrap();

    let contents = std::fs::read_to_string(store.path_for(EDITION)).unwrap();
    assert!(contents.starts_with("time,post_id,author_id,surface"));
    assert_eq!(stored_ids(&store), expected_ids(30));
}

#[tokio::test]
async fn test_driver_repeats_runs_until_exhausted() {
    let temp_dir = TempDir::new().unwrap();
    let notifier = RecordingNotifier::new();

    let mut driver = IngestionDriver::new(
        Feed::new(250, 10),
        CsvResultStore::new(temp_dir.path()),
        ExecutionMode::Unattended,
    )
    .with_page_budget(10)
    .with_notifier(notifier.clone())
    .with_clock(now);

    let summary = driver.harvest_edition(EDITION).await.unwrap();

    // Two full runs of ten pages, then a short run ending on an empty page
    assert_eq!(summary.outcome, RunOutcome::Exhausted);
    assert_eq!(summary.runs, 3);
    assert_eq!(summary.records_written, expected_ids(250).len());
    assert_eq!(stored_ids(driver.store()), expected_ids(250));

    let messages = notifier.messages();
    assert_eq!(messages.len(), 3);
    assert!(messages[0].ends_with("Continuing..."));
    assert!(messages[2].ends_with("END OF POSTS"));
}

#[tokio::test]
async fn test_stored_records_round_trip_fields() {
    let temp_dir = TempDir::new().unwrap();
    let mut store = CsvResultStore::new(temp_dir.path());

    let feed = Feed::new(2, 2);
    PaginationController::new(&feed, &mut store)
        .run(EDITION, now())
        .await
        .unwrap();

    let records = store.read_edition(EDITION).unwrap();
    assert_eq!(records.len(), 2);
    let record = &records[0];
    assert_eq!(record.post_id, 2);
    assert_eq!(record.surface.index(), 5);
    assert!(record.is_quote);
    assert_eq!(record.language, "es");
    assert_eq!(record.matrix, "ABAACCCCCC");
    assert!(record.validate().is_ok());
}
