//! Edition numbers and search windows
//!
//! One puzzle edition is published per day starting at [`EPOCH`]. Posts about
//! edition `n` are searched for in a three day window starting on the day the
//! edition was published.

use chrono::{DateTime, Days, NaiveDate, Utc};
use std::fmt;
use std::str::FromStr;

/// Publication date of edition 0
pub const EPOCH: (i32, u32, u32) = (2021, 6, 18);

/// Length of the search window in days
pub const WINDOW_DAYS: u64 = 3;

/// Publication date of edition 0 as a calendar date
pub fn epoch() -> NaiveDate {
    let (year, month, day) = EPOCH;
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MIN)
}

/// Edition errors
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EditionError {
    /// Argument is neither a number nor `latest`
    #[error("invalid edition '{0}': expected a non-negative number or 'latest'")]
    InvalidArgument(String),

    /// No edition window has closed yet at the given time
    #[error("no edition has closed yet at {0}")]
    BeforeEpoch(DateTime<Utc>),
}

/// Date range searched for one edition
///
/// # Examples
///
/// ```
/// use wordle_harvester::edition::SearchWindow;
///
/// let window = SearchWindow::for_edition(250);
/// assert_eq!(window.start().to_string(), "2022-02-23");
/// assert_eq!(window.end().to_string(), "2022-02-26");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SearchWindow {
    edition: u32,
    start: NaiveDate,
    end: NaiveDate,
}

impl SearchWindow {
    /// Derive the window for an edition
    pub fn for_edition(edition: u32) -> Self {
        let start = epoch()
            .checked_add_days(Days::new(u64::from(edition)))
            .unwrap_or(NaiveDate::MAX);
        let end = start
            .checked_add_days(Days::new(WINDOW_DAYS))
            .unwrap_or(NaiveDate::MAX);
        Self {
            edition,
            start,
            end,
        }
    }

    /// Edition number
    pub fn edition(&self) -> u32 {
        self.edition
    }

    /// First day of the window
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Day the window closes (exclusive)
    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Whether the window is still open at `now`
    ///
    /// Pagination walks from the newest post backwards and resumes strictly
    /// below the last stored id, so posts published after a harvest started
    /// would never be collected. An edition is only harvested once its window
    /// has closed.
    pub fn is_too_early(&self, now: DateTime<Utc>) -> bool {
        self.end.and_time(chrono::NaiveTime::MIN).and_utc() > now
    }

    /// Search query text restricted to this window, excluding reposts
    pub fn search_phrase(&self) -> String {
        format!(
            "\"wordle {}\" until:{} since:{} -filter:retweets",
            self.edition,
            self.end.format("%Y-%m-%d"),
            self.start.format("%Y-%m-%d")
        )
    }
}

/// Newest edition whose search window has closed at `now`
pub fn latest_edition(now: DateTime<Utc>) -> Result<u32, EditionError> {
    let days = (now.date_naive() - epoch()).num_days() - WINDOW_DAYS as i64;
    u32::try_from(days).map_err(|_| EditionError::BeforeEpoch(now))
}

/// Edition selector accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditionArg {
    /// A specific edition
    Number(u32),
    /// The newest closed edition at run time
    Latest,
}

impl EditionArg {
    /// Resolve to a concrete edition number
    pub fn resolve(&self, now: DateTime<Utc>) -> Result<u32, EditionError> {
        match self {
            EditionArg::Number(n) => Ok(*n),
            EditionArg::Latest => latest_edition(now),
        }
    }
}

impl FromStr for EditionArg {
    type Err = EditionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("latest") {
            return Ok(EditionArg::Latest);
        }
        s.parse::<u32>()
            .map(EditionArg::Number)
            .map_err(|_| EditionError::InvalidArgument(s.to_string()))
    }
}

impl fmt::Display for EditionArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditionArg::Number(n) => write!(f, "{n}"),
            EditionArg::Latest => write!(f, "latest"),
        }
    }
}
