//! Post parser
//!
//! Stateless conversion of one search result into a validated
//! [`ResultRecord`]. A post either yields a record or a [`RejectReason`];
//! rejections are expected for most of the search stream and are only counted.

use crate::fetcher::response::RawPost;
use crate::{ResultRecord, Rounds, Surface, Theme, MAX_ROUNDS, ROW_WIDTH, WIN_ROW};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

pub mod glyph;

use glyph::{extract_rows, Glyph};

/// Announcement line, e.g. `Wordle 250 3/6*`
///
/// Captures the edition numeral (thousands commas allowed), the rounds symbol
/// and the hard mode marker.
static ANNOUNCEMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)wordle[()#!,\-.:\s]*(\d[\d,]*)?[()#!,\-.:\s]*([1-6X])/6(\*)?")
        .unwrap_or_else(|e| panic!("announcement pattern is invalid: {e}"))
});

/// Timestamp layout of the search API's `created_at`
const CREATED_AT_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

/// Why a post did not produce a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum RejectReason {
    /// No announcement line in the text
    #[error("no announcement")]
    NoAnnouncement,

    /// Announcement refers to another edition
    #[error("wrong edition: {found:?}")]
    WrongEdition {
        /// Edition found in the text, if any numeral was present
        found: Option<u32>,
    },

    /// Grid has no rows or more than six
    #[error("grid has {0} rows")]
    GridRowCount(usize),

    /// A grid row does not have five squares
    #[error("grid row is not {ROW_WIDTH} squares wide")]
    GridRowWidth,

    /// Row count disagrees with the announced rounds
    #[error("grid size does not match rounds")]
    SizeMismatch,

    /// Win flag disagrees with the announced rounds
    #[error("win flag does not match rounds")]
    WinRoundMismatch,

    /// A winning row appears before the last row
    #[error("winning row before the last row")]
    InteriorWin,

    /// `created_at` could not be parsed
    #[error("invalid timestamp")]
    InvalidTimestamp,
}

impl RejectReason {
    /// Stable label used in logs and metrics
    pub fn label(&self) -> &'static str {
        match self {
            RejectReason::NoAnnouncement => "no_announcement",
            RejectReason::WrongEdition { .. } => "wrong_edition",
            RejectReason::GridRowCount(_) => "grid_row_count",
            RejectReason::GridRowWidth => "grid_row_width",
            RejectReason::SizeMismatch => "size_mismatch",
            RejectReason::WinRoundMismatch => "win_round_mismatch",
            RejectReason::InteriorWin => "interior_win",
            RejectReason::InvalidTimestamp => "invalid_timestamp",
        }
    }

    /// Whether the rejection comes from the grid rather than the text
    pub fn is_grid_rejection(&self) -> bool {
        !matches!(
            self,
            RejectReason::NoAnnouncement
                | RejectReason::WrongEdition { .. }
                | RejectReason::InvalidTimestamp
        )
    }
}

/// Rejection counts by reason label
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RejectionTally {
    counts: BTreeMap<&'static str, u64>,
    text_invalid: u64,
    squares_invalid: u64,
}

impl RejectionTally {
    /// Count one rejection
    pub fn record(&mut self, reason: &RejectReason) {
        *self.counts.entry(reason.label()).or_insert(0) += 1;
        if reason.is_grid_rejection() {
            self.squares_invalid += 1;
        } else {
            self.text_invalid += 1;
        }
    }

    /// Fold another tally into this one
    pub fn merge(&mut self, other: &RejectionTally) {
        for (label, count) in &other.counts {
            *self.counts.entry(label).or_insert(0) += count;
        }
        self.text_invalid += other.text_invalid;
        self.squares_invalid += other.squares_invalid;
    }

    /// Count for one reason label
    pub fn count(&self, label: &str) -> u64 {
        self.counts.get(label).copied().unwrap_or(0)
    }

    /// Rejections caused by the announcement or metadata
    pub fn text_invalid(&self) -> u64 {
        self.text_invalid
    }

    /// Rejections caused by the grid
    pub fn squares_invalid(&self) -> u64 {
        self.squares_invalid
    }

    /// All rejections
    pub fn total(&self) -> u64 {
        self.text_invalid + self.squares_invalid
    }

    /// Counts by label
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, u64)> + '_ {
        self.counts.iter().map(|(label, count)| (*label, *count))
    }
}

/// Stateless parser for search results
pub struct PostParser;

impl PostParser {
    /// Parse one post for the requested edition
    ///
    /// # Errors
    /// Returns the first [`RejectReason`] the post fails on, in this order:
    /// announcement, edition, grid shape, interior win, size, win/rounds
    /// agreement, timestamp.
    pub fn parse(post: &RawPost, edition: u32) -> Result<ResultRecord, RejectReason> {
        let announcement = ANNOUNCEMENT
            .captures(&post.text)
            .ok_or(RejectReason::NoAnnouncement)?;

        let found = announcement
            .get(1)
            .and_then(|m| m.as_str().replace(',', "").parse::<u32>().ok());
        if found != Some(edition) {
            return Err(RejectReason::WrongEdition { found });
        }

        // A failed game is counted as six rounds until the grid confirms the loss
        let mut rounds = match announcement.get(2).map(|m| m.as_str()) {
            Some(symbol) if symbol.eq_ignore_ascii_case("x") => Rounds::Solved(MAX_ROUNDS),
            Some(symbol) => symbol
                .parse::<Rounds>()
                .map_err(|_| RejectReason::NoAnnouncement)?,
            None => return Err(RejectReason::NoAnnouncement),
        };
        let hard_mode = announcement.get(3).is_some();

        let rows = extract_rows(&post.text);
        if rows.is_empty() || rows.len() > MAX_ROUNDS as usize {
            return Err(RejectReason::GridRowCount(rows.len()));
        }
        if rows.iter().any(|row| row.len() != ROW_WIDTH) {
            return Err(RejectReason::GridRowWidth);
        }

        let squares: Vec<Glyph> = rows.into_iter().flatten().collect();
        let colorblind = squares.iter().any(Glyph::is_colorblind);
        let theme = if squares.contains(&Glyph::MissDark) {
            Theme::Dark
        } else if squares.contains(&Glyph::MissLight) {
            Theme::Light
        } else {
            Theme::Unknown
        };
        let matrix: String = squares.iter().filter_map(Glyph::canonical).collect();

        let mut win = matrix.ends_with(WIN_ROW);

        // Corrections shared with the archive cleaning stage
        if colorblind && matrix.ends_with(WIN_ROW) {
            win = true;
        }
        if rounds == Rounds::Solved(MAX_ROUNDS) && !win {
            rounds = Rounds::Failed;
        }

        // An interior win is reported whatever the last row holds
        if contains_interior_win(&matrix) {
            return Err(RejectReason::InteriorWin);
        }
        if matrix.len() / ROW_WIDTH != rounds.row_count() {
            return Err(RejectReason::SizeMismatch);
        }
        if win == rounds.is_failed() {
            return Err(RejectReason::WinRoundMismatch);
        }

        let time = DateTime::parse_from_str(&post.created_at, CREATED_AT_FORMAT)
            .map_err(|_| RejectReason::InvalidTimestamp)?
            .with_timezone(&Utc);

        Ok(ResultRecord {
            time,
            post_id: post.id,
            author_id: post.user.id,
            surface: Surface::from_label(post.source_label()),
            is_reply: post.in_reply_to_user_id.is_some(),
            is_quote: post.is_quote_status,
            retweets: post.retweet_count,
            quotes: post.quote_count,
            favorites: post.favorite_count,
            replies: post.reply_count,
            language: post.lang.clone(),
            edition,
            rounds,
            hard_mode,
            theme,
            colorblind,
            win,
            matrix,
        })
    }

    /// Parse every post of a page, keeping accepted records in page order
    pub fn parse_page(posts: &[RawPost], edition: u32) -> (Vec<ResultRecord>, RejectionTally) {
        let mut records = Vec::with_capacity(posts.len());
        let mut tally = RejectionTally::default();

        for post in posts {
            match Self::parse(post, edition) {
                Ok(record) => records.push(record),
                Err(reason) => tally.record(&reason),
            }
        }

        (records, tally)
    }
}

/// Whether a winning row appears anywhere but the last row
///
/// A single-row grid whose only row wins is valid.
fn contains_interior_win(matrix: &str) -> bool {
    let rows: Vec<&[u8]> = matrix.as_bytes().chunks(ROW_WIDTH).collect();
    rows.iter()
        .position(|row| *row == WIN_ROW.as_bytes())
        .is_some_and(|position| position != rows.len() - 1)
}
