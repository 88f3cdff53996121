//! # Wordle Harvester Library
//!
//! A resumable harvester for public Wordle result posts. Each post that carries
//! a valid result grid is turned into one strongly-typed [`ResultRecord`] and
//! persisted to a per-edition CSV file for downstream aggregation.
//!
//! ## Features
//!
//! - **Post Parsing**: Announcement and emoji-grid extraction with post-hoc corrections
//! - **Resume Capability**: Runs restart from the last post id committed to disk
//! - **Rate Limiting**: HTTP 429 responses are absorbed with a fixed pause
//! - **Call Budget**: Each run stops after one rate-limit window worth of pages
//! - **Anonymization Hook**: Author ids are replaced through an injected index
//!
//! ## Quick Start
//!
//! ```no_run
//! use wordle_harvester::harvester::{HarvestConfig, IngestionDriver};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = HarvestConfig::from_env()?;
//! let mut driver = IngestionDriver::from_config(&config)?;
//! driver.harvest_edition(250).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`edition`] - Edition numbers and their search windows
//! - [`parser`] - Post text to [`ResultRecord`] conversion
//! - [`fetcher`] - Search API access and the pagination controller
//! - [`harvester`] - Rate limiting, configuration and the ingestion driver
//! - [`output`] - Per-edition CSV store
//! - [`resume`] - Checkpoint protocol
//! - [`anonymize`] - Author anonymization collaborator

#![warn(missing_docs)]
#![warn(clippy::all)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Author anonymization
pub mod anonymize;

/// CLI command implementations
pub mod cli;

/// Edition numbers and search windows
pub mod edition;

/// Search API access and pagination
pub mod fetcher;

/// Ingestion orchestration
pub mod harvester;

/// Observability metrics
pub mod metrics;

/// Data output writers
pub mod output;

/// Post parsing
pub mod parser;

/// Resume capability for ingestion runs
pub mod resume;

pub use edition::SearchWindow;
pub use parser::{PostParser, RejectReason};

/// Number of squares in one grid row
pub const ROW_WIDTH: usize = 5;

/// Maximum number of attempts in one game
pub const MAX_ROUNDS: u8 = 6;

/// Canonical encoding of a winning row
pub const WIN_ROW: &str = "CCCCC";

/// Attempts used by a player, or a failed game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Rounds {
    /// Solved on the given attempt (1-6)
    Solved(u8),
    /// Not solved within six attempts
    Failed,
}

impl Rounds {
    /// Number of grid rows a record with these rounds must carry
    pub fn row_count(&self) -> usize {
        match self {
            Rounds::Solved(n) => *n as usize,
            Rounds::Failed => MAX_ROUNDS as usize,
        }
    }

    /// Whether this is the failed sentinel
    pub fn is_failed(&self) -> bool {
        matches!(self, Rounds::Failed)
    }
}

impl std::fmt::Display for Rounds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rounds::Solved(n) => write!(f, "{n}"),
            Rounds::Failed => write!(f, "X"),
        }
    }
}

impl FromStr for Rounds {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "X" | "x" => Ok(Rounds::Failed),
            _ => match s.parse::<u8>() {
                Ok(n) if (1..=MAX_ROUNDS).contains(&n) => Ok(Rounds::Solved(n)),
                _ => Err(format!("Invalid rounds: {s}")),
            },
        }
    }
}

impl TryFrom<String> for Rounds {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rounds> for String {
    fn from(rounds: Rounds) -> Self {
        rounds.to_string()
    }
}

/// Colour theme inferred from the miss squares of a grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Theme {
    /// Dark theme (black miss squares)
    #[serde(rename = "d")]
    Dark,
    /// Light theme (white miss squares)
    #[serde(rename = "l")]
    Light,
    /// No miss squares in the grid
    #[serde(rename = "u")]
    Unknown,
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Theme::Dark => "d",
            Theme::Light => "l",
            Theme::Unknown => "u",
        };
        write!(f, "{s}")
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "d" => Ok(Theme::Dark),
            "l" => Ok(Theme::Light),
            "u" => Ok(Theme::Unknown),
            _ => Err(format!("Invalid theme: {s}")),
        }
    }
}

/// Client surface a post was written from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Surface {
    /// Twitter for iPhone
    Iphone,
    /// Twitter for Android
    Android,
    /// Twitter Web App
    WebApp,
    /// Twitter for iPad
    Ipad,
    /// Tweetbot
    Tweetbot,
    /// TweetDeck
    TweetDeck,
    /// Any other client
    Other,
}

impl Surface {
    /// Map a client label (the inner text of the post's source anchor)
    pub fn from_label(label: &str) -> Self {
        match label {
            "Twitter for iPhone" => Surface::Iphone,
            "Twitter for Android" => Surface::Android,
            "Twitter Web App" => Surface::WebApp,
            "Twitter for iPad" => Surface::Ipad,
            // Tweetbot spells its platform with a Greek capital omicron
            "Tweetbot for i\u{039F}S" | "Tweetbot for iOS" => Surface::Tweetbot,
            "TweetDeck" => Surface::TweetDeck,
            _ => Surface::Other,
        }
    }

    /// Numeric index persisted in the output (1-7)
    pub fn index(&self) -> u8 {
        match self {
            Surface::Iphone => 1,
            Surface::Android => 2,
            Surface::WebApp => 3,
            Surface::Ipad => 4,
            Surface::Tweetbot => 5,
            Surface::TweetDeck => 6,
            Surface::Other => 7,
        }
    }

    /// Inverse of [`Surface::index`]
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            1 => Some(Surface::Iphone),
            2 => Some(Surface::Android),
            3 => Some(Surface::WebApp),
            4 => Some(Surface::Ipad),
            5 => Some(Surface::Tweetbot),
            6 => Some(Surface::TweetDeck),
            7 => Some(Surface::Other),
            _ => None,
        }
    }
}

/// One validated result extracted from a post
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResultRecord {
    /// Post creation time
    pub time: DateTime<Utc>,
    /// Post identifier, used for resumption and de-duplication only
    pub post_id: u64,
    /// Raw author identifier, anonymized downstream
    pub author_id: u64,
    /// Client surface
    pub surface: Surface,
    /// Post is a reply
    pub is_reply: bool,
    /// Post quotes another post
    pub is_quote: bool,
    /// Repost count
    pub retweets: u64,
    /// Quote count, when the API reports it
    pub quotes: Option<u64>,
    /// Like count
    pub favorites: u64,
    /// Reply count, when the API reports it
    pub replies: Option<u64>,
    /// Language code reported by the API
    pub language: String,
    /// Puzzle edition
    pub edition: u32,
    /// Attempts used
    pub rounds: Rounds,
    /// Hard mode marker present
    pub hard_mode: bool,
    /// Inferred colour theme
    pub theme: Theme,
    /// Colorblind palette used
    pub colorblind: bool,
    /// Game was won
    pub win: bool,
    /// Canonical grid over {A, B, C}, five characters per row
    pub matrix: String,
}

impl ResultRecord {
    /// Grid rows of the canonical matrix
    pub fn rows(&self) -> impl Iterator<Item = &str> {
        self.matrix
            .as_bytes()
            .chunks(ROW_WIDTH)
            .map(|row| std::str::from_utf8(row).unwrap_or_default())
    }

    /// Validate record integrity
    pub fn validate(&self) -> Result<(), String> {
        if self.matrix.bytes().any(|b| !matches!(b, b'A' | b'B' | b'C')) {
            return Err(format!(
                "Matrix must only contain A, B or C, got {}",
                self.matrix
            ));
        }

        let expected = ROW_WIDTH * self.rounds.row_count();
        if self.matrix.len() != expected {
            return Err(format!(
                "Matrix length ({}) must be {} for rounds {}",
                self.matrix.len(),
                expected,
                self.rounds
            ));
        }

        if self.win == self.rounds.is_failed() {
            return Err(format!(
                "Win flag ({}) contradicts rounds {}",
                self.win, self.rounds
            ));
        }

        if self.win && !self.matrix.ends_with(WIN_ROW) {
            return Err("Winning matrix must end with a CCCCC row".to_string());
        }

        let row_count = self.rounds.row_count();
        if let Some(position) = self.rows().position(|row| row == WIN_ROW) {
            if position != row_count - 1 {
                return Err(format!(
                    "Win row at position {} of {}",
                    position + 1,
                    row_count
                ));
            }
        }

        Ok(())
    }
}
