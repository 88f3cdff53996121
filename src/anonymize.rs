//! Author anonymization
//!
//! Raw author ids never leave the harvester's own store. Downstream output
//! carries a small integer assigned per author by an [`AuthorIndex`], and no
//! post id at all.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{ResultRecord, Rounds, Surface, Theme};

/// Maps raw author ids to stable anonymous indices
pub trait AuthorIndex {
    /// Index of `author_id`, assigning the next free one on first sight
    fn lookup_or_assign(&mut self, author_id: u64) -> u64;
}

/// Author index held in memory, numbering authors from 1 in first-seen order
#[derive(Debug, Default, Clone)]
pub struct InMemoryAuthorIndex {
    indices: HashMap<u64, u64>,
}

impl InMemoryAuthorIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of authors seen so far
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Whether no author has been seen
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

impl AuthorIndex for InMemoryAuthorIndex {
    fn lookup_or_assign(&mut self, author_id: u64) -> u64 {
        let next = self.indices.len() as u64 + 1;
        *self.indices.entry(author_id).or_insert(next)
    }
}

/// Result record ready for publication
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CondensedRecord {
    /// Post creation time in unix seconds
    pub time: i64,
    /// Anonymous author index
    pub author: u64,
    /// Surface index (1-7)
    pub surface: u8,
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
    /// Language code
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
    /// Canonical grid
    pub matrix: String,
}

impl CondensedRecord {
    /// Condense a record, replacing its author through `index`
    pub fn from_record(record: &ResultRecord, index: &mut dyn AuthorIndex) -> Self {
        Self {
            time: record.time.timestamp(),
            author: index.lookup_or_assign(record.author_id),
            surface: record.surface.index(),
            is_reply: record.is_reply,
            is_quote: record.is_quote,
            retweets: record.retweets,
            quotes: record.quotes,
            favorites: record.favorites,
            replies: record.replies,
            language: record.language.clone(),
            edition: record.edition,
            rounds: record.rounds,
            hard_mode: record.hard_mode,
            theme: record.theme,
            colorblind: record.colorblind,
            win: record.win,
            matrix: record.matrix.clone(),
        }
    }

    /// Client surface
    pub fn surface(&self) -> Option<Surface> {
        Surface::from_index(self.surface)
    }
}
