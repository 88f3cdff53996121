//! Checkpoint types for resume capability

use serde::{Deserialize, Serialize};

/// The last committed post of an edition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    edition: u32,
    last_post_id: u64,
}

impl Checkpoint {
    /// Create a checkpoint from the post id of the last committed row
    pub fn new(edition: u32, last_post_id: u64) -> Self {
        Self {
            edition,
            last_post_id,
        }
    }

    /// Edition the checkpoint belongs to
    pub fn edition(&self) -> u32 {
        self.edition
    }

    /// Post id of the last committed row
    pub fn last_post_id(&self) -> u64 {
        self.last_post_id
    }

    /// Cursor for the first request of a continuation run.
    /// The bound is inclusive, so the committed post itself is excluded.
    pub fn resume_cursor(&self) -> u64 {
        self.last_post_id.saturating_sub(1)
    }
}

/// How the first flush of a run treats existing data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Recreate the store, writing a header
    Fresh,
    /// Append below the checkpoint
    Continuation,
}

impl RunMode {
    /// Mode implied by the presence of a checkpoint
    pub fn for_checkpoint(checkpoint: Option<&Checkpoint>) -> Self {
        if checkpoint.is_some() {
            RunMode::Continuation
        } else {
            RunMode::Fresh
        }
    }
}
