//! Resume capability for ingestion runs
//!
//! The last row committed to an edition's store is the checkpoint. A run that
//! finds one continues strictly below it; a run that finds none starts a fresh
//! pass and replaces whatever the store held.

pub mod checkpoint;
pub mod memory;

pub use checkpoint::{Checkpoint, RunMode};
pub use memory::MemoryCheckpointStore;

use crate::output::OutputResult;
use crate::ResultRecord;

/// Append-only per-edition record store
pub trait CheckpointStore: Send {
    /// Checkpoint of an edition, `None` when nothing has been committed
    ///
    /// # Errors
    /// Returns an error if the store exists but cannot be read
    fn last_committed(&self, edition: u32) -> OutputResult<Option<Checkpoint>>;

    /// Persist a batch of records for an edition
    ///
    /// In [`RunMode::Fresh`] the store is recreated before the batch is
    /// written; in [`RunMode::Continuation`] the batch is appended. Returns
    /// the number of records written.
    ///
    /// # Errors
    /// Returns an error if the batch could not be made durable
    fn write_batch(
        &mut self,
        edition: u32,
        records: &[ResultRecord],
        mode: RunMode,
    ) -> OutputResult<usize>;
}
