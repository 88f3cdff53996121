//! In-memory checkpoint store
//!
//! Keeps every edition's rows in a vector. Used by embedding code that wants
//! to post-process records itself, and by tests of the pagination controller.

use std::collections::HashMap;

use super::{Checkpoint, CheckpointStore, RunMode};
use crate::output::OutputResult;
use crate::ResultRecord;

/// Checkpoint store backed by a map of vectors
#[derive(Debug, Default, Clone)]
pub struct MemoryCheckpointStore {
    editions: HashMap<u32, Vec<ResultRecord>>,
    batches: Vec<(u32, usize, RunMode)>,
}

impl MemoryCheckpointStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an edition with already committed rows
    pub fn with_records(mut self, edition: u32, records: Vec<ResultRecord>) -> Self {
        self.editions.insert(edition, records);
        self
    }

    /// Rows of an edition in commit order
    pub fn records(&self, edition: u32) -> &[ResultRecord] {
        self.editions
            .get(&edition)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Every write as `(edition, size, mode)`, in order
    pub fn batches(&self) -> &[(u32, usize, RunMode)] {
        &self.batches
    }
}

impl CheckpointStore for MemoryCheckpointStore {
    fn last_committed(&self, edition: u32) -> OutputResult<Option<Checkpoint>> {
        Ok(self
            .records(edition)
            .last()
            .map(|record| Checkpoint::new(edition, record.post_id)))
    }

    fn write_batch(
        &mut self,
        edition: u32,
        records: &[ResultRecord],
        mode: RunMode,
    ) -> OutputResult<usize> {
        let rows = self.editions.entry(edition).or_default();
        if mode == RunMode::Fresh {
            rows.clear();
        }
        rows.extend_from_slice(records);
        self.batches.push((edition, records.len(), mode));
        Ok(records.len())
    }
}
