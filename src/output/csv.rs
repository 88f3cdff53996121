//! Per-edition CSV store
//!
//! One file per edition, `wordle.{n}.api.csv`, newest posts first. A fresh
//! pass recreates the file with a header; a continuation appends rows without
//! one. The `post_id` column of the last physical row is the checkpoint.

use ::csv::{ReaderBuilder, Writer, WriterBuilder};
use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{OutputError, OutputResult, OutputWriter};
use crate::resume::{Checkpoint, CheckpointStore, RunMode};
use crate::{ResultRecord, Rounds, Surface, Theme};

const DEFAULT_BUFFER_SIZE: usize = 8192; // 8KB buffer

/// CSV row of one result record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    /// Post creation time in unix seconds
    pub time: i64,
    /// Post identifier
    pub post_id: u64,
    /// Author identifier
    pub author_id: u64,
    /// Surface index (1-7)
    pub surface: u8,
    /// 0/1
    pub is_reply: u8,
    /// 0/1
    pub is_quote: u8,
    /// Repost count
    pub retweets: u64,
    /// Quote count, empty when unknown
    pub quotes: Option<u64>,
    /// Like count
    pub favorites: u64,
    /// Reply count, empty when unknown
    pub replies: Option<u64>,
    /// Language code
    pub language: String,
    /// Puzzle edition
    pub edition: u32,
    /// `1`-`6` or `X`
    pub rounds: String,
    /// 0/1
    pub hard_mode: u8,
    /// `d`, `l` or `u`
    pub theme: String,
    /// 0/1
    pub colorblind: u8,
    /// 0/1
    pub win: u8,
    /// Canonical grid
    pub matrix: String,
}

impl From<&ResultRecord> for ResultRow {
    fn from(record: &ResultRecord) -> Self {
        Self {
            time: record.time.timestamp(),
            post_id: record.post_id,
            author_id: record.author_id,
            surface: record.surface.index(),
            is_reply: u8::from(record.is_reply),
            is_quote: u8::from(record.is_quote),
            retweets: record.retweets,
            quotes: record.quotes,
            favorites: record.favorites,
            replies: record.replies,
            language: record.language.clone(),
            edition: record.edition,
            rounds: record.rounds.to_string(),
            hard_mode: u8::from(record.hard_mode),
            theme: record.theme.to_string(),
            colorblind: u8::from(record.colorblind),
            win: u8::from(record.win),
            matrix: record.matrix.clone(),
        }
    }
}

impl TryFrom<ResultRow> for ResultRecord {
    type Error = OutputError;

    fn try_from(row: ResultRow) -> Result<Self, Self::Error> {
        let time = Utc
            .timestamp_opt(row.time, 0)
            .single()
            .ok_or_else(|| OutputError::SerializationError(format!("Invalid time: {}", row.time)))?;
        let surface = Surface::from_index(row.surface).ok_or_else(|| {
            OutputError::SerializationError(format!("Invalid surface: {}", row.surface))
        })?;
        let rounds: Rounds = row.rounds.parse().map_err(OutputError::SerializationError)?;
        let theme: Theme = row.theme.parse().map_err(OutputError::SerializationError)?;

        Ok(ResultRecord {
            time,
            post_id: row.post_id,
            author_id: row.author_id,
            surface,
            is_reply: row.is_reply != 0,
            is_quote: row.is_quote != 0,
            retweets: row.retweets,
            quotes: row.quotes,
            favorites: row.favorites,
            replies: row.replies,
            language: row.language,
            edition: row.edition,
            rounds,
            hard_mode: row.hard_mode != 0,
            theme,
            colorblind: row.colorblind != 0,
            win: row.win != 0,
            matrix: row.matrix,
        })
    }
}

/// CSV writer for result records
pub struct CsvResultWriter {
    writer: Writer<BufWriter<File>>,
    records_written: u64,
}

impl CsvResultWriter {
    /// Recreate the file at `path` and write the header with the first row
    pub fn create<P: AsRef<Path>>(path: P) -> OutputResult<Self> {
        let path = path.as_ref();
        info!("Creating CSV writer: path={}", path.display());

        ensure_parent(path)?;
        let file = File::create(path)
            .map_err(|e| OutputError::IoError(format!("Failed to create file: {}", e)))?;

        // Headers will be written by csv::Writer on the first serialize()
        Ok(Self::from_file(file, true))
    }

    /// Open the file at `path` for appending rows without a header
    ///
    /// A missing or empty file still gets a header, so the result is always
    /// a readable CSV document.
    pub fn append<P: AsRef<Path>>(path: P) -> OutputResult<Self> {
        let path = path.as_ref();
        debug!("Opening CSV writer for append: path={}", path.display());

        ensure_parent(path)?;
        let needs_header = std::fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| OutputError::IoError(format!("Failed to open file: {}", e)))?;

        Ok(Self::from_file(file, needs_header))
    }

    fn from_file(file: File, has_headers: bool) -> Self {
        let buf_writer = BufWriter::with_capacity(DEFAULT_BUFFER_SIZE, file);
        let writer = WriterBuilder::new()
            .has_headers(has_headers)
            .from_writer(buf_writer);
        Self {
            writer,
            records_written: 0,
        }
    }

    /// Write a single record
    pub fn write_record(&mut self, record: &ResultRecord) -> OutputResult<()> {
        self.writer
            .serialize(ResultRow::from(record))
            .map_err(|e| OutputError::CsvError(format!("Failed to write record: {}", e)))?;
        self.records_written += 1;
        Ok(())
    }

    /// Get number of records written so far
    pub fn records_written(&self) -> u64 {
        self.records_written
    }
}

impl OutputWriter for CsvResultWriter {
    fn flush(&mut self) -> OutputResult<()> {
        self.writer
            .flush()
            .map_err(|e| OutputError::FlushError(format!("Failed to flush: {}", e)))
    }

    fn close(mut self) -> OutputResult<()> {
        self.flush()?;

        let buf_writer = self.writer.into_inner().map_err(|e| {
            OutputError::IoError(format!("Failed to get inner writer: {}", e))
        })?;

        let file = buf_writer.into_inner().map_err(|e| {
            OutputError::IoError(format!("Failed to get file handle: {}", e))
        })?;

        file.sync_all()
            .map_err(|e| OutputError::IoError(format!("Failed to sync file: {}", e)))?;

        debug!("CSV writer closed: {} records written", self.records_written);
        Ok(())
    }
}

fn ensure_parent(path: &Path) -> OutputResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| OutputError::IoError(format!("Failed to create directory: {}", e)))?;
    }
    Ok(())
}

/// Directory of per-edition CSV files
#[derive(Debug, Clone)]
pub struct CsvResultStore {
    data_dir: PathBuf,
}

impl CsvResultStore {
    /// Create a store rooted at `data_dir`
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Directory holding the files
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// File name of an edition
    pub fn file_name(edition: u32) -> String {
        format!("wordle.{}.api.csv", edition)
    }

    /// Path of an edition's file
    pub fn path_for(&self, edition: u32) -> PathBuf {
        self.data_dir.join(Self::file_name(edition))
    }

    /// Read every committed record of an edition, in file order
    ///
    /// # Errors
    /// Returns an error if the file exists but holds a malformed row
    pub fn read_edition(&self, edition: u32) -> OutputResult<Vec<ResultRecord>> {
        let path = self.path_for(edition);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = ReaderBuilder::new()
            .from_path(&path)
            .map_err(|e| OutputError::IoError(format!("Failed to open {}: {}", path.display(), e)))?;

        reader
            .deserialize::<ResultRow>()
            .map(|row| {
                let row =
                    row.map_err(|e| OutputError::CsvError(format!("Failed to read row: {}", e)))?;
                ResultRecord::try_from(row)
            })
            .collect()
    }
}

impl CheckpointStore for CsvResultStore {
    fn last_committed(&self, edition: u32) -> OutputResult<Option<Checkpoint>> {
        let path = self.path_for(edition);
        let is_empty = std::fs::metadata(&path).map(|m| m.len() == 0).unwrap_or(true);
        if is_empty {
            debug!(edition, "No stored rows, starting fresh");
            return Ok(None);
        }

        let mut reader = ReaderBuilder::new()
            .from_path(&path)
            .map_err(|e| OutputError::IoError(format!("Failed to open {}: {}", path.display(), e)))?;

        let headers = reader
            .headers()
            .map_err(|e| OutputError::CsvError(format!("Failed to read header: {}", e)))?
            .clone();
        let column = headers.iter().position(|h| h == "post_id").ok_or_else(|| {
            OutputError::CsvError(format!("{} has no post_id column", path.display()))
        })?;

        let mut last = None;
        for row in reader.records() {
            let row = row.map_err(|e| OutputError::CsvError(format!("Failed to read row: {}", e)))?;
            last = Some(row);
        }

        let Some(row) = last else {
            return Ok(None);
        };
        let post_id = row
            .get(column)
            .and_then(|value| value.trim().parse::<u64>().ok())
            .ok_or_else(|| {
                OutputError::CsvError(format!("Invalid post_id in last row of {}", path.display()))
            })?;

        Ok(Some(Checkpoint::new(edition, post_id)))
    }

    fn write_batch(
        &mut self,
        edition: u32,
        records: &[ResultRecord],
        mode: RunMode,
    ) -> OutputResult<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        let path = self.path_for(edition);
        let mut writer = match mode {
            RunMode::Fresh => CsvResultWriter::create(&path)?,
            RunMode::Continuation => CsvResultWriter::append(&path)?,
        };

        for record in records {
            writer.write_record(record)?;
        }
        writer.close()?;

        info!(
            edition,
            records = records.len(),
            ?mode,
            "Flushed batch to {}",
            path.display()
        );
        Ok(records.len())
    }
}
