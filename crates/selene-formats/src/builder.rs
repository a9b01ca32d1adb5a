//! Builder for ephemeris files
//!
//! The builder collects ordered records, derives the header fields at build
//! time and writes header, record blob and (optionally) the sparse index in
//! one pass. A failed build leaves the destination in an unspecified state;
//! callers should discard it.

use crate::error::{FormatError, FormatResult};
use crate::header::{DEFAULT_TIME_STEP, EphemerisHeader, HEADER_SIZE};
use crate::index::{self, INDEX_ENTRY_SIZE, SparseIndex};
use crate::record::{RECORD_SIZE, Record};
use binrw::io::Cursor;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

/// Summary of a completed build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildStats {
    /// Records written
    pub record_count: u32,
    /// Sparse index entries written (0 without an index)
    pub index_count: u32,
    /// Time step stored in the header
    pub time_step: u32,
    /// First record timestamp
    pub start_timestamp: u32,
    /// Last record timestamp
    pub end_timestamp: u32,
    /// Total bytes written
    pub bytes_written: u64,
}

/// Builder for constructing ephemeris files
///
/// Defaults: sparse index on, time step estimated from the first two records.
#[derive(Debug, Clone)]
pub struct EphemerisBuilder {
    records: Vec<Record>,
    with_index: bool,
    time_step: Option<u32>,
}

impl EphemerisBuilder {
    /// Create a new builder with default settings
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            with_index: true,
            time_step: None,
        }
    }

    /// Enable or disable the trailing sparse index
    #[must_use]
    pub fn with_index(mut self, enable: bool) -> Self {
        self.with_index = enable;
        self
    }

    /// Store `seconds` as the time step instead of estimating it
    #[must_use]
    pub fn time_step(mut self, seconds: u32) -> Self {
        self.time_step = Some(seconds);
        self
    }

    /// Append one record; records must arrive in timestamp order
    pub fn add_record(&mut self, record: Record) -> &mut Self {
        self.records.push(record);
        self
    }

    /// Append records in timestamp order
    #[must_use]
    pub fn extend(mut self, records: impl IntoIterator<Item = Record>) -> Self {
        self.records.extend(records);
        self
    }

    /// Records collected so far
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Step stored in the header
    ///
    /// `ts[1] - ts[0]` when two or more records exist, one hour otherwise. This
    /// is a hint; later records may deviate from it.
    pub fn estimated_time_step(&self) -> u32 {
        if let Some(step) = self.time_step {
            return step;
        }
        match self.records.as_slice() {
            [first, second, ..] => second.timestamp.saturating_sub(first.timestamp),
            _ => DEFAULT_TIME_STEP,
        }
    }

    /// Header describing the collected records
    pub fn header(&self) -> FormatResult<EphemerisHeader> {
        let (Some(first), Some(last)) = (self.records.first(), self.records.last()) else {
            return Err(FormatError::EmptyInput);
        };
        let count = check_capacity(self.records.len(), self.with_index)?;

        let header = EphemerisHeader::new(
            count,
            first.timestamp,
            last.timestamp,
            self.estimated_time_step(),
        );
        header.validate_strict()?;
        Ok(header)
    }

    /// Write the complete file image to `writer`
    pub fn write_to<W: Write>(&self, writer: &mut W) -> FormatResult<BuildStats> {
        let header = self.header()?;
        let mut head = Cursor::new(Vec::with_capacity(HEADER_SIZE));
        header.write_into(&mut head)?;
        writer.write_all(head.get_ref())?;

        let mut blob = Vec::with_capacity(self.records.len() * RECORD_SIZE);
        for record in &self.records {
            blob.extend_from_slice(&record.encode());
        }
        writer.write_all(&blob)?;

        let mut index_count = 0;
        if self.with_index {
            let index = SparseIndex::from_records(&self.records);
            let mut tail = Cursor::new(Vec::with_capacity(index.len() * INDEX_ENTRY_SIZE));
            index.write_into(&mut tail)?;
            writer.write_all(tail.get_ref())?;
            index_count = index.len() as u32;
        }

        let bytes_written = HEADER_SIZE as u64
            + blob.len() as u64
            + u64::from(index_count) * INDEX_ENTRY_SIZE as u64;

        Ok(BuildStats {
            record_count: header.record_count,
            index_count,
            time_step: header.time_step_seconds,
            start_timestamp: header.start_timestamp,
            end_timestamp: header.end_timestamp,
            bytes_written,
        })
    }

    /// Build into a byte vector
    pub fn build(&self) -> FormatResult<Vec<u8>> {
        let mut out = Vec::new();
        self.write_to(&mut out)?;
        Ok(out)
    }

    /// Create or truncate `path` and write the file
    pub fn build_file(&self, path: impl AsRef<Path>) -> FormatResult<BuildStats> {
        let path = path.as_ref();
        // Validate before touching the destination
        self.header()?;

        debug!("Writing ephemeris file {}", path.display());
        let mut writer = BufWriter::new(File::create(path)?);
        let stats = self.write_to(&mut writer)?;
        writer.flush()?;

        info!(
            "Ephemeris file created: {} records, {} index entries, step {}s, {} bytes",
            stats.record_count, stats.index_count, stats.time_step, stats.bytes_written
        );
        Ok(stats)
    }
}

/// Record count as stored in the header
///
/// Counts beyond `u32` are rejected, and so are counts whose last index
/// entry would point past the 32-bit offset range when an index is written.
fn check_capacity(record_count: usize, with_index: bool) -> FormatResult<u32> {
    let count =
        u32::try_from(record_count).map_err(|_| FormatError::TooManyRecords(record_count))?;
    if with_index && !index::offsets_fit(count) {
        return Err(FormatError::TooManyRecords(record_count));
    }
    Ok(count)
}

impl Default for EphemerisBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Build `path` from ordered records with the sparse index enabled
pub fn build(
    records: impl IntoIterator<Item = Record>,
    path: impl AsRef<Path>,
) -> FormatResult<BuildStats> {
    EphemerisBuilder::new().extend(records).build_file(path)
}
