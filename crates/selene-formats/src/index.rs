//! Sparse timestamp index
//!
//! The full builder appends one entry per [`STRIDE`] records after the
//! record blob. Entry *i* pairs the timestamp of record `i * STRIDE` with
//! that record's file offset, so a binary search over the index narrows a
//! lookup to a single stride group.

use crate::error::{FormatError, FormatResult};
use crate::header::EphemerisHeader;
use crate::record::Record;
use binrw::io::{Read, Seek, Write};
use binrw::{BinRead, BinWrite};

/// Number of records summarized by one index entry
pub const STRIDE: u32 = 10;

/// Encoded width of one index entry in bytes
pub const INDEX_ENTRY_SIZE: usize = 8;

/// Number of index entries written for `record_count` records
pub fn entry_count(record_count: u32) -> u32 {
    record_count.div_ceil(STRIDE)
}

/// Whether every index entry offset for `record_count` records fits in `u32`
pub fn offsets_fit(record_count: u32) -> bool {
    let Some(last) = record_count.checked_sub(1) else {
        return true;
    };
    let last_entry = last / STRIDE * STRIDE;
    EphemerisHeader::record_offset(last_entry) <= u64::from(u32::MAX)
}

/// Index entry (8 bytes, host byte order)
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, BinWrite)]
pub struct IndexEntry {
    /// Timestamp of the first record in the stride group
    pub timestamp: u32,
    /// File offset of that record
    pub offset: u32,
}

/// In-memory sparse index
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SparseIndex {
    entries: Vec<IndexEntry>,
}

impl SparseIndex {
    /// Build the index for an ordered record slice
    pub fn from_records(records: &[Record]) -> Self {
        let entries = records
            .iter()
            .enumerate()
            .step_by(STRIDE as usize)
            .map(|(position, record)| IndexEntry {
                timestamp: record.timestamp,
                offset: EphemerisHeader::record_offset(position as u32) as u32,
            })
            .collect();
        Self { entries }
    }

    /// Wrap entries read from storage, checking the index invariants
    pub fn from_entries(entries: Vec<IndexEntry>) -> FormatResult<Self> {
        let index = Self { entries };
        index.validate()?;
        Ok(index)
    }

    /// Read `count` entries in the host's byte order
    pub fn read_from<R: Read + Seek>(reader: &mut R, count: u32) -> FormatResult<Self> {
        let mut entries = Vec::with_capacity(count as usize);
        for _ in 0..count {
            entries.push(IndexEntry::read_ne(reader)?);
        }
        Self::from_entries(entries)
    }

    /// Write all entries in the host's byte order
    pub fn write_into<W: Write + Seek>(&self, writer: &mut W) -> FormatResult<()> {
        for entry in &self.entries {
            entry.write_ne(writer)?;
        }
        Ok(())
    }

    /// Check ordering and stride invariants
    ///
    /// Timestamps and offsets must be strictly ascending and entry *i* must
    /// point at record `i * STRIDE`.
    pub fn validate(&self) -> FormatResult<()> {
        for (i, entry) in self.entries.iter().enumerate() {
            let expected = EphemerisHeader::record_offset(i as u32 * STRIDE);
            if u64::from(entry.offset) != expected {
                return Err(FormatError::InvalidIndex(format!(
                    "entry {i} points at offset {}, expected {expected}",
                    entry.offset
                )));
            }
        }

        for (i, pair) in self.entries.windows(2).enumerate() {
            if pair[1].timestamp <= pair[0].timestamp {
                return Err(FormatError::InvalidIndex(format!(
                    "entry {} timestamp {} does not exceed entry {i} timestamp {}",
                    i + 1,
                    pair[1].timestamp,
                    pair[0].timestamp
                )));
            }
        }

        Ok(())
    }

    /// Index of the last entry whose timestamp is `<= timestamp`
    ///
    /// `None` when `timestamp` precedes the first entry.
    pub fn floor_group(&self, timestamp: u32) -> Option<usize> {
        let upper = self.entries.partition_point(|e| e.timestamp <= timestamp);
        upper.checked_sub(1)
    }

    /// All entries
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
