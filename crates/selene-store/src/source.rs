//! Record sources backing a store.
//!
//! A source owns the validated header, the optional sparse index and access
//! to the records themselves. Two implementations trade memory for I/O:
//!
//! - [`ResidentSource`] reads the whole record blob at open time and applies
//!   the strict header policy.
//! - [`PagedSource`] keeps only the header and index resident and reads one
//!   record per seek. It applies the tolerant policy: a record width
//!   mismatch is logged and the file is still served.

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use selene_formats::{
    EphemerisHeader, HEADER_SIZE, INDEX_ENTRY_SIZE, RECORD_SIZE, Record, SparseIndex, index,
};
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use tracing::{debug, info, warn};

/// Random access to the records of one ephemeris file.
pub trait RecordSource {
    /// Validated header
    fn header(&self) -> &EphemerisHeader;

    /// Sparse index, when the file carries a valid one and loading was enabled
    fn index(&self) -> Option<&SparseIndex>;

    /// Record at `position`, `None` past the last readable record
    fn record_at(&mut self, position: u32) -> StoreResult<Option<Record>>;
}

/// Sources that can be opened from a path.
pub trait OpenSource: RecordSource + Sized {
    /// Open and validate `path`
    fn open_path(path: &Path, config: &StoreConfig) -> StoreResult<Self>;
}

/// Header policy applied while opening.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HeaderPolicy {
    Strict,
    Tolerant,
}

/// Header, optional index and total length of a validated file.
struct Layout {
    header: EphemerisHeader,
    index: Option<SparseIndex>,
    file_len: u64,
}

fn read_layout<R: Read + Seek>(
    reader: &mut R,
    policy: HeaderPolicy,
    use_index: bool,
) -> StoreResult<Layout> {
    let file_len = reader.seek(SeekFrom::End(0))?;
    if file_len < HEADER_SIZE as u64 {
        return Err(StoreError::Truncated {
            expected: HEADER_SIZE as u64,
            actual: file_len,
        });
    }

    reader.seek(SeekFrom::Start(0))?;
    let header = EphemerisHeader::read_from(reader)?;

    match policy {
        HeaderPolicy::Strict => header.validate_strict()?,
        HeaderPolicy::Tolerant => {
            if let Some(warning) = header.validate_tolerant()? {
                warn!("Header accepted with warning: {:?}", warning);
            }
        }
    }

    debug!(
        "Header: {} records, range {}..={}, step {}s",
        header.record_count, header.start_timestamp, header.end_timestamp, header.time_step_seconds
    );

    let records_end = header.index_offset();
    if file_len < records_end {
        match policy {
            HeaderPolicy::Strict => {
                return Err(StoreError::Truncated {
                    expected: records_end,
                    actual: file_len,
                });
            }
            HeaderPolicy::Tolerant => warn!(
                "File shorter than header declares: expected {} bytes, found {}",
                records_end, file_len
            ),
        }
    }

    let index = if use_index {
        read_index(reader, &header, file_len)?
    } else {
        None
    };

    Ok(Layout {
        header,
        index,
        file_len,
    })
}

fn read_index<R: Read + Seek>(
    reader: &mut R,
    header: &EphemerisHeader,
    file_len: u64,
) -> StoreResult<Option<SparseIndex>> {
    let count = index::entry_count(header.record_count);
    let index_end = header.index_offset() + u64::from(count) * INDEX_ENTRY_SIZE as u64;
    if count == 0 || file_len < index_end {
        debug!("No sparse index present");
        return Ok(None);
    }

    reader.seek(SeekFrom::Start(header.index_offset()))?;
    match SparseIndex::read_from(reader, count) {
        Ok(index) => {
            debug!("Loaded sparse index with {} entries", index.len());
            Ok(Some(index))
        }
        Err(selene_formats::FormatError::InvalidIndex(reason)) => {
            warn!("Ignoring invalid sparse index: {}", reason);
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

/// Source holding every record in memory.
#[derive(Debug, Clone)]
pub struct ResidentSource {
    header: EphemerisHeader,
    index: Option<SparseIndex>,
    records: Vec<Record>,
}

impl ResidentSource {
    /// Load header, records and index from `reader`
    pub fn from_reader<R: Read + Seek>(reader: &mut R, use_index: bool) -> StoreResult<Self> {
        let layout = read_layout(reader, HeaderPolicy::Strict, use_index)?;

        reader.seek(SeekFrom::Start(HEADER_SIZE as u64))?;
        let mut blob = vec![0u8; layout.header.records_len() as usize];
        reader.read_exact(&mut blob)?;

        let records = blob
            .chunks_exact(RECORD_SIZE)
            .map(Record::decode)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            header: layout.header,
            index: layout.index,
            records,
        })
    }

    /// All records in file order
    pub fn records(&self) -> &[Record] {
        &self.records
    }
}

impl RecordSource for ResidentSource {
    fn header(&self) -> &EphemerisHeader {
        &self.header
    }

    fn index(&self) -> Option<&SparseIndex> {
        self.index.as_ref()
    }

    fn record_at(&mut self, position: u32) -> StoreResult<Option<Record>> {
        Ok(self.records.get(position as usize).copied())
    }
}

impl OpenSource for ResidentSource {
    fn open_path(path: &Path, config: &StoreConfig) -> StoreResult<Self> {
        let mut reader = BufReader::new(File::open(path)?);
        let source = Self::from_reader(&mut reader, config.use_index)?;
        info!(
            "Ephemeris loaded into memory: {} records, step {}s, index {}",
            source.header.record_count,
            source.header.time_step_seconds,
            if source.index.is_some() { "present" } else { "absent" }
        );
        Ok(source)
    }
}

/// Source reading records on demand from a seekable reader.
#[derive(Debug)]
pub struct PagedSource<R> {
    reader: R,
    header: EphemerisHeader,
    index: Option<SparseIndex>,
    file_len: u64,
}

impl<R: Read + Seek> PagedSource<R> {
    /// Validate the header (and load the index) from `reader`
    pub fn from_reader(mut reader: R, use_index: bool) -> StoreResult<Self> {
        let layout = read_layout(&mut reader, HeaderPolicy::Tolerant, use_index)?;
        Ok(Self {
            reader,
            header: layout.header,
            index: layout.index,
            file_len: layout.file_len,
        })
    }

    /// Backing reader
    pub fn get_ref(&self) -> &R {
        &self.reader
    }

    /// Release the source and return the backing reader
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read + Seek> RecordSource for PagedSource<R> {
    fn header(&self) -> &EphemerisHeader {
        &self.header
    }

    fn index(&self) -> Option<&SparseIndex> {
        self.index.as_ref()
    }

    fn record_at(&mut self, position: u32) -> StoreResult<Option<Record>> {
        if position >= self.header.record_count {
            return Ok(None);
        }

        let offset = EphemerisHeader::record_offset(position);
        if offset + RECORD_SIZE as u64 > self.file_len {
            return Ok(None);
        }

        self.reader.seek(SeekFrom::Start(offset))?;
        let mut buf = [0u8; RECORD_SIZE];
        self.reader.read_exact(&mut buf)?;
        Ok(Some(Record::decode(&buf)?))
    }
}

impl OpenSource for PagedSource<File> {
    fn open_path(path: &Path, config: &StoreConfig) -> StoreResult<Self> {
        let source = Self::from_reader(File::open(path)?, config.use_index)?;
        info!(
            "Ephemeris opened: {} records, step {}s, {} bytes, index {}",
            source.header.record_count,
            source.header.time_step_seconds,
            source.file_len,
            if source.index.is_some() { "present" } else { "absent" }
        );
        Ok(source)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use selene_formats::{EPHEMERIS_MAGIC, EphemerisBuilder};
    use std::io::Cursor;

    fn records(count: u32) -> Vec<Record> {
        (0..count)
            .map(|i| Record {
                timestamp: 1000 + i * 60,
                azimuth_deg: i as f32,
                ..Record::default()
            })
            .collect()
    }

    fn image(count: u32, with_index: bool) -> Vec<u8> {
        EphemerisBuilder::new()
            .with_index(with_index)
            .extend(records(count))
            .build()
            .unwrap()
    }

    #[test]
    fn test_resident_loads_all_records() {
        let data = image(23, true);
        let mut source = ResidentSource::from_reader(&mut Cursor::new(&data), true).unwrap();
        assert_eq!(source.records().len(), 23);
        assert_eq!(source.index().unwrap().len(), 3);
        assert_eq!(source.record_at(22).unwrap().unwrap().timestamp, 1000 + 22 * 60);
        assert_eq!(source.record_at(23).unwrap(), None);
    }

    #[test]
    fn test_index_detection() {
        let with = image(15, true);
        let without = image(15, false);

        let paged = PagedSource::from_reader(Cursor::new(with.clone()), true).unwrap();
        assert!(paged.index().is_some());

        let paged = PagedSource::from_reader(Cursor::new(without), true).unwrap();
        assert!(paged.index().is_none());

        let paged = PagedSource::from_reader(Cursor::new(with), false).unwrap();
        assert!(paged.index().is_none());
    }

    #[test]
    fn test_invalid_index_is_dropped() {
        let mut data = image(15, true);
        let index_start = 32 + 15 * 28;
        // Second entry must point at record 10
        data[index_start + 12..index_start + 16].copy_from_slice(&7u32.to_ne_bytes());

        let paged = PagedSource::from_reader(Cursor::new(data), true).unwrap();
        assert!(paged.index().is_none());
    }

    #[test]
    fn test_record_size_policy() {
        let mut data = image(4, false);
        data[12..16].copy_from_slice(&40u32.to_ne_bytes());

        assert!(matches!(
            ResidentSource::from_reader(&mut Cursor::new(&data), true),
            Err(StoreError::RecordSizeMismatch {
                declared: 40,
                expected: 28
            })
        ));

        let mut paged = PagedSource::from_reader(Cursor::new(data), true).unwrap();
        assert_eq!(paged.header().record_size, 40);
        assert_eq!(paged.record_at(3).unwrap().unwrap().timestamp, 1180);
    }

    #[test]
    fn test_truncation_policy() {
        let mut data = image(4, false);
        data.truncate(32 + 2 * 28);

        assert!(matches!(
            ResidentSource::from_reader(&mut Cursor::new(&data), true),
            Err(StoreError::Truncated { .. })
        ));

        let mut paged = PagedSource::from_reader(Cursor::new(data), true).unwrap();
        assert_eq!(paged.record_at(1).unwrap().unwrap().timestamp, 1060);
        assert_eq!(paged.record_at(2).unwrap(), None);
    }

    #[test]
    fn test_header_errors() {
        assert!(matches!(
            PagedSource::from_reader(Cursor::new(vec![0u8; 10]), true),
            Err(StoreError::Truncated {
                expected: 32,
                actual: 10
            })
        ));

        let mut data = image(2, false);
        data[0..4].copy_from_slice(&0x1234_5678u32.to_ne_bytes());
        assert!(matches!(
            PagedSource::from_reader(Cursor::new(data.clone()), true),
            Err(StoreError::InvalidFormat {
                expected: EPHEMERIS_MAGIC,
                actual: 0x1234_5678
            })
        ));

        let mut data = image(2, false);
        data[4..8].copy_from_slice(&9u32.to_ne_bytes());
        assert!(matches!(
            PagedSource::from_reader(Cursor::new(data), true),
            Err(StoreError::UnsupportedVersion(9))
        ));
    }
}
