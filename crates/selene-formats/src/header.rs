//! Ephemeris file header
//!
//! The header sits at offset 0 and is written once by the builder.
//!
//! Layout (32 bytes, host byte order):
//! ```text
//! offset 0x00: u32 magic              (0x45504845, "EPHE")
//! offset 0x04: u32 version            (1)
//! offset 0x08: u32 record_count
//! offset 0x0C: u32 record_size        (28)
//! offset 0x10: u32 start_timestamp
//! offset 0x14: u32 end_timestamp
//! offset 0x18: u32 time_step_seconds  (hint, not a guarantee)
//! offset 0x1C: u32 reserved
//! ```

use crate::error::{FormatError, FormatResult};
use crate::record::RECORD_SIZE;
use binrw::io::{Read, Seek, Write};
use binrw::{BinRead, BinWrite};

/// Magic constant identifying the format ("EPHE")
pub const EPHEMERIS_MAGIC: u32 = 0x4550_4845;

/// Current format version
pub const EPHEMERIS_VERSION: u32 = 1;

/// Encoded header width in bytes
pub const HEADER_SIZE: usize = 32;

/// Time step stored when fewer than two records are available (one hour)
pub const DEFAULT_TIME_STEP: u32 = 3600;

/// Ephemeris file header
///
/// Endianness is supplied at read/write time; use [`EphemerisHeader::read_from`]
/// and [`EphemerisHeader::write_into`] for the native order the format uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, BinWrite)]
pub struct EphemerisHeader {
    /// Magic number for file identification
    pub magic: u32,

    /// File format version
    pub version: u32,

    /// Number of records following the header
    pub record_count: u32,

    /// Width of each record in bytes
    pub record_size: u32,

    /// First timestamp in the dataset
    pub start_timestamp: u32,

    /// Last timestamp in the dataset
    pub end_timestamp: u32,

    /// Nominal step between regular records
    pub time_step_seconds: u32,

    /// Reserved for future fields
    pub reserved: u32,
}

/// Outcome of a lenient header check that still accepted the header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderWarning {
    /// Declared record width differs from [`RECORD_SIZE`]
    RecordSizeMismatch {
        /// Width declared in the header
        declared: u32,
        /// Actual encoded width
        expected: u32,
    },
}

impl EphemerisHeader {
    /// Create a header for `record_count` records spanning `start..=end`
    pub fn new(
        record_count: u32,
        start_timestamp: u32,
        end_timestamp: u32,
        time_step: u32,
    ) -> Self {
        Self {
            magic: EPHEMERIS_MAGIC,
            version: EPHEMERIS_VERSION,
            record_count,
            record_size: RECORD_SIZE as u32,
            start_timestamp,
            end_timestamp,
            time_step_seconds: time_step,
            reserved: 0,
        }
    }

    /// Read a header in the host's byte order
    pub fn read_from<R: Read + Seek>(reader: &mut R) -> FormatResult<Self> {
        Ok(Self::read_ne(reader)?)
    }

    /// Write the header in the host's byte order
    pub fn write_into<W: Write + Seek>(&self, writer: &mut W) -> FormatResult<()> {
        self.write_ne(writer)?;
        Ok(())
    }

    /// Validate every field the format fixes, including the record width
    ///
    /// Used by the builder and the resident reader.
    pub fn validate_strict(&self) -> FormatResult<()> {
        if let Some(warning) = self.validate_tolerant()? {
            let HeaderWarning::RecordSizeMismatch { declared, expected } = warning;
            return Err(FormatError::RecordSizeMismatch { declared, expected });
        }
        Ok(())
    }

    /// Validate magic and version; report a record width mismatch as a warning
    ///
    /// Used by the paged reader, which keeps going on a width mismatch.
    pub fn validate_tolerant(&self) -> FormatResult<Option<HeaderWarning>> {
        if self.magic != EPHEMERIS_MAGIC {
            return Err(FormatError::InvalidMagic {
                expected: EPHEMERIS_MAGIC,
                actual: self.magic,
            });
        }

        if self.version != EPHEMERIS_VERSION {
            return Err(FormatError::UnsupportedVersion(self.version));
        }

        if self.record_size != RECORD_SIZE as u32 {
            return Ok(Some(HeaderWarning::RecordSizeMismatch {
                declared: self.record_size,
                expected: RECORD_SIZE as u32,
            }));
        }

        Ok(None)
    }

    /// Byte length of the record blob
    pub fn records_len(&self) -> u64 {
        u64::from(self.record_count) * RECORD_SIZE as u64
    }

    /// File offset of the record at `position`
    pub fn record_offset(position: u32) -> u64 {
        HEADER_SIZE as u64 + u64::from(position) * RECORD_SIZE as u64
    }

    /// File offset where the optional sparse index begins
    pub fn index_offset(&self) -> u64 {
        HEADER_SIZE as u64 + self.records_len()
    }

    /// Whether `timestamp` lies in `[start_timestamp, end_timestamp]`
    pub fn contains(&self, timestamp: u32) -> bool {
        (self.start_timestamp..=self.end_timestamp).contains(&timestamp)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use binrw::io::Cursor;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_header_new() {
        let header = EphemerisHeader::new(3, 1000, 1120, 60);
        assert_eq!(header.magic, EPHEMERIS_MAGIC);
        assert_eq!(header.version, 1);
        assert_eq!(header.record_size, 28);
        assert_eq!(header.reserved, 0);
        assert!(header.validate_strict().is_ok());
    }

    fn written(header: &EphemerisHeader) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        header.write_into(&mut cursor).unwrap();
        cursor.into_inner()
    }

    #[test]
    fn test_header_write_layout() {
        let header = EphemerisHeader::new(42, 10, 20, 5);
        let bytes = written(&header);
        assert_eq!(bytes.len(), HEADER_SIZE);

        let words: Vec<u32> = bytes
            .chunks_exact(4)
            .map(|chunk| u32::from_ne_bytes(chunk.try_into().unwrap()))
            .collect();
        assert_eq!(words, vec![EPHEMERIS_MAGIC, 1, 42, 28, 10, 20, 5, 0]);

        let parsed = EphemerisHeader::read_from(&mut Cursor::new(&bytes)).unwrap();
        assert_eq!(parsed, header);
    }

    #[test]
    fn test_magic_is_first_field() {
        let bytes = written(&EphemerisHeader::new(1, 0, 0, 0));
        assert_eq!(&bytes[0..4], &0x4550_4845u32.to_ne_bytes());
    }

    #[test]
    fn test_reject_bad_magic() {
        let mut header = EphemerisHeader::new(1, 0, 0, 60);
        header.magic = 0xDEAD_BEEF;
        assert!(matches!(
            header.validate_tolerant(),
            Err(FormatError::InvalidMagic {
                actual: 0xDEAD_BEEF,
                ..
            })
        ));
        assert!(header.validate_strict().is_err());
    }

    #[test]
    fn test_reject_unsupported_version() {
        let mut header = EphemerisHeader::new(1, 0, 0, 60);
        header.version = 2;
        assert!(matches!(
            header.validate_tolerant(),
            Err(FormatError::UnsupportedVersion(2))
        ));
    }

    #[test]
    fn test_record_size_leniency_is_asymmetric() {
        let mut header = EphemerisHeader::new(1, 0, 0, 60);
        header.record_size = 32;

        assert_eq!(
            header.validate_tolerant().unwrap(),
            Some(HeaderWarning::RecordSizeMismatch {
                declared: 32,
                expected: 28
            })
        );
        assert!(matches!(
            header.validate_strict(),
            Err(FormatError::RecordSizeMismatch {
                declared: 32,
                expected: 28
            })
        ));
    }

    #[test]
    fn test_offsets() {
        let header = EphemerisHeader::new(25, 0, 0, 60);
        assert_eq!(EphemerisHeader::record_offset(0), 32);
        assert_eq!(EphemerisHeader::record_offset(2), 32 + 56);
        assert_eq!(header.index_offset(), 32 + 25 * 28);
        assert!(header.contains(0));
        assert!(!header.contains(1));
    }
}
