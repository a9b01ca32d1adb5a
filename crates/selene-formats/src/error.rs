//! Error types for ephemeris format encoding, decoding and building

use thiserror::Error;

/// Errors that can occur when encoding, decoding or building ephemeris files
#[derive(Debug, Error)]
pub enum FormatError {
    /// Buffer is shorter than the fixed structure width
    #[error("buffer too short: got {actual} bytes, need {expected}")]
    BufferTooShort {
        /// Actual buffer length
        actual: usize,
        /// Required length
        expected: usize,
    },

    /// Magic constant does not identify an ephemeris file
    #[error("Invalid ephemeris magic: expected 0x{expected:08X}, got 0x{actual:08X}")]
    InvalidMagic {
        /// Magic the format requires
        expected: u32,
        /// Magic found in the data
        actual: u32,
    },

    /// Unsupported format version
    #[error("Unsupported ephemeris version: {0}")]
    UnsupportedVersion(u32),

    /// Declared record width differs from the encoded record width
    #[error("Record size mismatch: header declares {declared}, expected {expected}")]
    RecordSizeMismatch {
        /// Width declared in the header
        declared: u32,
        /// Actual encoded width
        expected: u32,
    },

    /// Build requested with no usable records
    #[error("Cannot build an ephemeris file from zero records")]
    EmptyInput,

    /// Record count does not fit the 32-bit header field
    #[error("Too many records for the format: {0}")]
    TooManyRecords(usize),

    /// Sparse index violates its ordering or stride invariants
    #[error("Invalid sparse index: {0}")]
    InvalidIndex(String),

    /// Serial packet does not start with the packet magic
    #[error("Invalid packet magic: 0x{0:04X}")]
    InvalidPacketMagic(u16),

    /// Serial packet length field disagrees with the record width
    #[error("Packet length mismatch: declared {declared}, expected {expected}")]
    PacketLengthMismatch {
        /// Length carried by the packet
        declared: u16,
        /// Record width
        expected: u16,
    },

    /// Serial packet checksum does not match its record
    #[error("Checksum mismatch: packet carries 0x{stored:04X}, record sums to 0x{computed:04X}")]
    ChecksumMismatch {
        /// Checksum carried by the packet
        stored: u16,
        /// Checksum computed from the record
        computed: u16,
    },

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// `BinRw` parsing/writing error
    #[error("Binary format error: {0}")]
    BinRw(#[from] binrw::Error),
}

/// Result type for ephemeris format operations
pub type FormatResult<T> = Result<T, FormatError>;
