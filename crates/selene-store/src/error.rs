//! Error types for ephemeris stores.
//!
//! Absence of data is not an error: queries return `Ok(None)` when nothing
//! matches. Errors are reserved for failures that stop an operation.

use selene_formats::FormatError;
use std::path::PathBuf;
use thiserror::Error;

/// Store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Open, read or seek failure on the backing store
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Magic constant mismatch
    #[error("Invalid ephemeris file: expected magic 0x{expected:08X}, got 0x{actual:08X}")]
    InvalidFormat {
        /// Magic the format requires
        expected: u32,
        /// Magic found in the file
        actual: u32,
    },

    /// Format version not understood by this reader
    #[error("Unsupported ephemeris version: {0}")]
    UnsupportedVersion(u32),

    /// Record width mismatch rejected by a strict reader
    #[error("Record size mismatch: header declares {declared}, expected {expected}")]
    RecordSizeMismatch {
        /// Width declared in the header
        declared: u32,
        /// Actual encoded width
        expected: u32,
    },

    /// File is shorter than its header requires
    #[error("Truncated ephemeris file: need {expected} bytes, found {actual}")]
    Truncated {
        /// Bytes the header requires
        expected: u64,
        /// Bytes present
        actual: u64,
    },

    /// Operation attempted after `close`
    #[error("Ephemeris store is closed")]
    Closed,

    /// Other format-level failure
    #[error("Format error: {0}")]
    Format(FormatError),

    /// Configuration file could not be read
    #[error("Failed to load config from {path}: {source}")]
    ConfigLoad {
        /// Path to the config file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid JSON for `StoreConfig`
    #[error("Invalid config: {0}")]
    InvalidConfig(#[from] serde_json::Error),
}

impl From<FormatError> for StoreError {
    fn from(err: FormatError) -> Self {
        match err {
            FormatError::InvalidMagic { expected, actual } => {
                Self::InvalidFormat { expected, actual }
            }
            FormatError::UnsupportedVersion(version) => Self::UnsupportedVersion(version),
            FormatError::RecordSizeMismatch { declared, expected } => {
                Self::RecordSizeMismatch { declared, expected }
            }
            FormatError::Io(err) | FormatError::BinRw(binrw::Error::Io(err)) => Self::Io(err),
            other => Self::Format(other),
        }
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
