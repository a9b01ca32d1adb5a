//! Binary ephemeris file format
//!
#![allow(clippy::cast_possible_truncation)] // Intentional for binary format parsing
#![allow(clippy::cast_lossless)] // Sometimes clearer than From
#![allow(clippy::cast_precision_loss)] // Sample values are f32
#![allow(clippy::float_cmp)] // Binary format requirements
#![allow(clippy::uninlined_format_args)] // Backwards compatibility
#![allow(clippy::return_self_not_must_use)] // Builder patterns
//! This crate defines the on-disk layout shared by every Selene reader and
//! writer, and the builder that produces it.
//!
//! # File Layout
//!
//! ```text
//! offset 0          : Header (8 × u32 = 32 bytes)
//! offset 32         : record_count × Record (28 bytes each)
//! offset 32 + N*28  : [optional] ceil(N / 10) × IndexEntry (8 bytes each)
//! ```
//!
//! All integers and floats use the byte order of the host that wrote the
//! file. The format does not declare its endianness; a file built on a
//! little-endian host is only readable on little-endian hosts.
//!
//! # Building
//!
//! ```rust,no_run
//! use selene_formats::{EphemerisBuilder, Record};
//!
//! let records = vec![
//!     Record { timestamp: 1000, phase: 0.1, ..Record::default() },
//!     Record { timestamp: 1060, phase: 0.2, ..Record::default() },
//! ];
//! let stats = EphemerisBuilder::new().extend(records).build_file("moon.bin")?;
//! println!("{} records, step {}s", stats.record_count, stats.time_step);
//! # Ok::<(), selene_formats::FormatError>(())
//! ```

#![warn(missing_docs)]

/// File builder
pub mod builder;
/// Error types
pub mod error;
pub mod header;
pub mod index;
pub mod packet;
pub mod record;
pub mod table;

pub use builder::{BuildStats, EphemerisBuilder, build};
pub use error::{FormatError, FormatResult};
pub use header::{
    DEFAULT_TIME_STEP, EPHEMERIS_MAGIC, EPHEMERIS_VERSION, EphemerisHeader, HEADER_SIZE,
    HeaderWarning,
};
pub use index::{INDEX_ENTRY_SIZE, IndexEntry, STRIDE, SparseIndex};
pub use packet::{CelestialPacket, PACKET_MAGIC, PACKET_SIZE};
pub use record::{Body, DistanceEvent, Event, RECORD_SIZE, Record};
pub use table::{TableRead, parse_row, read_table};
