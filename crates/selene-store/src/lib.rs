//! Readers and temporal queries for Selene ephemeris files.
//!
//! A store opens a file produced by [`selene_formats::EphemerisBuilder`],
//! validates its header and answers three kinds of query:
//!
//! - `find_exact`: the record stored at exactly a timestamp
//! - `interpolate`: a record at any timestamp inside the file's range,
//!   blended from the bracketing samples when no exact record exists
//! - `next_event`: the first record at or after a timestamp carrying an
//!   event code
//!
//! # Architecture
//!
//! - `source`: record access, either fully resident or paged from disk
//! - `store`: the store handle, its lifecycle and the single-slot cache
//! - `query`: index and direct-offset search paths and the query operations
//! - `config`: store configuration, loadable from JSON
//! - `epoch`: translation between wall-clock time and store timestamps
//!
//! # Example
//!
//! ```no_run
//! use selene_store::{PagedFileStore, StoreConfig};
//!
//! let config = StoreConfig::default();
//! let mut store = PagedFileStore::open_with_config("moon.bin", &config)?;
//!
//! let now = config.epoch.from_datetime(chrono::Utc::now()).unwrap_or_default();
//! if let Some(record) = store.interpolate(now)? {
//!     println!("{record}");
//! }
//! # Ok::<(), selene_store::StoreError>(())
//! ```

#![warn(missing_docs)]
#![allow(clippy::cast_precision_loss)] // Interpolation fractions are f32
#![allow(clippy::cast_lossless)] // Sometimes clearer than From
#![allow(clippy::uninlined_format_args)] // Backwards compatibility
#![allow(clippy::float_cmp)] // Exact sample values in tests

pub mod config;
pub mod epoch;
pub mod error;
pub mod query;
pub mod source;
pub mod store;

pub use config::{DEFAULT_SEARCH_RADIUS, StoreConfig};
pub use epoch::{DEFAULT_UNIX_OFFSET, EpochConfig, LEGACY_RTC_CORRECTION_SECONDS};
pub use error::{StoreError, StoreResult};
pub use query::{align, expected_position, interpolate_between};
pub use source::{OpenSource, PagedSource, RecordSource, ResidentSource};
pub use store::{EphemerisStore, PagedFileStore, PagedStore, ResidentStore};

pub use selene_formats::{Body, DistanceEvent, Event, Record};
