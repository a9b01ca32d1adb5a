//! Ephemeris store handle.
//!
//! An [`EphemerisStore`] exclusively owns its record source and the
//! single-slot query cache. `close` drops both; every later call fails with
//! [`StoreError::Closed`].

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::source::{OpenSource, PagedSource, RecordSource, ResidentSource};
use selene_formats::{EphemerisHeader, Record};
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// Store that keeps every record in memory
pub type ResidentStore = EphemerisStore<ResidentSource>;

/// Store that reads records from the backing file on demand
pub type PagedStore<R = File> = EphemerisStore<PagedSource<R>>;

/// Paged store over a file on disk
pub type PagedFileStore = PagedStore<File>;

/// Open ephemeris store
#[derive(Debug)]
pub struct EphemerisStore<S> {
    pub(crate) source: Option<S>,
    pub(crate) cache: Option<(u32, Record)>,
    pub(crate) config: StoreConfig,
}

impl<S: RecordSource> EphemerisStore<S> {
    /// Wrap an already validated source
    pub fn new(source: S, config: &StoreConfig) -> Self {
        Self {
            source: Some(source),
            cache: None,
            config: config.clone(),
        }
    }

    /// Release the source, index and cache
    ///
    /// Closing twice is a no-op.
    pub fn close(&mut self) {
        if self.source.take().is_some() {
            debug!("Ephemeris store closed");
        }
        self.cache = None;
    }

    /// Whether `close` has been called
    pub fn is_closed(&self) -> bool {
        self.source.is_none()
    }

    /// Record source
    pub fn source(&self) -> StoreResult<&S> {
        self.source.as_ref().ok_or(StoreError::Closed)
    }

    /// Header copy
    pub fn header(&self) -> StoreResult<&EphemerisHeader> {
        Ok(self.source()?.header())
    }

    /// First timestamp in the file
    pub fn start_time(&self) -> StoreResult<u32> {
        Ok(self.header()?.start_timestamp)
    }

    /// Last timestamp in the file
    pub fn end_time(&self) -> StoreResult<u32> {
        Ok(self.header()?.end_timestamp)
    }

    /// Nominal step between regular records
    pub fn time_step(&self) -> StoreResult<u32> {
        Ok(self.header()?.time_step_seconds)
    }

    /// Number of records the header declares
    pub fn record_count(&self) -> StoreResult<u32> {
        Ok(self.header()?.record_count)
    }

    /// Whether queries use the sparse index
    pub fn has_index(&self) -> StoreResult<bool> {
        Ok(self.source()?.index().is_some())
    }

    /// Neighborhood scan radius for direct-offset lookups
    pub fn search_radius(&self) -> u32 {
        self.config.search_radius
    }

    /// Configuration the store was opened with
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Timestamp held by the cache slot, if any
    pub fn cached_timestamp(&self) -> Option<u32> {
        self.cache.map(|(timestamp, _)| timestamp)
    }

    pub(crate) fn parts_mut(&mut self) -> StoreResult<(&mut S, &mut Option<(u32, Record)>)> {
        match self.source.as_mut() {
            Some(source) => Ok((source, &mut self.cache)),
            None => Err(StoreError::Closed),
        }
    }
}

impl<S: OpenSource> EphemerisStore<S> {
    /// Open `path` with default configuration
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::open_with_config(path, &StoreConfig::default())
    }

    /// Open `path`; no store exists unless the header validates
    pub fn open_with_config(path: impl AsRef<Path>, config: &StoreConfig) -> StoreResult<Self> {
        let source = S::open_path(path.as_ref(), config)?;
        Ok(Self::new(source, config))
    }

    /// Close the current source and open `path` in its place
    ///
    /// The cache is invalidated even if opening fails; the store then stays
    /// closed.
    pub fn reopen(&mut self, path: impl AsRef<Path>) -> StoreResult<()> {
        self.close();
        self.source = Some(S::open_path(path.as_ref(), &self.config)?);
        Ok(())
    }
}

impl<R: std::io::Read + std::io::Seek> PagedStore<R> {
    /// Open a paged store over any seekable reader
    pub fn from_reader(reader: R, config: &StoreConfig) -> StoreResult<Self> {
        let source = PagedSource::from_reader(reader, config.use_index)?;
        Ok(Self::new(source, config))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use selene_formats::EphemerisBuilder;
    use std::io::Cursor;

    fn image() -> Vec<u8> {
        let records = (0..5).map(|i| Record {
            timestamp: 100 + i * 10,
            ..Record::default()
        });
        EphemerisBuilder::new().extend(records).build().unwrap()
    }

    #[test]
    fn test_accessors() {
        let store =
            EphemerisStore::from_reader(Cursor::new(image()), &StoreConfig::default()).unwrap();
        assert_eq!(store.start_time().unwrap(), 100);
        assert_eq!(store.end_time().unwrap(), 140);
        assert_eq!(store.time_step().unwrap(), 10);
        assert_eq!(store.record_count().unwrap(), 5);
        assert!(store.has_index().unwrap());
        assert_eq!(store.search_radius(), 300);
    }

    #[test]
    fn test_close_rejects_access() {
        let mut store =
            EphemerisStore::from_reader(Cursor::new(image()), &StoreConfig::default()).unwrap();
        store.close();
        assert!(store.is_closed());
        assert!(matches!(store.start_time(), Err(StoreError::Closed)));
        assert!(matches!(store.header(), Err(StoreError::Closed)));
        store.close();
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.bin");
        assert!(matches!(
            ResidentStore::open(&missing),
            Err(StoreError::Io(_))
        ));
        assert!(matches!(
            PagedFileStore::open(&missing),
            Err(StoreError::Io(_))
        ));
    }

    #[test]
    fn test_reopen_invalidates_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("moon.bin");
        std::fs::write(&path, image()).unwrap();

        let mut store = PagedFileStore::open(&path).unwrap();
        assert!(store.find_exact(120).unwrap().is_some());
        assert_eq!(store.cached_timestamp(), Some(120));

        store.reopen(&path).unwrap();
        assert_eq!(store.cached_timestamp(), None);
        assert!(!store.is_closed());

        let missing = dir.path().join("missing.bin");
        assert!(store.reopen(&missing).is_err());
        assert!(store.is_closed());
    }
}
