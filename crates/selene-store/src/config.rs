//! Configuration for ephemeris stores

use crate::epoch::EpochConfig;
use crate::error::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Neighborhood scan radius, in records, for direct-offset lookups
pub const DEFAULT_SEARCH_RADIUS: u32 = 300;

/// Configuration for opening and querying a store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Records scanned on each side of the computed slot when the direct
    /// offset misses
    pub search_radius: u32,

    /// Load the trailing sparse index when the file carries one
    pub use_index: bool,

    /// Wall-clock translation
    pub epoch: EpochConfig,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            search_radius: DEFAULT_SEARCH_RADIUS,
            use_index: true,
            epoch: EpochConfig::default(),
        }
    }
}

impl StoreConfig {
    /// Load configuration from a JSON file; missing fields take defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| StoreError::ConfigLoad {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text)?;
        config.epoch.warn_if_corrected();
        Ok(config)
    }

    /// Set the neighborhood scan radius
    #[must_use]
    pub const fn with_search_radius(mut self, radius: u32) -> Self {
        self.search_radius = radius;
        self
    }

    /// Enable or disable sparse index loading
    #[must_use]
    pub const fn with_index(mut self, enable: bool) -> Self {
        self.use_index = enable;
        self
    }

    /// Set the epoch translation
    #[must_use]
    pub const fn with_epoch(mut self, epoch: EpochConfig) -> Self {
        self.epoch = epoch;
        self
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.search_radius, 300);
        assert!(config.use_index);
        assert_eq!(config.epoch, EpochConfig::default());
    }

    #[test]
    fn test_builder_setters() {
        let config = StoreConfig::default()
            .with_search_radius(5)
            .with_index(false)
            .with_epoch(EpochConfig::legacy_rtc());
        assert_eq!(config.search_radius, 5);
        assert!(!config.use_index);
        assert_eq!(config.epoch.correction_seconds, 3260);
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("selene.json");
        std::fs::write(&path, r#"{ "search_radius": 12 }"#).unwrap();

        let config = StoreConfig::from_json_file(&path).unwrap();
        assert_eq!(config, StoreConfig::default().with_search_radius(12));
    }

    #[test]
    fn test_from_json_file_errors() {
        let dir = tempfile::tempdir().unwrap();

        let missing = dir.path().join("missing.json");
        assert!(matches!(
            StoreConfig::from_json_file(&missing),
            Err(StoreError::ConfigLoad { .. })
        ));

        let invalid = dir.path().join("invalid.json");
        std::fs::write(&invalid, "{ not json").unwrap();
        assert!(matches!(
            StoreConfig::from_json_file(&invalid),
            Err(StoreError::InvalidConfig(_))
        ));
    }
}
