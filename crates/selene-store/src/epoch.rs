//! Translation between wall-clock time and store timestamps.
//!
//! Stored timestamps count seconds from a project epoch rather than the Unix
//! epoch. The offset is configuration, not arithmetic baked into callers.
//!
//! Two offsets exist in the wild. The generator and the host tools use
//! 1992-01-04 23:05:37 UTC ([`DEFAULT_UNIX_OFFSET`]). The real-time-clock path
//! of the firmware added a further [`LEGACY_RTC_CORRECTION_SECONDS`] on top.
//! Which one is right has not been settled, so the correction is kept as a
//! separate, explicitly configured value that defaults to zero.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Unix time of the store epoch, 1992-01-04 23:05:37 UTC
pub const DEFAULT_UNIX_OFFSET: i64 = 694_566_337;

/// Extra seconds the firmware's RTC conversion added to the epoch offset
pub const LEGACY_RTC_CORRECTION_SECONDS: i64 = 3260;

/// Epoch translation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EpochConfig {
    /// Unix time of store timestamp zero
    pub unix_offset: i64,

    /// Seconds added to every translated store timestamp
    pub correction_seconds: i64,
}

impl Default for EpochConfig {
    fn default() -> Self {
        Self {
            unix_offset: DEFAULT_UNIX_OFFSET,
            correction_seconds: 0,
        }
    }
}

impl EpochConfig {
    /// Configuration matching the firmware RTC path.
    #[must_use]
    pub const fn legacy_rtc() -> Self {
        Self {
            unix_offset: DEFAULT_UNIX_OFFSET,
            correction_seconds: LEGACY_RTC_CORRECTION_SECONDS,
        }
    }

    /// Set the correction applied on top of the epoch offset.
    #[must_use]
    pub const fn with_correction(mut self, seconds: i64) -> Self {
        self.correction_seconds = seconds;
        self
    }

    /// Log a warning when a non-zero correction is in effect.
    pub fn warn_if_corrected(&self) {
        if self.correction_seconds != 0 {
            warn!(
                "Epoch correction of {}s is active; store timestamps will differ from generator output",
                self.correction_seconds
            );
        }
    }

    /// Store timestamp for a Unix time, `None` before the epoch or past `u32::MAX`.
    pub fn from_unix(&self, unix_seconds: i64) -> Option<u32> {
        let seconds = unix_seconds
            .checked_sub(self.unix_offset)?
            .checked_add(self.correction_seconds)?;
        u32::try_from(seconds).ok()
    }

    /// Unix time for a store timestamp.
    pub fn to_unix(&self, store_seconds: u32) -> i64 {
        i64::from(store_seconds) + self.unix_offset - self.correction_seconds
    }

    /// Store timestamp for a UTC date-time.
    pub fn from_datetime(&self, time: DateTime<Utc>) -> Option<u32> {
        self.from_unix(time.timestamp())
    }

    /// UTC date-time for a store timestamp.
    pub fn to_datetime(&self, store_seconds: u32) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.to_unix(store_seconds), 0)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_default_epoch_instant() {
        let epoch = EpochConfig::default();
        let expected = Utc.with_ymd_and_hms(1992, 1, 4, 23, 5, 37).unwrap();
        assert_eq!(epoch.to_datetime(0).unwrap(), expected);
        assert_eq!(epoch.from_datetime(expected), Some(0));
    }

    #[test]
    fn test_unix_round_trip() {
        let epoch = EpochConfig::default();
        assert_eq!(epoch.from_unix(DEFAULT_UNIX_OFFSET + 3600), Some(3600));
        assert_eq!(epoch.to_unix(3600), DEFAULT_UNIX_OFFSET + 3600);
    }

    #[test]
    fn test_before_epoch_is_none() {
        let epoch = EpochConfig::default();
        assert_eq!(epoch.from_unix(DEFAULT_UNIX_OFFSET - 1), None);
        assert_eq!(epoch.from_unix(0), None);
    }

    #[test]
    fn test_correction_is_explicit() {
        let legacy = EpochConfig::legacy_rtc();
        assert_eq!(legacy.from_unix(DEFAULT_UNIX_OFFSET), Some(3260));
        assert_eq!(legacy.to_unix(3260), DEFAULT_UNIX_OFFSET);
        assert_eq!(
            EpochConfig::default().with_correction(10).from_unix(DEFAULT_UNIX_OFFSET),
            Some(10)
        );
    }

    #[test]
    fn test_serde_defaults() {
        let parsed: EpochConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed, EpochConfig::default());

        let parsed: EpochConfig = serde_json::from_str(r#"{"correction_seconds": 3260}"#).unwrap();
        assert_eq!(parsed, EpochConfig::legacy_rtc());
    }
}
