//! Temporal queries over an ephemeris store.
//!
//! Lookups go through the single-slot cache first, then one of two search
//! paths depending on what the file carries:
//!
//! - **Index path**: binary search the sparse index for the last group
//!   starting at or before the target, then scan at most one stride of
//!   records, stopping at the first record past the target.
//! - **Direct-offset path**: compute the slot the target would occupy on a
//!   perfectly regular grid and read that single record. When it does not
//!   match, scan outward from the computed slot up to the configured radius;
//!   this picks up irregular event records injected between regular samples.
//!
//! Absence is `Ok(None)`. Only a closed store or a failing backing reader
//! produce errors, and neither touches the cache.

use crate::error::StoreResult;
use crate::source::RecordSource;
use crate::store::EphemerisStore;
use selene_formats::{EphemerisHeader, Record, STRIDE};
use tracing::{debug, trace};

/// Largest grid point at or before `timestamp`, never earlier than the start
///
/// The grid is anchored at `start_timestamp` and spaced by the header time
/// step. With a zero step every timestamp is its own grid point.
pub fn align(header: &EphemerisHeader, timestamp: u32) -> u32 {
    let start = header.start_timestamp;
    let step = header.time_step_seconds;
    if timestamp <= start {
        return start;
    }
    if step == 0 {
        return timestamp;
    }
    start + (timestamp - start) / step * step
}

/// Record position the direct-offset path probes for `timestamp`
///
/// `1 + (align(timestamp) - start) / step`. The result may lie past the last
/// record; `None` when the step is zero.
pub fn expected_position(header: &EphemerisHeader, timestamp: u32) -> Option<u64> {
    let step = header.time_step_seconds;
    if step == 0 {
        return None;
    }
    let aligned = align(header, timestamp);
    Some(1 + u64::from((aligned - header.start_timestamp) / step))
}

fn find_indexed<S: RecordSource>(source: &mut S, timestamp: u32) -> StoreResult<Option<Record>> {
    let Some(group) = source.index().and_then(|index| index.floor_group(timestamp)) else {
        return Ok(None);
    };

    let record_count = source.header().record_count;
    let first = group as u32 * STRIDE;
    let last = first.saturating_add(STRIDE).min(record_count);

    for position in first..last {
        match source.record_at(position)? {
            Some(record) if record.timestamp == timestamp => return Ok(Some(record)),
            // Sorted records: overshoot proves absence
            Some(record) if record.timestamp > timestamp => break,
            Some(_) => {}
            None => break,
        }
    }
    Ok(None)
}

/// Outcome of reading the slot the direct-offset path predicts
#[derive(Debug, Clone, Copy, PartialEq)]
enum DirectProbe {
    /// Predicted slot holds the target
    Hit(Record),
    /// Predicted slot was read and holds another timestamp
    Missed(u64),
    /// No slot to read: zero time step or a prediction past the last record
    NoSlot,
}

fn probe_direct<S: RecordSource>(source: &mut S, timestamp: u32) -> StoreResult<DirectProbe> {
    let header = *source.header();
    let Some(position) = expected_position(&header, timestamp)
        .filter(|&position| position < u64::from(header.record_count))
    else {
        return Ok(DirectProbe::NoSlot);
    };

    match source.record_at(position as u32)? {
        Some(record) if record.timestamp == timestamp => Ok(DirectProbe::Hit(record)),
        _ => Ok(DirectProbe::Missed(position)),
    }
}

fn find_direct<S: RecordSource>(
    source: &mut S,
    timestamp: u32,
    radius: u32,
) -> StoreResult<Option<Record>> {
    let header = *source.header();
    let record_count = u64::from(header.record_count);
    let base = expected_position(&header, timestamp).unwrap_or(0);

    let probed = match probe_direct(source, timestamp)? {
        DirectProbe::Hit(record) => return Ok(Some(record)),
        DirectProbe::Missed(position) => {
            debug!(
                "Direct offset missed {} at slot {}, scanning ±{} records",
                timestamp, position, radius
            );
            true
        }
        DirectProbe::NoSlot => {
            debug!(
                "No direct slot for {}, scanning ±{} records around slot {}",
                timestamp, radius, base
            );
            false
        }
    };

    let first_distance = u64::from(probed);
    for distance in first_distance..=u64::from(radius) {
        let below = base.checked_sub(distance);
        let above = base + distance;
        if below.is_none() && above >= record_count {
            break;
        }

        let candidates = if distance == 0 {
            [below, None]
        } else {
            [below, Some(above)]
        };
        for position in candidates.into_iter().flatten() {
            if position >= record_count {
                continue;
            }
            if let Some(record) = source.record_at(position as u32)?
                && record.timestamp == timestamp
            {
                return Ok(Some(record));
            }
        }
    }
    Ok(None)
}

fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + t * (to - from)
}

/// Blend two bracketing records at fraction `t`
///
/// Continuous fields are interpolated linearly. Discrete fields come from
/// `before` when `t < 0.5`, otherwise from `after`.
pub fn interpolate_between(before: &Record, after: &Record, timestamp: u32, t: f32) -> Record {
    let nearest = if t < 0.5 { before } else { after };
    Record {
        timestamp,
        phase: lerp(before.phase, after.phase, t),
        distance_km: lerp(before.distance_km, after.distance_km, t),
        azimuth_deg: lerp(before.azimuth_deg, after.azimuth_deg, t),
        altitude_deg: lerp(before.altitude_deg, after.altitude_deg, t),
        event: nearest.event,
        distance_event: nearest.distance_event,
        closest_body: nearest.closest_body,
        reserved: nearest.reserved,
        angular_distance_deg: lerp(before.angular_distance_deg, after.angular_distance_deg, t),
    }
}

impl<S: RecordSource> EphemerisStore<S> {
    /// Record stored at exactly `timestamp`
    ///
    /// Timestamps outside `[start_time, end_time]` are absent. A hit replaces
    /// the cache slot; a repeated lookup of the cached timestamp performs no
    /// reads.
    pub fn find_exact(&mut self, timestamp: u32) -> StoreResult<Option<Record>> {
        let radius = self.config.search_radius;
        let (source, cache) = self.parts_mut()?;

        if let Some((cached, record)) = *cache
            && cached == timestamp
        {
            trace!("Cache hit for {}", timestamp);
            return Ok(Some(record));
        }

        if !source.header().contains(timestamp) {
            trace!("Timestamp {} out of range", timestamp);
            return Ok(None);
        }

        let found = if source.index().is_some() {
            find_indexed(source, timestamp)?
        } else {
            find_direct(source, timestamp, radius)?
        };

        if let Some(record) = found {
            *cache = Some((timestamp, record));
        }
        Ok(found)
    }

    /// Record at `timestamp`, interpolated from the bracketing grid samples
    /// when no exact record exists
    ///
    /// The returned record always carries `timestamp`. When only one bracket
    /// exists its values are returned unchanged apart from the timestamp.
    pub fn interpolate(&mut self, timestamp: u32) -> StoreResult<Option<Record>> {
        let header = *self.header()?;
        if !header.contains(timestamp) {
            return Ok(None);
        }

        if let Some(record) = self.find_exact(timestamp)? {
            return Ok(Some(record));
        }

        let before_time = align(&header, timestamp);
        let after_time = before_time
            .saturating_add(header.time_step_seconds)
            .min(header.end_timestamp);

        let before = self.find_exact(before_time)?;
        let after = self.find_exact(after_time)?;

        let result = match (before, after) {
            (Some(before), Some(after)) if before_time < after_time => {
                let t = (timestamp - before_time) as f32 / (after_time - before_time) as f32;
                Some(interpolate_between(&before, &after, timestamp, t))
            }
            (Some(only), _) | (None, Some(only)) => {
                debug!(
                    "Only one bracket for {} ({}..{}), returning it unblended",
                    timestamp, before_time, after_time
                );
                Some(Record { timestamp, ..only })
            }
            (None, None) => None,
        };
        Ok(result)
    }

    /// First record at or after `from` whose event or distance event equals
    /// `code`
    ///
    /// Steps by the header time step and gives up past `end_time` or after
    /// `record_count` steps, whichever comes first, so a zero or corrupt
    /// step still terminates.
    pub fn next_event(&mut self, from: u32, code: u8) -> StoreResult<Option<Record>> {
        let header = *self.header()?;
        let step = header.time_step_seconds;

        let mut search_time = from;
        let mut steps = 0u32;
        while search_time <= header.end_timestamp && steps < header.record_count {
            if let Some(record) = self.find_exact(search_time)?
                && record.has_event_code(code)
            {
                return Ok(Some(record));
            }

            let Some(next) = search_time.checked_add(step) else {
                break;
            };
            search_time = next;
            steps += 1;
        }
        Ok(None)
    }
}
