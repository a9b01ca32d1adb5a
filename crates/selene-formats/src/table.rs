//! Tabular sample input
//!
//! Generator output is one comma-separated row per sample:
//!
//! ```text
//! # comment lines
//! timestamp,phase,distance_km,azimuth_deg,altitude_deg,event,distance_event,closest_planet_id,angular_distance_deg,datetime_utc
//! 0,0.5,384400.0,120.0,10.0,0,0,5,12.5,1992-01-04T23:05:37Z
//! ```
//!
//! Only the first nine columns are used. Rows where any of them cannot be
//! resolved are skipped, so the record count may be lower than the row count.

use crate::error::FormatResult;
use crate::record::Record;
use std::io::BufRead;
use tracing::debug;

/// Columns required to resolve a record
pub const REQUIRED_FIELDS: usize = 9;

/// Records read from a table plus the number of skipped rows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableRead {
    /// Resolved records in input order
    pub records: Vec<Record>,
    /// Data rows that could not be resolved
    pub skipped: usize,
}

/// Convert one data row into a record
///
/// Returns `None` when fewer than [`REQUIRED_FIELDS`] columns resolve.
pub fn parse_row(line: &str) -> Option<Record> {
    let mut fields = line.trim_end_matches(['\r', '\n']).split(',').map(str::trim);

    let timestamp = fields.next()?.parse::<u32>().ok()?;
    let phase = fields.next()?.parse::<f32>().ok()?;
    let distance_km = fields.next()?.parse::<f32>().ok()?;
    let azimuth_deg = fields.next()?.parse::<f32>().ok()?;
    let altitude_deg = fields.next()?.parse::<f32>().ok()?;
    let event = fields.next()?.parse::<u8>().ok()?;
    let distance_event = fields.next()?.parse::<u8>().ok()?;
    let closest_body = fields.next()?.parse::<u8>().ok()?;
    let angular_distance_deg = fields.next()?.parse::<f32>().ok()?;

    Some(Record {
        timestamp,
        phase,
        distance_km,
        azimuth_deg,
        altitude_deg,
        event,
        distance_event,
        closest_body,
        reserved: 0,
        angular_distance_deg,
    })
}

/// Read a generator table: `#` comments, one column header line, data rows
pub fn read_table<R: BufRead>(reader: R) -> FormatResult<TableRead> {
    let mut table = TableRead::default();
    let mut seen_column_header = false;

    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();

        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if !seen_column_header {
            seen_column_header = true;
            continue;
        }

        match parse_row(trimmed) {
            Some(record) => table.records.push(record),
            None => {
                debug!("Skipping unresolvable row: {}", trimmed);
                table.skipped += 1;
            }
        }
    }

    Ok(table)
}
