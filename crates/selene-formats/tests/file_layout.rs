#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
//! Integration tests for the on-disk layout
//!
//! Converts a generator table into a file and walks the resulting bytes:
//! header fields, record placement and the trailing sparse index.

use pretty_assertions::assert_eq;
use selene_formats::{
    CelestialPacket, EPHEMERIS_MAGIC, EphemerisBuilder, EphemerisHeader, HEADER_SIZE,
    INDEX_ENTRY_SIZE, RECORD_SIZE, Record, STRIDE, SparseIndex, read_table,
};
use std::io::Cursor;

/// Generator output for 25 hourly samples, with a comment block and one bad row
fn generator_table() -> String {
    let mut table = String::from(
        "# Moon ephemeris\n\
         # step: 3600s\n\
         timestamp,phase,distance_km,azimuth_deg,altitude_deg,event,distance_event,closest_planet_id,angular_distance_deg,datetime_utc\n",
    );
    for hour in 0..25u32 {
        let event = if hour == 12 { 3 } else { 0 };
        table.push_str(&format!(
            "{},{},{},{},{},{},0,5,{},1992-01-05T00:00:00Z\n",
            hour * 3600,
            f64::from(hour) / 25.0,
            384_400 + hour * 10,
            hour * 14,
            f64::from(hour) - 12.0,
            event,
            f64::from(hour) / 2.0,
        ));
        if hour == 7 {
            table.push_str("25560,not-a-number,0,0,0,0,0,0,0,x\n");
        }
    }
    table
}

fn word(data: &[u8], offset: usize) -> u32 {
    u32::from_ne_bytes(data[offset..offset + 4].try_into().unwrap())
}

#[test]
fn table_to_file_layout() {
    let table = read_table(Cursor::new(generator_table())).unwrap();
    assert_eq!(table.records.len(), 25);
    assert_eq!(table.skipped, 1);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("moon.bin");
    let stats = EphemerisBuilder::new()
        .extend(table.records.clone())
        .build_file(&path)
        .unwrap();

    assert_eq!(stats.record_count, 25);
    assert_eq!(stats.index_count, 3);
    assert_eq!(stats.time_step, 3600);
    assert_eq!(stats.start_timestamp, 0);
    assert_eq!(stats.end_timestamp, 24 * 3600);

    let data = std::fs::read(&path).unwrap();
    let expected_len = HEADER_SIZE + 25 * RECORD_SIZE + 3 * INDEX_ENTRY_SIZE;
    assert_eq!(data.len(), expected_len);
    assert_eq!(stats.bytes_written, expected_len as u64);

    assert_eq!(word(&data, 0), EPHEMERIS_MAGIC);
    assert_eq!(word(&data, 4), 1);
    assert_eq!(word(&data, 8), 25);
    assert_eq!(word(&data, 12), RECORD_SIZE as u32);
    assert_eq!(word(&data, 16), 0);
    assert_eq!(word(&data, 20), 24 * 3600);
    assert_eq!(word(&data, 24), 3600);
    assert_eq!(word(&data, 28), 0);

    for (position, record) in table.records.iter().enumerate() {
        let offset = HEADER_SIZE + position * RECORD_SIZE;
        let decoded = Record::decode(&data[offset..offset + RECORD_SIZE]).unwrap();
        assert_eq!(&decoded, record);
    }

    let index_start = HEADER_SIZE + 25 * RECORD_SIZE;
    for group in 0..3 {
        let offset = index_start + group * INDEX_ENTRY_SIZE;
        let first = group as u32 * STRIDE;
        assert_eq!(word(&data, offset), first * 3600);
        assert_eq!(
            u64::from(word(&data, offset + 4)),
            EphemerisHeader::record_offset(first)
        );
    }
}

#[test]
fn header_and_index_read_back() {
    let records: Vec<Record> = (0..31)
        .map(|i| Record {
            timestamp: 5_000 + i * 60,
            ..Record::default()
        })
        .collect();
    let data = EphemerisBuilder::new().extend(records).build().unwrap();

    let mut cursor = Cursor::new(&data);
    let header = EphemerisHeader::read_from(&mut cursor).unwrap();
    header.validate_strict().unwrap();
    assert_eq!(header.record_count, 31);
    assert_eq!(header.index_offset(), (HEADER_SIZE + 31 * RECORD_SIZE) as u64);

    cursor.set_position(header.index_offset());
    let index = SparseIndex::read_from(&mut cursor, 4).unwrap();
    assert_eq!(index.len(), 4);
    assert_eq!(index.floor_group(4_999), None);
    assert_eq!(index.floor_group(5_000), Some(0));
    assert_eq!(index.floor_group(5_000 + 19 * 60), Some(1));
    assert_eq!(index.floor_group(u32::MAX), Some(3));
}

#[test]
fn record_survives_packet_framing() {
    let table = read_table(Cursor::new(generator_table())).unwrap();
    let culmination = table.records[12];
    assert_eq!(culmination.event, 3);

    let frame = CelestialPacket::new(culmination).encode();
    let packet = CelestialPacket::decode(&frame).unwrap();
    assert_eq!(packet.record, culmination);
}
