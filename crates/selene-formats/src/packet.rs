//! Serial framing for single records
//!
//! The clock firmware receives individual records over a serial link:
//!
//! ```text
//! offset 0x00: u16 magic     (0xCE1E)
//! offset 0x02: u16 length    (28)
//! offset 0x04: [u8; 28]      record
//! offset 0x20: u16 checksum  (Record::checksum)
//! ```

use crate::error::{FormatError, FormatResult};
use crate::record::{RECORD_SIZE, Record};

/// Packet magic
pub const PACKET_MAGIC: u16 = 0xCE1E;

/// Encoded packet width in bytes
pub const PACKET_SIZE: usize = 2 + 2 + RECORD_SIZE + 2;

/// One framed record
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CelestialPacket {
    /// Framed record
    pub record: Record,
}

impl CelestialPacket {
    /// Frame a record
    pub fn new(record: Record) -> Self {
        Self { record }
    }

    /// Serialize with magic, length and checksum
    pub fn encode(&self) -> [u8; PACKET_SIZE] {
        let mut out = [0u8; PACKET_SIZE];
        out[0..2].copy_from_slice(&PACKET_MAGIC.to_ne_bytes());
        out[2..4].copy_from_slice(&(RECORD_SIZE as u16).to_ne_bytes());
        out[4..4 + RECORD_SIZE].copy_from_slice(&self.record.encode());
        out[4 + RECORD_SIZE..].copy_from_slice(&self.record.checksum().to_ne_bytes());
        out
    }

    /// Parse and verify a packet
    pub fn decode(data: &[u8]) -> FormatResult<Self> {
        if data.len() < PACKET_SIZE {
            return Err(FormatError::BufferTooShort {
                actual: data.len(),
                expected: PACKET_SIZE,
            });
        }

        let magic = u16::from_ne_bytes([data[0], data[1]]);
        if magic != PACKET_MAGIC {
            return Err(FormatError::InvalidPacketMagic(magic));
        }

        let length = u16::from_ne_bytes([data[2], data[3]]);
        if usize::from(length) != RECORD_SIZE {
            return Err(FormatError::PacketLengthMismatch {
                declared: length,
                expected: RECORD_SIZE as u16,
            });
        }

        let record = Record::decode(&data[4..4 + RECORD_SIZE])?;
        let stored = u16::from_ne_bytes([data[4 + RECORD_SIZE], data[5 + RECORD_SIZE]]);
        let computed = record.checksum();
        if stored != computed {
            return Err(FormatError::ChecksumMismatch { stored, computed });
        }

        Ok(Self { record })
    }
}
