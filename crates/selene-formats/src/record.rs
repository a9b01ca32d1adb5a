//! Ephemeris sample record and its fixed-width codec
//!
//! Layout (28 bytes, host byte order):
//! ```text
//! offset 0x00: u32 timestamp            (seconds since the store epoch)
//! offset 0x04: f32 phase                (0.0-1.0)
//! offset 0x08: f32 distance_km
//! offset 0x0C: f32 azimuth_deg
//! offset 0x10: f32 altitude_deg
//! offset 0x14: u8  event                (rise/set/culmination)
//! offset 0x15: u8  distance_event       (perigee/apogee)
//! offset 0x16: u8  closest_body         (nearest secondary body id)
//! offset 0x17: u8  reserved             (alignment padding)
//! offset 0x18: f32 angular_distance_deg (separation to closest_body)
//! ```
//!
//! The codec writes the host's native byte order. Files are therefore not
//! portable between hosts of different endianness; the header does not
//! declare its byte order.

use crate::error::{FormatError, FormatResult};
use std::fmt;

/// Encoded width of one record in bytes
pub const RECORD_SIZE: usize = 28;

/// One fixed-size ephemeris sample
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Record {
    /// Seconds since the store epoch
    pub timestamp: u32,
    /// Illuminated fraction, 0.0-1.0
    pub phase: f32,
    /// Distance from the observer in km
    pub distance_km: f32,
    /// Azimuth in degrees
    pub azimuth_deg: f32,
    /// Altitude in degrees
    pub altitude_deg: f32,
    /// Raw [`Event`] code
    pub event: u8,
    /// Raw [`DistanceEvent`] code
    pub distance_event: u8,
    /// Raw [`Body`] id of the nearest secondary body
    pub closest_body: u8,
    /// Alignment padding, written as zero by the builder
    pub reserved: u8,
    /// Angular separation to `closest_body` in degrees
    pub angular_distance_deg: f32,
}

impl Record {
    /// Serialize to the fixed-width layout
    pub fn encode(&self) -> [u8; RECORD_SIZE] {
        let mut out = [0u8; RECORD_SIZE];
        out[0..4].copy_from_slice(&self.timestamp.to_ne_bytes());
        out[4..8].copy_from_slice(&self.phase.to_ne_bytes());
        out[8..12].copy_from_slice(&self.distance_km.to_ne_bytes());
        out[12..16].copy_from_slice(&self.azimuth_deg.to_ne_bytes());
        out[16..20].copy_from_slice(&self.altitude_deg.to_ne_bytes());
        out[20] = self.event;
        out[21] = self.distance_event;
        out[22] = self.closest_body;
        out[23] = self.reserved;
        out[24..28].copy_from_slice(&self.angular_distance_deg.to_ne_bytes());
        out
    }

    /// Deserialize from the first [`RECORD_SIZE`] bytes of `data`
    pub fn decode(data: &[u8]) -> FormatResult<Self> {
        if data.len() < RECORD_SIZE {
            return Err(FormatError::BufferTooShort {
                actual: data.len(),
                expected: RECORD_SIZE,
            });
        }

        let u32_at = |pos: usize| {
            u32::from_ne_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]])
        };
        let f32_at = |pos: usize| f32::from_bits(u32_at(pos));

        Ok(Self {
            timestamp: u32_at(0),
            phase: f32_at(4),
            distance_km: f32_at(8),
            azimuth_deg: f32_at(12),
            altitude_deg: f32_at(16),
            event: data[20],
            distance_event: data[21],
            closest_body: data[22],
            reserved: data[23],
            angular_distance_deg: f32_at(24),
        })
    }

    /// Unsigned byte-sum of the encoded record
    ///
    /// A soft integrity aid for serial transfer, not a cryptographic digest.
    pub fn checksum(&self) -> u16 {
        self.encode()
            .iter()
            .fold(0u16, |sum, &b| sum.wrapping_add(u16::from(b)))
    }

    /// Typed view of the primary event code
    pub fn event_kind(&self) -> Option<Event> {
        Event::from_code(self.event)
    }

    /// Typed view of the distance event code
    pub fn distance_event_kind(&self) -> Option<DistanceEvent> {
        DistanceEvent::from_code(self.distance_event)
    }

    /// Typed view of the closest body id
    pub fn body(&self) -> Option<Body> {
        Body::from_id(self.closest_body)
    }

    /// Whether either event field carries `code`
    pub fn has_event_code(&self, code: u8) -> bool {
        self.event == code || self.distance_event == code
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "T:{} Alt:{:.1}° Az:{:.1}° Dist:{:.0}km Phase:{:.3}",
            self.timestamp, self.altitude_deg, self.azimuth_deg, self.distance_km, self.phase
        )?;

        if self.event != Event::None.code() {
            write!(f, " Event:{}", Event::name_of(self.event))?;
        }
        if self.distance_event != DistanceEvent::None.code() {
            write!(f, " DistEvent:{}", DistanceEvent::name_of(self.distance_event))?;
        }

        write!(
            f,
            " Closest:{}({:.1}°)",
            Body::name_of(self.closest_body),
            self.angular_distance_deg
        )
    }
}

/// Horizon event carried in [`Record::event`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Event {
    /// No event at this sample
    None = 0,
    /// Body rises above the horizon
    Rise = 1,
    /// Body sets below the horizon
    Set = 2,
    /// Body crosses the meridian
    Culmination = 3,
}

impl Event {
    /// Parse a raw event code
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::None),
            1 => Some(Self::Rise),
            2 => Some(Self::Set),
            3 => Some(Self::Culmination),
            _ => None,
        }
    }

    /// Raw code stored in the record
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Display name
    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Rise => "Rise",
            Self::Set => "Set",
            Self::Culmination => "Culmination",
        }
    }

    /// Display name for a raw code, "None" for unknown codes
    pub fn name_of(code: u8) -> &'static str {
        Self::from_code(code).map_or("None", Self::name)
    }
}

/// Distance extremum carried in [`Record::distance_event`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DistanceEvent {
    /// No distance event at this sample
    None = 0,
    /// Closest approach
    Perigee = 1,
    /// Farthest point
    Apogee = 2,
}

impl DistanceEvent {
    /// Parse a raw distance event code
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::None),
            1 => Some(Self::Perigee),
            2 => Some(Self::Apogee),
            _ => None,
        }
    }

    /// Raw code stored in the record
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Display name
    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Perigee => "Perigee",
            Self::Apogee => "Apogee",
        }
    }

    /// Display name for a raw code, "None" for unknown codes
    pub fn name_of(code: u8) -> &'static str {
        Self::from_code(code).map_or("None", Self::name)
    }
}

/// Secondary body ids used in [`Record::closest_body`]
///
/// Ids follow the generator's numbering, which skips 3 (Earth) and 9.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Body {
    /// Mercury
    Mercury = 1,
    /// Venus
    Venus = 2,
    /// Mars
    Mars = 4,
    /// Jupiter
    Jupiter = 5,
    /// Saturn
    Saturn = 6,
    /// Uranus
    Uranus = 7,
    /// Neptune
    Neptune = 8,
    /// Sun
    Sun = 10,
    /// Moon
    Moon = 11,
}

impl Body {
    /// Parse a raw body id
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Self::Mercury),
            2 => Some(Self::Venus),
            4 => Some(Self::Mars),
            5 => Some(Self::Jupiter),
            6 => Some(Self::Saturn),
            7 => Some(Self::Uranus),
            8 => Some(Self::Neptune),
            10 => Some(Self::Sun),
            11 => Some(Self::Moon),
            _ => None,
        }
    }

    /// Raw id stored in the record
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Display name
    pub const fn name(self) -> &'static str {
        match self {
            Self::Mercury => "Mercury",
            Self::Venus => "Venus",
            Self::Mars => "Mars",
            Self::Jupiter => "Jupiter",
            Self::Saturn => "Saturn",
            Self::Uranus => "Uranus",
            Self::Neptune => "Neptune",
            Self::Sun => "Sun",
            Self::Moon => "Moon",
        }
    }

    /// Display name for a raw id, "Unknown" for unlisted ids
    pub fn name_of(id: u8) -> &'static str {
        Self::from_id(id).map_or("Unknown", Self::name)
    }
}
