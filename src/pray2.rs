//! # PRAY2 v2 Binary Encoder
//!
//! Serialises a schedule into the file the relay controller loads from SD.
//! Everything is little-endian and fixed-layout:
//!
//! ```text
//! offset size field
//!  0      5   magic "PRAY2" (no terminator)
//!  5      1   version = 2
//!  6      2   header_size = 64
//!  8      2   year of span start
//! 10      2   day_count
//! 12      1   start_month (1-12)
//! 13      1   start_day (1-31)
//! 14      1   flags (0x10 = seed RTC once)
//! 15      1   method_code
//! 16     17   RTC field "HH:MM:SS|DD/MM/YY"
//! 33      1   pad = 0
//! 34     10   relay on-seconds, Fajr..Isha (5 x u16)
//! 44      4   table_offset = 64
//! 48      4   table_size = day_count * 10
//! 52      4   durations_offset = 0 (reserved)
//! 56      4   durations_size = 0 (reserved)
//! 60      2   reserved = 0
//! 62      2   reserved = 0
//! 64  10*N    rows: 5 x u16 minute-of-day, Fajr..Isha
//! end     4   CRC-32 (zlib) of every preceding byte
//! ```
//!
//! The firmware validates magic, version, header size and table bounds, and
//! requires both durations fields to be zero unless flag bit 0 is set. It
//! ignores the CRC, so the CRC only protects the copy onto the card.

use crate::crc::crc32_le_bytes;
use crate::method::{method_code, UnknownMethod};
use crate::rtc::{RtcField, RTC_FIELD_LEN};
use crate::{DateSpan, Prayer, ScheduleRow};
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub const MAGIC: &[u8; 5] = b"PRAY2";
pub const VERSION: u8 = 2;
pub const HEADER_SIZE: usize = 64;
/// Bytes per table row (5 x u16).
pub const ROW_SIZE: usize = 10;
pub const CRC_SIZE: usize = 4;
/// `day_count` is a u16 header field.
pub const MAX_DAYS: usize = u16::MAX as usize;

/// Byte offsets of the header fields.
pub mod offset {
    pub const MAGIC: usize = 0;
    pub const VERSION: usize = 5;
    pub const HEADER_SIZE: usize = 6;
    pub const YEAR: usize = 8;
    pub const DAY_COUNT: usize = 10;
    pub const START_MONTH: usize = 12;
    pub const START_DAY: usize = 13;
    pub const FLAGS: usize = 14;
    pub const METHOD_CODE: usize = 15;
    pub const RTC: usize = 16;
    pub const PAD: usize = 33;
    pub const RELAY_SECONDS: usize = 34;
    pub const TABLE_OFFSET: usize = 44;
    pub const TABLE_SIZE: usize = 48;
    pub const DURATIONS_OFFSET: usize = 52;
    pub const DURATIONS_SIZE: usize = 56;
    pub const RESERVED: usize = 60;
}

/// Total file size for `days` rows.
pub fn encoded_len(days: usize) -> usize {
    HEADER_SIZE + ROW_SIZE * days + CRC_SIZE
}

/// Everything that can stop an encode. None of these produce partial output.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("{0} days do not fit the 16-bit day count (max 65535)")]
    TooManyDays(usize),

    #[error("table has {actual} rows but the span covers {expected} days")]
    RowCount { expected: usize, actual: usize },

    #[error("span start year {0} does not fit the 16-bit year field")]
    Year(i32),

    #[error("RTC field must be 17 bytes, got {0}")]
    RtcLength(usize),

    #[error(transparent)]
    Method(#[from] UnknownMethod),

    #[error("{prayer} relay duration {seconds}s exceeds {max}s")]
    RelayDuration {
        prayer: Prayer,
        seconds: u16,
        max: u16,
    },
}

/// Header flag bits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Flags(u8);

impl Flags {
    /// Device copies the RTC field into its clock once, then clears the bit.
    pub const RTC_ONE_SHOT: Flags = Flags(0x10);

    pub fn empty() -> Self {
        Flags(0)
    }

    pub fn from_bits(bits: u8) -> Self {
        Flags(bits)
    }

    /// Flags with only the one-shot RTC bit, if requested.
    pub fn rtc_one_shot(enabled: bool) -> Self {
        if enabled {
            Self::RTC_ONE_SHOT
        } else {
            Self::empty()
        }
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn contains(self, other: Flags) -> bool {
        self.0 & other.0 == other.0
    }
}

/// Seconds each prayer's relay stays energised, Fajr..Isha.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "[u16; 5]", into = "[u16; 5]")]
pub struct RelayDurations([u16; 5]);

impl RelayDurations {
    /// Ten hours.
    pub const MAX_SECONDS: u16 = 36_000;

    pub fn new(seconds: [u16; 5]) -> Result<Self, EncodeError> {
        for prayer in Prayer::ALL {
            let s = seconds[prayer.index()];
            if s > Self::MAX_SECONDS {
                return Err(EncodeError::RelayDuration {
                    prayer,
                    seconds: s,
                    max: Self::MAX_SECONDS,
                });
            }
        }
        Ok(RelayDurations(seconds))
    }

    pub fn seconds(&self) -> [u16; 5] {
        self.0
    }

    pub fn get(&self, prayer: Prayer) -> u16 {
        self.0[prayer.index()]
    }
}

impl Default for RelayDurations {
    fn default() -> Self {
        // Longer for Fajr, which is typically a longer call
        RelayDurations([60, 45, 45, 45, 45])
    }
}

impl TryFrom<[u16; 5]> for RelayDurations {
    type Error = EncodeError;

    fn try_from(seconds: [u16; 5]) -> Result<Self, Self::Error> {
        RelayDurations::new(seconds)
    }
}

impl From<RelayDurations> for [u16; 5] {
    fn from(d: RelayDurations) -> Self {
        d.0
    }
}

/// Inputs to [`encode`].
#[derive(Debug, Clone, Copy)]
pub struct EncodeRequest<'a> {
    pub span: &'a DateSpan,
    /// Method name, resolved through the fixed code table
    pub method: &'a str,
    pub flags: Flags,
    pub rtc: &'a RtcField,
    pub relay: RelayDurations,
    /// One row per date of `span`, in order
    pub rows: &'a [ScheduleRow],
}

/// Serialise header, table and CRC into a fresh buffer.
///
/// Pure and deterministic: identical requests give identical bytes.
pub fn encode(req: &EncodeRequest<'_>) -> Result<Vec<u8>, EncodeError> {
    // ---- checks before a single byte is written ----
    let days = req.rows.len();
    if days > MAX_DAYS {
        return Err(EncodeError::TooManyDays(days));
    }
    if days != req.span.day_count() {
        return Err(EncodeError::RowCount {
            expected: req.span.day_count(),
            actual: days,
        });
    }
    let start = req.span.start();
    let year = u16::try_from(start.year()).map_err(|_| EncodeError::Year(start.year()))?;
    let rtc = req.rtc.as_bytes();
    if rtc.len() != RTC_FIELD_LEN {
        return Err(EncodeError::RtcLength(rtc.len()));
    }
    let method = method_code(req.method)?;

    let table_size = (days * ROW_SIZE) as u32;
    let mut buf = Vec::with_capacity(encoded_len(days));

    // ---- header ----
    buf.extend_from_slice(MAGIC);
    buf.push(VERSION);
    buf.extend_from_slice(&(HEADER_SIZE as u16).to_le_bytes());
    buf.extend_from_slice(&year.to_le_bytes());
    buf.extend_from_slice(&(days as u16).to_le_bytes());
    buf.push(start.month() as u8);
    buf.push(start.day() as u8);
    buf.push(req.flags.bits());
    buf.push(method);
    buf.extend_from_slice(rtc);
    buf.push(0); // pad
    for seconds in req.relay.seconds() {
        buf.extend_from_slice(&seconds.to_le_bytes());
    }
    buf.extend_from_slice(&(HEADER_SIZE as u32).to_le_bytes());
    buf.extend_from_slice(&table_size.to_le_bytes());
    buf.extend_from_slice(&0u32.to_le_bytes()); // durations_offset
    buf.extend_from_slice(&0u32.to_le_bytes()); // durations_size
    buf.extend_from_slice(&0u16.to_le_bytes());
    buf.extend_from_slice(&0u16.to_le_bytes());
    debug_assert_eq!(buf.len(), HEADER_SIZE);

    // ---- table ----
    for row in req.rows {
        for minute in row.minutes {
            buf.extend_from_slice(&minute.to_le_bytes());
        }
    }

    // ---- trailer ----
    let crc = crc32_le_bytes(&buf);
    buf.extend_from_slice(&crc);

    debug!(
        days,
        bytes = buf.len(),
        method = req.method,
        flags = req.flags.bits(),
        "PRAY2 encoded"
    );
    Ok(buf)
}
