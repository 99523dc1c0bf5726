//! # RTC Seed Field
//!
//! The 17-byte ASCII clock string at header offset 16. When the one-shot flag
//! is set the firmware copies it into its MCP7940 RTC once, then clears the
//! flag. Layout:
//!
//! ```text
//! 01234567890123456
//! HH:MM:SS|DD/MM/YY
//! ```
//!
//! Only field ranges are checked. The day is not validated against the month
//! (`31/02/99` passes) because the firmware does not validate it either.

use chrono::NaiveDateTime;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Length of the RTC field in bytes.
pub const RTC_FIELD_LEN: usize = 17;

/// Why an RTC string was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RtcError {
    #[error("RTC string must be exactly 17 ASCII bytes (HH:MM:SS|DD/MM/YY), got {0} bytes")]
    Length(usize),

    #[error("expected '{expected}' at position {position}")]
    Separator { position: usize, expected: char },

    #[error("non-digit in {field} field")]
    Digit { field: &'static str },

    #[error("{field} value {value} out of range")]
    Range { field: &'static str, value: u8 },
}

/// Separator positions and the character each must hold.
const SEPARATORS: [(usize, u8); 5] = [(2, b':'), (5, b':'), (8, b'|'), (11, b'/'), (14, b'/')];

/// Two-digit fields: name, start position, inclusive range.
const FIELDS: [(&str, usize, u8, u8); 6] = [
    ("hour", 0, 0, 23),
    ("minute", 3, 0, 59),
    ("second", 6, 0, 59),
    ("day", 9, 1, 31),
    ("month", 12, 1, 12),
    ("year", 15, 0, 99),
];

/// A validated `HH:MM:SS|DD/MM/YY` string.
///
/// ```
/// use pray2_lib::rtc::RtcField;
///
/// let field = RtcField::parse("07:15:00|01/01/25").unwrap();
/// assert_eq!(field.as_str(), "07:15:00|01/01/25");
/// assert!(RtcField::parse("7:15:00|1/1/25").is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RtcField(String);

impl RtcField {
    /// Validate operator input. Surrounding whitespace is ignored; every
    /// field must already be two zero-padded digits.
    pub fn parse(raw: &str) -> Result<Self, RtcError> {
        let s = raw.trim().as_bytes();
        if s.len() != RTC_FIELD_LEN {
            return Err(RtcError::Length(s.len()));
        }

        for (position, expected) in SEPARATORS {
            if s[position] != expected {
                return Err(RtcError::Separator {
                    position,
                    expected: expected as char,
                });
            }
        }

        let mut out = String::with_capacity(RTC_FIELD_LEN);
        for (i, (field, start, lo, hi)) in FIELDS.into_iter().enumerate() {
            let value = two_digits(s[start], s[start + 1]).ok_or(RtcError::Digit { field })?;
            if !(lo..=hi).contains(&value) {
                return Err(RtcError::Range { field, value });
            }
            if i > 0 {
                out.push(SEPARATORS[i - 1].1 as char);
            }
            out.push_str(&format!("{value:02}"));
        }

        Ok(RtcField(out))
    }

    /// Format a local timestamp as an RTC field (two-digit year).
    pub fn from_datetime(local: NaiveDateTime) -> Self {
        RtcField(local.format("%H:%M:%S|%d/%m/%y").to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Raw bytes copied into the header.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

fn two_digits(tens: u8, ones: u8) -> Option<u8> {
    if tens.is_ascii_digit() && ones.is_ascii_digit() {
        Some((tens - b'0') * 10 + (ones - b'0'))
    } else {
        None
    }
}

impl FromStr for RtcField {
    type Err = RtcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RtcField::parse(s)
    }
}

impl fmt::Display for RtcField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
