//! # PRAY2 Generator Core Library
//!
//! This library turns a computed daily prayer-time schedule into the compact
//! PRAY2 binary that the relay controller firmware reads from its SD card.
//! The firmware fires one relay output per prayer and can seed its real-time
//! clock once from the file header.
//!
//! ## Design Philosophy
//!
//! ### Pure Core
//! - **No I/O in the pipeline**: the table builder and encoder return values and
//!   bytes; persisting them is the binary's job
//! - **Deterministic output**: identical inputs always produce identical bytes,
//!   the file carries no generation timestamp
//! - **All-or-nothing**: any failure for any date aborts the whole span
//!
//! ### Data Flow
//! 1. **Oracle**: compute local clock times for each date ([`oracle::TimeOracle`])
//! 2. **Table**: apply offsets, convert to minute-of-day, repair ordering ([`schedule`])
//! 3. **RTC**: validate the operator's clock seed string ([`rtc`])
//! 4. **Encode**: header + table + CRC-32 ([`pray2`])
//!
//! ## Core Types
//! - [`Prayer`]: the five prayers stored in the table, in firmware order
//! - [`DateSpan`]: inclusive range of calendar dates covered by one file
//! - [`DailyTimes`]: oracle output for one date (includes Sunrise)
//! - [`ScheduleRow`]: five minute-of-day values for one date

use chrono::{Datelike, NaiveDate, NaiveDateTime, Weekday};
use std::fmt;
use thiserror::Error;

// Module declarations
pub mod config;
pub mod crc;
pub mod generate;
pub mod method;
pub mod oracle;
pub mod pray2;
pub mod preview;
pub mod rtc;
pub mod schedule;
pub mod solar;

/// Last valid minute of a day (23:59).
pub const LAST_MINUTE_OF_DAY: u16 = 1439;

/// The five prayers carried in the PRAY2 table.
///
/// The discriminant is the column index used by the firmware (`0..=4`), so
/// `Prayer::ALL` iterates in table order. Sunrise is not a prayer slot: it is
/// reported by the oracle for human checks only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Prayer {
    Fajr = 0,
    Dhuhr = 1,
    Asr = 2,
    Maghrib = 3,
    Isha = 4,
}

impl Prayer {
    /// All prayers in table order.
    pub const ALL: [Prayer; 5] = [
        Prayer::Fajr,
        Prayer::Dhuhr,
        Prayer::Asr,
        Prayer::Maghrib,
        Prayer::Isha,
    ];

    /// Column index in a [`ScheduleRow`].
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Prayer::Fajr => "Fajr",
            Prayer::Dhuhr => "Dhuhr",
            Prayer::Asr => "Asr",
            Prayer::Maghrib => "Maghrib",
            Prayer::Isha => "Isha",
        }
    }
}

impl fmt::Display for Prayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors raised while resolving a date span.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpanError {
    /// End date lies before the start date
    #[error("span end {end} is before start {start}")]
    Reversed { start: NaiveDate, end: NaiveDate },

    /// Month outside 1..=12
    #[error("month {0} is out of range (1-12)")]
    Month(u32),

    /// Year cannot be represented as a calendar date
    #[error("year {0} is out of range")]
    Year(i32),
}

/// Inclusive, chronologically ordered range of dates.
///
/// A span is resolved once by the caller and never changes afterwards.
///
/// # Example
/// ```
/// use chrono::NaiveDate;
/// use pray2_lib::DateSpan;
///
/// let start = NaiveDate::from_ymd_opt(2025, 8, 28).unwrap();
/// let end = NaiveDate::from_ymd_opt(2025, 8, 29).unwrap();
/// let span = DateSpan::new(start, end).unwrap();
///
/// assert_eq!(span.day_count(), 2);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateSpan {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateSpan {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, SpanError> {
        if end < start {
            return Err(SpanError::Reversed { start, end });
        }
        Ok(DateSpan { start, end })
    }

    /// A single day.
    pub fn single(day: NaiveDate) -> Self {
        DateSpan {
            start: day,
            end: day,
        }
    }

    /// January 1st through December 31st of `year`.
    pub fn full_year(year: i32) -> Result<Self, SpanError> {
        Self::months(year, 1, 12)
    }

    /// Every day of one month.
    pub fn month(year: i32, month: u32) -> Result<Self, SpanError> {
        Self::months(year, month, 1)
    }

    /// `count` contiguous months starting at `start_month`.
    ///
    /// The span never crosses into the next year: the end month is clamped at
    /// December, so `months(2025, 11, 6)` covers November and December only.
    pub fn months(year: i32, start_month: u32, count: u32) -> Result<Self, SpanError> {
        if !(1..=12).contains(&start_month) {
            return Err(SpanError::Month(start_month));
        }
        let end_month = (start_month + count.max(1) - 1).min(12);
        let start = NaiveDate::from_ymd_opt(year, start_month, 1).ok_or(SpanError::Year(year))?;
        let end = last_day_of_month(year, end_month).ok_or(SpanError::Year(year))?;
        Self::new(start, end)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of dates in the span, both ends included.
    pub fn day_count(&self) -> usize {
        ((self.end - self.start).num_days() + 1) as usize
    }

    /// Iterate every date of the span in chronological order.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        std::iter::successors(Some(self.start), |d| d.succ_opt()).take_while(move |d| *d <= end)
    }
}

impl fmt::Display for DateSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}",
            self.start.format("%Y%m%d"),
            self.end.format("%Y%m%d")
        )
    }
}

fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()
}

/// Local wall-clock times for one date, as returned by a time oracle.
///
/// Times are naive local timestamps in the installation's zone. A time may
/// fall on a neighbouring date when the location and offset push it past
/// midnight; the table builder only looks at the clock part.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DailyTimes {
    pub fajr: NaiveDateTime,
    pub sunrise: NaiveDateTime,
    pub dhuhr: NaiveDateTime,
    pub asr: NaiveDateTime,
    pub maghrib: NaiveDateTime,
    pub isha: NaiveDateTime,
}

impl DailyTimes {
    /// Timestamp of one of the five table prayers.
    pub fn prayer(&self, prayer: Prayer) -> NaiveDateTime {
        match prayer {
            Prayer::Fajr => self.fajr,
            Prayer::Dhuhr => self.dhuhr,
            Prayer::Asr => self.asr,
            Prayer::Maghrib => self.maghrib,
            Prayer::Isha => self.isha,
        }
    }
}

/// One day of the PRAY2 table: minutes since local midnight, Fajr..Isha.
///
/// Rows produced by [`schedule::build_table`] satisfy
/// `0 <= fajr < dhuhr < asr < maghrib < isha <= 1439`, except that values
/// driven past 23:59 by offsets all pile up at 1439.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScheduleRow {
    pub minutes: [u16; 5],
}

impl ScheduleRow {
    pub fn get(&self, prayer: Prayer) -> u16 {
        self.minutes[prayer.index()]
    }

    /// True when every value is a valid minute and the row strictly increases.
    pub fn is_well_ordered(&self) -> bool {
        self.minutes.iter().all(|&m| m <= LAST_MINUTE_OF_DAY)
            && self.minutes.windows(2).all(|w| w[0] < w[1])
    }
}

/// English weekday name used by the preview output.
pub fn weekday_name(date: NaiveDate) -> &'static str {
    match date.weekday() {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}
