//! # Schedule Table Builder
//!
//! Turns oracle output into PRAY2 table rows. For every date of the span, in
//! order:
//!
//! 1. **Offset**: add the operator's signed minute offset to each prayer
//! 2. **Convert**: take the clock part as `hour * 60 + minute`. An offset that
//!    pushes a time past midnight yields the next day's clock minute; there is
//!    no wraparound handling
//! 3. **Clamp**: force each value into `0..=1439`
//! 4. **Repair**: nudge any value that does not exceed its predecessor to
//!    `predecessor + 1` (capped at 1439), see [`repair_monotonic`]
//!
//! ## Failure Model
//! A single oracle failure aborts the whole table. The firmware indexes rows
//! by day offset from the span start, so a table with holes would shift every
//! later day.

use crate::method::CalculationMethod;
use crate::oracle::{Coordinates, OracleError, TimeOracle};
use crate::{DailyTimes, DateSpan, Prayer, ScheduleRow, LAST_MINUTE_OF_DAY};
use chrono::{Duration, FixedOffset, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors from building the table.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScheduleError {
    /// The oracle could not produce times for one of the dates
    #[error("prayer times unavailable: {0}")]
    Oracle(#[from] OracleError),

    /// An offset moved a time outside the representable date range
    #[error("{prayer} offset of {offset} minutes overflows the calendar at {time}")]
    OffsetOverflow {
        prayer: Prayer,
        offset: i32,
        time: NaiveDateTime,
    },
}

/// Signed minute offsets per prayer (positive = later). Sunrise has none.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrayerOffsets {
    pub fajr: i32,
    pub dhuhr: i32,
    pub asr: i32,
    pub maghrib: i32,
    pub isha: i32,
}

impl PrayerOffsets {
    pub fn get(&self, prayer: Prayer) -> i32 {
        match prayer {
            Prayer::Fajr => self.fajr,
            Prayer::Dhuhr => self.dhuhr,
            Prayer::Asr => self.asr,
            Prayer::Maghrib => self.maghrib,
            Prayer::Isha => self.isha,
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == PrayerOffsets::default()
    }
}

/// Where the oracle should compute times for.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Site {
    pub coordinates: Coordinates,
    pub method: CalculationMethod,
    pub timezone: FixedOffset,
}

/// Minute of the local clock day, `0..=1439`.
pub fn minute_of_day(t: NaiveDateTime) -> i32 {
    (t.hour() * 60 + t.minute()) as i32
}

/// Force a raw minute value into `0..=1439`.
pub fn clamp_minute(raw: i32) -> u16 {
    raw.clamp(0, LAST_MINUTE_OF_DAY as i32) as u16
}

/// Make a row strictly increasing left to right.
///
/// Whenever `row[i] <= row[i-1]`, `row[i]` becomes `min(row[i-1] + 1, 1439)`.
/// This is lossy: a large negative offset can silently move a prayer later
/// than the operator asked. Values pinned at 1439 stay equal, since there is
/// no later minute to move to.
///
/// ```
/// use pray2_lib::schedule::repair_monotonic;
///
/// assert_eq!(
///     repair_monotonic([300, 300, 500, 600, 700]),
///     [300, 301, 500, 600, 700]
/// );
/// ```
pub fn repair_monotonic(mut row: [u16; 5]) -> [u16; 5] {
    for i in 1..row.len() {
        if row[i] <= row[i - 1] {
            row[i] = (row[i - 1] + 1).min(LAST_MINUTE_OF_DAY);
        }
    }
    row
}

/// Steps 1-3: offset, convert to minute-of-day, clamp. No ordering repair.
pub fn offset_minutes(
    times: &DailyTimes,
    offsets: &PrayerOffsets,
) -> Result<[u16; 5], ScheduleError> {
    let mut minutes = [0u16; 5];
    for prayer in Prayer::ALL {
        let time = times.prayer(prayer);
        let offset = offsets.get(prayer);
        let adjusted = time
            .checked_add_signed(Duration::minutes(offset as i64))
            .ok_or(ScheduleError::OffsetOverflow {
                prayer,
                offset,
                time,
            })?;
        minutes[prayer.index()] = clamp_minute(minute_of_day(adjusted));
    }
    Ok(minutes)
}

/// Build one table row from a day's oracle output.
pub fn build_row(
    times: &DailyTimes,
    offsets: &PrayerOffsets,
) -> Result<ScheduleRow, ScheduleError> {
    Ok(ScheduleRow {
        minutes: repair_monotonic(offset_minutes(times, offsets)?),
    })
}

/// Build the table for every date of `span`, in chronological order.
///
/// Returns exactly `span.day_count()` rows or an error; never a partial table.
pub fn build_table<O: TimeOracle>(
    span: &DateSpan,
    site: &Site,
    offsets: &PrayerOffsets,
    oracle: &O,
) -> Result<Vec<ScheduleRow>, ScheduleError> {
    let mut rows = Vec::with_capacity(span.day_count());
    let mut repaired = 0usize;

    for date in span.dates() {
        let times = oracle
            .times(date, site.coordinates, site.method, site.timezone)
            .map_err(|err| {
                warn!(%date, %err, "time oracle failed, aborting table");
                err
            })?;

        let raw = offset_minutes(&times, offsets)?;
        let minutes = repair_monotonic(raw);
        if minutes != raw {
            debug!(%date, ?raw, ?minutes, "prayer order repaired");
            repaired += 1;
        }
        rows.push(ScheduleRow { minutes });
    }

    if repaired > 0 {
        warn!(
            days = repaired,
            "out-of-order prayers were nudged forward to keep the table increasing"
        );
    }
    debug!(days = rows.len(), span = %span, "schedule table built");
    Ok(rows)
}
