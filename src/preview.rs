//! # Schedule Preview
//!
//! Plain-text dump of a table for eyeballing before the file goes onto a
//! card. One line per date, the same shape the firmware's month dump prints:
//!
//! ```text
//! 2025-08-28 Thursday  Fajr 04:05 Dhuhr 12:10 Asr 15:47 Maghrib 18:40 Isha 20:07
//! ```

use crate::{weekday_name, DateSpan, Prayer, ScheduleRow};
use chrono::NaiveDate;

/// `HH:MM` for a minute-of-day value.
pub fn format_minute(minute: u16) -> String {
    format!("{:02}:{:02}", minute / 60, minute % 60)
}

/// One preview line for `date`.
pub fn render_line(date: NaiveDate, row: &ScheduleRow) -> String {
    let mut line = format!("{} {:<9}", date.format("%Y-%m-%d"), weekday_name(date));
    for prayer in Prayer::ALL {
        line.push_str(&format!(" {} {}", prayer.name(), format_minute(row.get(prayer))));
    }
    line
}

/// Render the whole table, pairing rows with span dates in order.
///
/// Extra rows (or extra dates) are ignored; callers pass what
/// [`crate::schedule::build_table`] returned for the same span.
pub fn render_table(span: &DateSpan, rows: &[ScheduleRow]) -> String {
    let mut out = String::new();
    for (date, row) in span.dates().zip(rows) {
        out.push_str(&render_line(date, row));
        out.push('\n');
    }
    out
}

/// Development mode: print the table to stdout.
pub fn print_table(span: &DateSpan, rows: &[ScheduleRow]) {
    print!("{}", render_table(span, rows));
}
