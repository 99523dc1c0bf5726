//! # Command-Line Override Tests
//!
//! Check how flags reshape a loaded configuration before validation.

use chrono::NaiveDate;
use clap::Parser;
use pray2_lib::config::Config;
use pray2_lib::SpanError;

use crate::Cli;

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn overridden(args: &[&str]) -> Result<Config, SpanError> {
    let cli = Cli::try_parse_from(std::iter::once("pray2-gen").chain(args.iter().copied()))
        .expect("arguments should parse");
    let mut config = Config::default();
    cli.apply_overrides(&mut config)?;
    Ok(config)
}

/// `--year` alone selects January 1st through December 31st.
#[test]
fn year_flag_selects_whole_year() {
    let config = overridden(&["--year", "2024"]).unwrap();
    assert_eq!(config.schedule.start, ymd(2024, 1, 1));
    assert_eq!(config.schedule.end, ymd(2024, 12, 31));
}

/// `--month` narrows the year to one month, ending on its last day.
#[test]
fn month_flag_selects_one_month() {
    let config = overridden(&["--year", "2024", "--month", "2"]).unwrap();
    assert_eq!(config.schedule.start, ymd(2024, 2, 1));
    assert_eq!(config.schedule.end, ymd(2024, 2, 29));
}

/// `--months` runs from `--month` and never crosses into the next year.
#[test]
fn months_flag_clamps_at_december() {
    let config = overridden(&["--year", "2025", "--month", "11", "--months", "6"]).unwrap();
    assert_eq!(config.schedule.start, ymd(2025, 11, 1));
    assert_eq!(config.schedule.end, ymd(2025, 12, 31));
}

/// Calendar flags take precedence over explicit start and end dates.
#[test]
fn calendar_flags_override_start_and_end() {
    let config = overridden(&[
        "--start",
        "2025-08-28",
        "--end",
        "2025-08-29",
        "--year",
        "2026",
        "--month",
        "3",
    ])
    .unwrap();
    assert_eq!(config.schedule.start, ymd(2026, 3, 1));
    assert_eq!(config.schedule.end, ymd(2026, 3, 31));
}

/// Explicit dates pass through untouched without calendar flags.
#[test]
fn start_and_end_flags_pass_through() {
    let config = overridden(&["--start", "2025-08-28", "--end", "2025-08-29"]).unwrap();
    assert_eq!(config.schedule.start, ymd(2025, 8, 28));
    assert_eq!(config.schedule.end, ymd(2025, 8, 29));
}

/// A month outside 1..=12 is reported, not silently clamped.
#[test]
fn invalid_month_is_rejected() {
    assert_eq!(
        overridden(&["--year", "2025", "--month", "13"]).unwrap_err(),
        SpanError::Month(13)
    );
}

/// `--month` without `--year` is a usage error.
#[test]
fn month_requires_year() {
    assert!(Cli::try_parse_from(["pray2-gen", "--month", "3"]).is_err());
}

/// Device flags land in the device section.
#[test]
fn device_flags_override_config() {
    let config = overridden(&["--rtc", "07:15:00|01/01/25", "--no-rtc-seed"]).unwrap();
    assert_eq!(config.device.rtc.as_deref(), Some("07:15:00|01/01/25"));
    assert!(!config.device.rtc_one_shot);
}
