//! # Configuration Management
//!
//! Loads the installation settings from `pray2-config.toml` and resolves
//! them into a validated [`Job`]. Every input-boundary check lives in
//! [`Config::validate`], so the library pipeline only ever sees typed,
//! in-range values.
//!
//! ```toml
//! [location]
//! name = "Islamabad"
//! latitude = 33.6844
//! longitude = 73.0479
//! utc_offset = "+05:00"
//!
//! [schedule]
//! start = "2025-01-01"
//! end = "2025-12-31"
//! method = "KARACHI"
//! high_latitude_rule = "middle_of_the_night"
//!
//! [schedule.offsets]
//! fajr = 0
//! dhuhr = 2
//!
//! [device]
//! relay_seconds = [60, 45, 45, 45, 45]
//! rtc = "07:15:00|01/01/25"
//! rtc_one_shot = true
//! ```

use crate::generate::Job;
use crate::method::{CalculationMethod, IshaRule, MethodParams, UnknownMethod};
use crate::oracle::Coordinates;
use crate::pray2::{EncodeError, Flags, RelayDurations, MAX_DAYS};
use crate::rtc::{RtcError, RtcField};
use crate::schedule::{PrayerOffsets, Site};
use crate::solar::{HighLatitudeRule, SolarOracle};
use crate::{DateSpan, SpanError};
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Config file looked up in the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "pray2-config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("invalid config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("cannot serialise configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("cannot write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("latitude {0} outside -90..=90")]
    Latitude(f64),

    #[error("longitude {0} outside -180..=180")]
    Longitude(f64),

    #[error("invalid UTC offset {0:?}, expected e.g. \"+05:00\"")]
    UtcOffset(String),

    #[error(transparent)]
    Method(#[from] UnknownMethod),

    #[error("method CUSTOM needs schedule.custom_fajr_angle and schedule.custom_isha_angle")]
    CustomAngles,

    #[error(transparent)]
    Span(#[from] SpanError),

    #[error("span covers {0} days, the file holds at most 65535")]
    TooManyDays(usize),

    #[error("start year {0} does not fit the file's 16-bit year field")]
    Year(i32),

    #[error(transparent)]
    Relay(#[from] EncodeError),

    #[error("invalid RTC string: {0}")]
    Rtc(#[from] RtcError),
}

/// Application configuration loaded from pray2-config.toml
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    pub location: LocationConfig,
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Where the relay controller is installed
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LocationConfig {
    /// Human-readable place name, for logs only
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Fixed offset of local time, e.g. "+05:00". DST is not modelled.
    pub utc_offset: String,
}

/// What to compute
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ScheduleConfig {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Name from the fixed method table, e.g. "KARACHI"
    pub method: String,
    #[serde(default)]
    pub high_latitude_rule: HighLatitudeRule,
    /// Only read for method CUSTOM
    pub custom_fajr_angle: Option<f64>,
    pub custom_isha_angle: Option<f64>,
    #[serde(default)]
    pub offsets: PrayerOffsets,
}

/// Relay controller settings written into the header
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// On-time per relay in seconds, Fajr..Isha (0..=36000)
    pub relay_seconds: [u16; 5],
    /// Clock seed "HH:MM:SS|DD/MM/YY"; current local time when absent
    pub rtc: Option<String>,
    /// Ask the device to load the RTC field once
    pub rtc_one_shot: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct OutputConfig {
    /// Output file; derived from span and method when absent
    pub path: Option<PathBuf>,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        DeviceConfig {
            relay_seconds: RelayDurations::default().seconds(),
            rtc: None,
            rtc_one_shot: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let year = Utc::now().year();
        Config {
            location: LocationConfig {
                name: "Islamabad".to_string(),
                latitude: 33.6844,
                longitude: 73.0479,
                utc_offset: "+05:00".to_string(),
            },
            schedule: ScheduleConfig {
                start: NaiveDate::from_ymd_opt(year, 1, 1).unwrap_or(NaiveDate::MIN),
                end: NaiveDate::from_ymd_opt(year, 12, 31).unwrap_or(NaiveDate::MIN),
                method: CalculationMethod::Karachi.name().to_string(),
                high_latitude_rule: HighLatitudeRule::default(),
                custom_fajr_angle: None,
                custom_isha_angle: None,
                offsets: PrayerOffsets::default(),
            },
            device: DeviceConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from pray2-config.toml
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from `path`.
    ///
    /// A missing file yields the defaults. A file that exists but does not
    /// parse is an error: silently generating for the default city would be
    /// worse than stopping.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(path = %path.display(), "no config file found, using defaults (Islamabad)");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let config: Config = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!(
            location = %config.location.name,
            method = %config.schedule.method,
            "loaded configuration"
        );
        Ok(config)
    }

    /// Save current configuration to pray2-config.toml
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to_path(DEFAULT_CONFIG_PATH)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "configuration saved");
        Ok(())
    }

    pub fn method(&self) -> Result<CalculationMethod, ConfigError> {
        Ok(self.schedule.method.parse()?)
    }

    pub fn utc_offset(&self) -> Result<FixedOffset, ConfigError> {
        parse_utc_offset(&self.location.utc_offset)
    }

    /// Angles for method CUSTOM, when both are configured.
    pub fn custom_params(&self) -> Option<MethodParams> {
        match (self.schedule.custom_fajr_angle, self.schedule.custom_isha_angle) {
            (Some(fajr_angle), Some(isha)) => Some(MethodParams {
                fajr_angle,
                isha: IshaRule::Angle(isha),
            }),
            _ => None,
        }
    }

    /// Solar oracle configured with this file's high-latitude rule and
    /// custom angles.
    pub fn solar_oracle(&self) -> SolarOracle {
        let oracle = SolarOracle::new(self.schedule.high_latitude_rule);
        match self.custom_params() {
            Some(params) => oracle.with_custom_params(params),
            None => oracle,
        }
    }

    /// Check every field and resolve the generation job.
    ///
    /// `now` stands in for the RTC seed when none is configured; it is
    /// converted to the configured offset first.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<Job, ConfigError> {
        let loc = &self.location;
        if !(-90.0..=90.0).contains(&loc.latitude) {
            return Err(ConfigError::Latitude(loc.latitude));
        }
        if !(-180.0..=180.0).contains(&loc.longitude) {
            return Err(ConfigError::Longitude(loc.longitude));
        }
        let timezone = self.utc_offset()?;

        let method = self.method()?;
        if method == CalculationMethod::Custom && self.custom_params().is_none() {
            return Err(ConfigError::CustomAngles);
        }

        let span = DateSpan::new(self.schedule.start, self.schedule.end)?;
        if span.day_count() > MAX_DAYS {
            return Err(ConfigError::TooManyDays(span.day_count()));
        }
        let year = span.start().year();
        if u16::try_from(year).is_err() {
            return Err(ConfigError::Year(year));
        }
        let relay = RelayDurations::new(self.device.relay_seconds)?;
        let rtc = match &self.device.rtc {
            Some(raw) => RtcField::parse(raw)?,
            None => RtcField::from_datetime(now.with_timezone(&timezone).naive_local()),
        };

        Ok(Job {
            span,
            site: Site {
                coordinates: Coordinates {
                    latitude: loc.latitude,
                    longitude: loc.longitude,
                },
                method,
                timezone,
            },
            offsets: self.schedule.offsets,
            relay,
            rtc,
            flags: Flags::rtc_one_shot(self.device.rtc_one_shot),
        })
    }
}

/// Parse "+05:00" / "-03:30" style offsets. "Z" and "UTC" mean zero.
pub fn parse_utc_offset(raw: &str) -> Result<FixedOffset, ConfigError> {
    let s = raw.trim();
    if s.eq_ignore_ascii_case("z") || s.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0).ok_or_else(|| ConfigError::UtcOffset(raw.to_string()));
    }
    s.parse::<FixedOffset>()
        .map_err(|_| ConfigError::UtcOffset(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, 28, 2, 15, 0).unwrap()
    }

    fn config_2025() -> Config {
        let mut config = Config::default();
        config.schedule.start = NaiveDate::from_ymd_opt(2025, 8, 28).unwrap();
        config.schedule.end = NaiveDate::from_ymd_opt(2025, 8, 29).unwrap();
        config
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.location.name, "Islamabad");
        assert_eq!(config.schedule.method, "KARACHI");
        assert_eq!(config.device.relay_seconds, [60, 45, 45, 45, 45]);
        assert!(config.device.rtc_one_shot);
        assert!(config.validate(now()).is_ok());
    }

    #[test]
    fn test_config_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pray2-config.toml");
        let mut config = config_2025();
        config.device.rtc = Some("07:15:00|01/01/25".to_string());
        config.schedule.offsets.dhuhr = 2;

        config.save_to_path(&path).unwrap();
        let loaded = Config::load_from_path(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from_path(dir.path().join("missing.toml")).unwrap();
        assert_eq!(config.location.name, "Islamabad");
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.toml");
        fs::write(&path, "[location]\nlatitude = \"north\"\n").unwrap();
        assert!(matches!(
            Config::load_from_path(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_partial_file_uses_device_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("minimal.toml");
        fs::write(
            &path,
            r#"
[location]
name = "Makkah"
latitude = 21.4225
longitude = 39.8262
utc_offset = "+03:00"

[schedule]
start = "2025-09-01"
end = "2025-09-30"
method = "UMM_AL_QURA"
"#,
        )
        .unwrap();
        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.device, DeviceConfig::default());
        assert!(config.schedule.offsets.is_zero());

        let job = config.validate(now()).unwrap();
        assert_eq!(job.span.day_count(), 30);
        assert_eq!(job.site.method, CalculationMethod::UmmAlQura);
        assert_eq!(job.site.timezone.local_minus_utc(), 3 * 3600);
    }

    #[test]
    fn test_rtc_defaults_to_now_in_local_offset() {
        let job = config_2025().validate(now()).unwrap();
        // 02:15 UTC is 07:15 at +05:00
        assert_eq!(job.rtc.as_str(), "07:15:00|28/08/25");
        assert_eq!(job.flags, Flags::RTC_ONE_SHOT);
    }

    #[test]
    fn test_rtc_seed_can_be_disabled() {
        let mut config = config_2025();
        config.device.rtc_one_shot = false;
        assert_eq!(config.validate(now()).unwrap().flags, Flags::empty());
    }

    #[test]
    fn test_rejects_out_of_range_coordinates() {
        let mut config = config_2025();
        config.location.latitude = 91.0;
        assert!(matches!(
            config.validate(now()),
            Err(ConfigError::Latitude(_))
        ));

        let mut config = config_2025();
        config.location.longitude = -180.5;
        assert!(matches!(
            config.validate(now()),
            Err(ConfigError::Longitude(_))
        ));
    }

    #[test]
    fn test_rejects_bad_fields() {
        let mut config = config_2025();
        config.schedule.method = "JAFARI".to_string();
        assert!(matches!(config.validate(now()), Err(ConfigError::Method(_))));

        let mut config = config_2025();
        config.location.utc_offset = "PKT".to_string();
        assert!(matches!(
            config.validate(now()),
            Err(ConfigError::UtcOffset(_))
        ));

        let mut config = config_2025();
        config.device.rtc = Some("7:15:00|1/1/25".to_string());
        assert!(matches!(config.validate(now()), Err(ConfigError::Rtc(_))));

        let mut config = config_2025();
        config.device.relay_seconds = [60, 45, 45, 45, 40_000];
        assert!(matches!(config.validate(now()), Err(ConfigError::Relay(_))));

        let mut config = config_2025();
        config.schedule.end = NaiveDate::from_ymd_opt(2025, 8, 1).unwrap();
        assert!(matches!(config.validate(now()), Err(ConfigError::Span(_))));
    }

    #[test]
    fn test_rejects_span_longer_than_day_count_field() {
        let mut config = config_2025();
        config.schedule.start = NaiveDate::from_ymd_opt(1900, 1, 1).unwrap();
        config.schedule.end = NaiveDate::from_ymd_opt(2100, 12, 31).unwrap();
        assert!(matches!(
            config.validate(now()),
            Err(ConfigError::TooManyDays(73_414))
        ));

        // 65535 days is the largest span the header can describe
        config.schedule.start = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
        config.schedule.end = config.schedule.start + chrono::Duration::days(65_534);
        assert_eq!(config.validate(now()).unwrap().span.day_count(), 65_535);
    }

    #[test]
    fn test_rejects_start_year_outside_header_field() {
        let mut config = config_2025();
        config.schedule.start = NaiveDate::MIN;
        config.schedule.end = NaiveDate::MIN;
        config.schedule.offsets.fajr = -600;
        assert!(matches!(config.validate(now()), Err(ConfigError::Year(_))));

        config.schedule.start = NaiveDate::from_ymd_opt(-1, 12, 31).unwrap();
        config.schedule.end = NaiveDate::from_ymd_opt(0, 1, 1).unwrap();
        assert!(matches!(
            config.validate(now()),
            Err(ConfigError::Year(-1))
        ));

        config.schedule.start = NaiveDate::from_ymd_opt(0, 1, 1).unwrap();
        assert!(config.validate(now()).is_ok());
    }

    #[test]
    fn test_custom_method_needs_angles() {
        let mut config = config_2025();
        config.schedule.method = "CUSTOM".to_string();
        assert!(matches!(
            config.validate(now()),
            Err(ConfigError::CustomAngles)
        ));

        config.schedule.custom_fajr_angle = Some(16.0);
        config.schedule.custom_isha_angle = Some(14.0);
        let job = config.validate(now()).unwrap();
        assert_eq!(job.site.method, CalculationMethod::Custom);
        assert_eq!(
            config.solar_oracle().custom,
            Some(MethodParams {
                fajr_angle: 16.0,
                isha: IshaRule::Angle(14.0)
            })
        );
    }

    #[test]
    fn test_parse_utc_offset() {
        assert_eq!(
            parse_utc_offset("+05:00").unwrap().local_minus_utc(),
            5 * 3600
        );
        assert_eq!(
            parse_utc_offset("-03:30").unwrap().local_minus_utc(),
            -(3 * 3600 + 30 * 60)
        );
        assert_eq!(parse_utc_offset("Z").unwrap().local_minus_utc(), 0);
        assert!(parse_utc_offset("5").is_err());
    }
}
