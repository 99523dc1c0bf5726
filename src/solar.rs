//! Low-precision solar ephemeris & prayer-time oracle
//!
//! Sun declination and equation of time from the USNO "approximate solar
//! coordinates" series, accurate to about a minute of clock time between
//! 1950 and 2050. Event times follow the usual hour-angle construction:
//! Dhuhr at transit, Sunrise/Maghrib at 0.833° depression (refraction plus
//! solar semi-diameter), Asr at shadow factor 1, Fajr/Isha at the method's
//! twilight angles.

use crate::method::{CalculationMethod, IshaRule, MethodParams};
use crate::oracle::{Coordinates, OracleError, TimeOracle};
use crate::DailyTimes;
use chrono::{Datelike, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Depression of the sun's centre at apparent sunrise/sunset, degrees.
const RISE_SET_ANGLE: f64 = 0.833;

/// Shadow length factor for Asr (object height + 1 × object height).
const ASR_SHADOW_FACTOR: f64 = 1.0;

/// What to do with Fajr/Isha when twilight is too long (or never ends).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HighLatitudeRule {
    /// Use the raw angle result; unreachable angles are an error.
    None,
    /// Fajr no earlier than half the night before sunrise, Isha likewise after sunset.
    #[default]
    MiddleOfTheNight,
    /// Bound by one seventh of the night.
    SeventhOfTheNight,
    /// Bound by `angle / 60` of the night.
    TwilightAngle,
}

impl HighLatitudeRule {
    fn night_fraction(self, angle: f64) -> Option<f64> {
        match self {
            HighLatitudeRule::None => None,
            HighLatitudeRule::MiddleOfTheNight => Some(1.0 / 2.0),
            HighLatitudeRule::SeventhOfTheNight => Some(1.0 / 7.0),
            HighLatitudeRule::TwilightAngle => Some(angle / 60.0),
        }
    }
}

/// Apparent solar coordinates for one instant.
#[derive(Debug, Clone, Copy)]
pub struct SolarPosition {
    /// Declination, degrees.
    pub declination: f64,
    /// Equation of time, hours (apparent minus mean solar time).
    pub equation_of_time: f64,
}

/// Julian day at 0h UT of a proleptic-Gregorian Y-M-D.
pub fn julian_day(year: i32, month: u32, day: u32) -> f64 {
    // ---------- Jan/Feb belong to the previous "March-based" year ----------
    let (mut y, mut m) = (year as f64, month as f64);
    if m <= 2.0 {
        y -= 1.0;
        m += 12.0;
    }
    let a = (y / 100.0).floor();
    let b = 2.0 - a + (a / 4.0).floor();
    (365.25 * (y + 4716.0)).floor() + (30.6001 * (m + 1.0)).floor() + day as f64 + b - 1524.5
}

/// Sun declination & equation of time at Julian day `jd`.
pub fn sun_position(jd: f64) -> SolarPosition {
    let d = jd - 2_451_545.0; // days since J2000.0

    let g = fix_angle(357.529 + 0.985_600_28 * d); // mean anomaly
    let q = fix_angle(280.459 + 0.985_647_36 * d); // mean longitude
    let l = fix_angle(q + 1.915 * dsin(g) + 0.020 * dsin(2.0 * g)); // ecliptic longitude
    let e = 23.439 - 0.000_000_36 * d; // obliquity

    let ra = fix_hour(datan2(dcos(e) * dsin(l), dcos(l)) / 15.0);

    SolarPosition {
        declination: darcsin(dsin(e) * dsin(l)),
        equation_of_time: q / 15.0 - ra,
    }
}

/// Prayer-time oracle backed by the solar ephemeris above.
#[derive(Debug, Clone, Copy, Default)]
pub struct SolarOracle {
    pub high_latitude_rule: HighLatitudeRule,
    /// Angles used when the method is `CUSTOM`.
    pub custom: Option<MethodParams>,
}

impl SolarOracle {
    pub fn new(high_latitude_rule: HighLatitudeRule) -> Self {
        SolarOracle {
            high_latitude_rule,
            custom: None,
        }
    }

    pub fn with_custom_params(mut self, params: MethodParams) -> Self {
        self.custom = Some(params);
        self
    }

    fn params_for(&self, method: CalculationMethod) -> Result<MethodParams, OracleError> {
        method
            .params()
            .or(self.custom)
            .ok_or(OracleError::MissingCustomParams)
    }
}

/// Per-date state for the hour-angle computations.
struct SolarDay {
    /// Julian day of local midnight at the observer's longitude
    jd: f64,
    latitude: f64,
}

impl SolarDay {
    /// Solar transit, hours of local mean time.
    fn mid_day(&self, portion: f64) -> f64 {
        let eqt = sun_position(self.jd + portion).equation_of_time;
        fix_hour(12.0 - eqt)
    }

    /// Time at which the sun is `angle` degrees below the horizon.
    /// `before_noon` selects the morning crossing.
    fn sun_angle_time(&self, angle: f64, portion: f64, before_noon: bool) -> Option<f64> {
        let decl = sun_position(self.jd + portion).declination;
        let noon = self.mid_day(portion);
        let cos_h = (-dsin(angle) - dsin(decl) * dsin(self.latitude))
            / (dcos(decl) * dcos(self.latitude));
        if !(-1.0..=1.0).contains(&cos_h) {
            return None;
        }
        let h = darccos(cos_h) / 15.0;
        Some(if before_noon { noon - h } else { noon + h })
    }

    fn asr_time(&self, factor: f64, portion: f64) -> Option<f64> {
        let decl = sun_position(self.jd + portion).declination;
        let altitude = darccot(factor + dtan((self.latitude - decl).abs()));
        self.sun_angle_time(-altitude, portion, false)
    }
}

impl TimeOracle for SolarOracle {
    fn times(
        &self,
        date: NaiveDate,
        coordinates: Coordinates,
        method: CalculationMethod,
        timezone: FixedOffset,
    ) -> Result<DailyTimes, OracleError> {
        let params = self.params_for(method)?;
        let no_solution = |event: &'static str| OracleError::NoSolution { date, event };

        // ---------- 1. Julian day at local midnight of the observer ----------
        let day = SolarDay {
            jd: julian_day(date.year(), date.month(), date.day())
                - coordinates.longitude / (15.0 * 24.0),
            latitude: coordinates.latitude,
        };

        // ---------- 2. Raw event times (hours, local mean time) ----------
        // Initial guesses (5h, 6h, 12h ...) pick the day portion at which the
        // sun position is sampled for each event.
        let sunrise = day
            .sun_angle_time(RISE_SET_ANGLE, 6.0 / 24.0, true)
            .ok_or_else(|| no_solution("Sunrise"))?;
        let sunset = day
            .sun_angle_time(RISE_SET_ANGLE, 18.0 / 24.0, false)
            .ok_or_else(|| no_solution("Maghrib"))?;
        let dhuhr = day.mid_day(12.0 / 24.0);
        let asr = day
            .asr_time(ASR_SHADOW_FACTOR, 13.0 / 24.0)
            .ok_or_else(|| no_solution("Asr"))?;
        let fajr = day.sun_angle_time(params.fajr_angle, 5.0 / 24.0, true);

        // ---------- 3. High-latitude bounds for the twilight prayers ----------
        let night = 24.0 - (sunset - sunrise);
        let fajr = bound_twilight(
            fajr,
            sunrise,
            night,
            self.high_latitude_rule.night_fraction(params.fajr_angle),
            true,
        )
        .ok_or_else(|| no_solution("Fajr"))?;

        // ---------- 4. Local mean time → zone clock, rounded to the minute ----------
        let zone_shift = timezone.local_minus_utc() as f64 / 3600.0 - coordinates.longitude / 15.0;
        let midnight = date.and_time(NaiveTime::MIN);
        let to_clock = |hours: f64| -> NaiveDateTime {
            midnight + Duration::minutes(((hours + zone_shift) * 60.0).round() as i64)
        };

        let maghrib = to_clock(sunset);
        let isha = match params.isha {
            IshaRule::Angle(angle) => {
                let hours = bound_twilight(
                    day.sun_angle_time(angle, 18.0 / 24.0, false),
                    sunset,
                    night,
                    self.high_latitude_rule.night_fraction(angle),
                    false,
                )
                .ok_or_else(|| no_solution("Isha"))?;
                to_clock(hours)
            }
            IshaRule::MinutesAfterMaghrib(minutes) => maghrib + Duration::minutes(minutes),
        };

        Ok(DailyTimes {
            fajr: to_clock(fajr),
            sunrise: to_clock(sunrise),
            dhuhr: to_clock(dhuhr),
            asr: to_clock(asr),
            maghrib,
            isha,
        })
    }
}

/// Keep a twilight time within `fraction × night` of its base event.
///
/// Fajr (`before_base`) is measured back from sunrise, Isha forward from
/// sunset. With no rule the raw time is returned as is, so an unreachable
/// angle stays `None`.
fn bound_twilight(
    time: Option<f64>,
    base: f64,
    night: f64,
    fraction: Option<f64>,
    before_base: bool,
) -> Option<f64> {
    let Some(fraction) = fraction else {
        return time;
    };
    let portion = fraction * night;
    let bounded = if before_base {
        base - portion
    } else {
        base + portion
    };
    match time {
        Some(t) => {
            let gap = if before_base { base - t } else { t - base };
            Some(if gap > portion { bounded } else { t })
        }
        None => Some(bounded),
    }
}

// ---------- degree-based trigonometry ----------

fn dsin(d: f64) -> f64 {
    d.to_radians().sin()
}

fn dcos(d: f64) -> f64 {
    d.to_radians().cos()
}

fn dtan(d: f64) -> f64 {
    d.to_radians().tan()
}

fn darcsin(x: f64) -> f64 {
    x.asin().to_degrees()
}

fn darccos(x: f64) -> f64 {
    x.acos().to_degrees()
}

fn datan2(y: f64, x: f64) -> f64 {
    y.atan2(x).to_degrees()
}

fn darccot(x: f64) -> f64 {
    (1.0 / x).atan().to_degrees()
}

fn fix_angle(a: f64) -> f64 {
    a.rem_euclid(360.0)
}

fn fix_hour(h: f64) -> f64 {
    h.rem_euclid(24.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    const ISLAMABAD: Coordinates = Coordinates {
        latitude: 33.6844,
        longitude: 73.0479,
    };

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn tz(hours: i32) -> FixedOffset {
        FixedOffset::east_opt(hours * 3600).unwrap()
    }

    fn minute_of_day(t: NaiveDateTime) -> u32 {
        t.hour() * 60 + t.minute()
    }

    fn hm(h: u32, m: u32) -> u32 {
        h * 60 + m
    }

    #[test]
    fn test_julian_day_epoch() {
        // 2000-01-01 0h UT is JD 2451544.5
        assert_eq!(julian_day(2000, 1, 1), 2_451_544.5);
    }

    #[test]
    fn test_declination_near_solstice() {
        let jd = julian_day(2025, 6, 21) + 0.5;
        let pos = sun_position(jd);
        assert!((pos.declination - 23.44).abs() < 0.1, "{}", pos.declination);
        // Equation of time stays within about a quarter hour all year
        assert!(pos.equation_of_time.abs() < 0.3);
    }

    #[test]
    fn test_islamabad_karachi_times_are_plausible() {
        let oracle = SolarOracle::default();
        let t = oracle
            .times(ymd(2025, 8, 28), ISLAMABAD, CalculationMethod::Karachi, tz(5))
            .unwrap();

        let fajr = minute_of_day(t.fajr);
        let sunrise = minute_of_day(t.sunrise);
        let dhuhr = minute_of_day(t.dhuhr);
        let asr = minute_of_day(t.asr);
        let maghrib = minute_of_day(t.maghrib);
        let isha = minute_of_day(t.isha);

        assert!((hm(4, 0)..=hm(4, 20)).contains(&fajr), "fajr {fajr}");
        assert!((hm(5, 30)..=hm(5, 45)).contains(&sunrise), "sunrise {sunrise}");
        assert!((hm(12, 5)..=hm(12, 15)).contains(&dhuhr), "dhuhr {dhuhr}");
        assert!((hm(15, 40)..=hm(15, 55)).contains(&asr), "asr {asr}");
        assert!((hm(18, 30)..=hm(18, 50)).contains(&maghrib), "maghrib {maghrib}");
        assert!((hm(19, 55)..=hm(20, 15)).contains(&isha), "isha {isha}");
    }

    #[test]
    fn test_times_are_whole_minutes() {
        let oracle = SolarOracle::default();
        let t = oracle
            .times(ymd(2025, 3, 1), ISLAMABAD, CalculationMethod::Egyptian, tz(5))
            .unwrap();
        for ts in [t.fajr, t.sunrise, t.dhuhr, t.asr, t.maghrib, t.isha] {
            assert_eq!(ts.second(), 0);
        }
    }

    #[test]
    fn test_umm_al_qura_isha_is_fixed_interval() {
        let oracle = SolarOracle::default();
        let makkah = Coordinates {
            latitude: 21.4225,
            longitude: 39.8262,
        };
        let t = oracle
            .times(ymd(2025, 8, 28), makkah, CalculationMethod::UmmAlQura, tz(3))
            .unwrap();
        assert_eq!(t.isha - t.maghrib, Duration::minutes(90));
    }

    #[test]
    fn test_leap_day_is_computed() {
        let oracle = SolarOracle::default();
        let t = oracle
            .times(ymd(2024, 2, 29), ISLAMABAD, CalculationMethod::NorthAmerica, tz(5))
            .unwrap();
        assert!(t.fajr < t.sunrise && t.sunrise < t.dhuhr);
        assert!(t.dhuhr < t.asr && t.asr < t.maghrib && t.maghrib < t.isha);
    }

    #[test]
    fn test_polar_day_has_no_sunset() {
        let oracle = SolarOracle::default();
        let longyearbyen = Coordinates {
            latitude: 78.22,
            longitude: 15.65,
        };
        let err = oracle
            .times(ymd(2025, 6, 21), longyearbyen, CalculationMethod::Karachi, tz(2))
            .unwrap_err();
        assert!(matches!(err, OracleError::NoSolution { event: "Sunrise", .. }));
    }

    #[test]
    fn test_high_latitude_rule_bounds_twilight() {
        let london = Coordinates {
            latitude: 51.5074,
            longitude: -0.1278,
        };
        let date = ymd(2025, 6, 21);

        // 18° twilight never ends in a London midsummer night.
        let strict = SolarOracle::new(HighLatitudeRule::None);
        let err = strict
            .times(date, london, CalculationMethod::MuslimWorldLeague, tz(1))
            .unwrap_err();
        assert!(matches!(err, OracleError::NoSolution { event: "Fajr", .. }));

        let lenient = SolarOracle::new(HighLatitudeRule::SeventhOfTheNight);
        let t = lenient
            .times(date, london, CalculationMethod::MuslimWorldLeague, tz(1))
            .unwrap();
        assert!(t.fajr < t.sunrise);
        assert!(t.isha > t.maghrib);
        assert!(t.sunrise - t.fajr < Duration::hours(2));
    }

    #[test]
    fn test_custom_method_needs_angles() {
        let oracle = SolarOracle::default();
        let err = oracle
            .times(ymd(2025, 8, 28), ISLAMABAD, CalculationMethod::Custom, tz(5))
            .unwrap_err();
        assert_eq!(err, OracleError::MissingCustomParams);

        let custom = oracle.with_custom_params(MethodParams {
            fajr_angle: 18.0,
            isha: IshaRule::Angle(18.0),
        });
        let a = custom
            .times(ymd(2025, 8, 28), ISLAMABAD, CalculationMethod::Custom, tz(5))
            .unwrap();
        let b = custom
            .times(ymd(2025, 8, 28), ISLAMABAD, CalculationMethod::Karachi, tz(5))
            .unwrap();
        assert_eq!(a, b);
    }
}
