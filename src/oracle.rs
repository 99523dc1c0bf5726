//! # Time Oracle Interface
//!
//! The table builder never computes prayer times itself. It asks a
//! [`TimeOracle`] for the local clock times of each date and treats the answer
//! as opaque. [`crate::solar::SolarOracle`] is the astronomical implementation;
//! tests plug in fixture oracles with hand-picked schedules.

use crate::method::CalculationMethod;
use crate::DailyTimes;
use chrono::{FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Installation coordinates in decimal degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// North positive, -90..=90
    pub latitude: f64,
    /// East positive, -180..=180
    pub longitude: f64,
}

/// Reasons an oracle cannot produce times for a date.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OracleError {
    /// The sun never reaches the angle that defines this event on this date
    /// (polar day/night, or unreachable twilight without a high-latitude rule)
    #[error("{event} is undefined on {date} at the given location")]
    NoSolution { date: NaiveDate, event: &'static str },

    /// CUSTOM was selected but no angles were supplied
    #[error("method CUSTOM needs explicit Fajr/Isha angles")]
    MissingCustomParams,

    /// Any other failure from an oracle implementation
    #[error("time oracle failed on {date}: {reason}")]
    Failed { date: NaiveDate, reason: String },
}

/// Source of local prayer clock times.
///
/// Implementations must be deterministic for identical arguments. A failure
/// for any single date is fatal for the whole span being generated.
pub trait TimeOracle {
    fn times(
        &self,
        date: NaiveDate,
        coordinates: Coordinates,
        method: CalculationMethod,
        timezone: FixedOffset,
    ) -> Result<DailyTimes, OracleError>;
}

impl<T: TimeOracle + ?Sized> TimeOracle for &T {
    fn times(
        &self,
        date: NaiveDate,
        coordinates: Coordinates,
        method: CalculationMethod,
        timezone: FixedOffset,
    ) -> Result<DailyTimes, OracleError> {
        (**self).times(date, coordinates, method, timezone)
    }
}
