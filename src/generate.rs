//! # Generation Pipeline
//!
//! One call from a resolved [`Job`] to finished PRAY2 bytes: build the table
//! through the oracle, then encode. No I/O happens here; the binary decides
//! where the bytes go.

use crate::oracle::TimeOracle;
use crate::pray2::{encode, EncodeError, EncodeRequest, Flags, RelayDurations};
use crate::rtc::RtcField;
use crate::schedule::{build_table, PrayerOffsets, ScheduleError, Site};
use crate::{DateSpan, ScheduleRow};
use chrono::Datelike;
use thiserror::Error;
use tracing::info;

/// Any failure of a generation run. Nothing is produced when this is returned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerateError {
    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error("encoding failed: {0}")]
    Encode(#[from] EncodeError),
}

/// Fully validated inputs for one file.
#[derive(Clone, Debug, PartialEq)]
pub struct Job {
    pub span: DateSpan,
    pub site: Site,
    pub offsets: PrayerOffsets,
    pub relay: RelayDurations,
    pub rtc: RtcField,
    pub flags: Flags,
}

/// Result of a run: the rows (for previews) and the encoded file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Output {
    pub rows: Vec<ScheduleRow>,
    pub bytes: Vec<u8>,
}

/// Build the schedule for `job` and encode it.
pub fn generate<O: TimeOracle>(job: &Job, oracle: &O) -> Result<Output, GenerateError> {
    info!(
        span = %job.span,
        days = job.span.day_count(),
        method = %job.site.method,
        "generating prayer schedule"
    );

    let rows = build_table(&job.span, &job.site, &job.offsets, oracle)?;
    let bytes = encode(&EncodeRequest {
        span: &job.span,
        method: job.site.method.name(),
        flags: job.flags,
        rtc: &job.rtc,
        relay: job.relay,
        rows: &rows,
    })?;

    info!(
        bytes = bytes.len(),
        rtc = %job.rtc,
        one_shot = job.flags.contains(Flags::RTC_ONE_SHOT),
        "PRAY2 file ready"
    );
    Ok(Output { rows, bytes })
}

/// `prayer_{year}_{YYYYMMDD}-{YYYYMMDD}_{METHOD}.bin`
pub fn default_file_name(job: &Job) -> String {
    format!(
        "prayer_{}_{}_{}.bin",
        job.span.start().year(),
        job.span,
        job.site.method.name()
    )
}
