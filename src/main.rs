//! # PRAY2 Generator Entry Point
//!
//! Loads `pray2-config.toml`, applies command-line overrides, computes the
//! schedule with the built-in solar oracle and writes the PRAY2 file for the
//! relay controller's SD card.
//!
//! `--preview` is the development mode: it prints the table to stdout and
//! writes nothing.

// Test modules
#[cfg(test)]
mod tests;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::Parser;
use pray2_lib::config::{Config, DEFAULT_CONFIG_PATH};
use pray2_lib::generate::{default_file_name, generate};
use pray2_lib::method::CalculationMethod;
use pray2_lib::preview;
use pray2_lib::{DateSpan, SpanError};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Output file (default: prayer_{year}_{start}-{end}_{METHOD}.bin)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// First date, YYYY-MM-DD
    #[arg(long)]
    start: Option<NaiveDate>,

    /// Last date, YYYY-MM-DD (inclusive)
    #[arg(long)]
    end: Option<NaiveDate>,

    /// Whole calendar year; overrides --start/--end
    #[arg(short, long)]
    year: Option<i32>,

    /// Single month of --year (1-12)
    #[arg(long, requires = "year")]
    month: Option<u32>,

    /// Number of contiguous months from --month, clamped at December
    #[arg(long, requires = "month")]
    months: Option<u32>,

    /// Calculation method name, e.g. KARACHI
    #[arg(short, long)]
    method: Option<String>,

    /// RTC seed "HH:MM:SS|DD/MM/YY" (default: now, in the configured offset)
    #[arg(long)]
    rtc: Option<String>,

    /// Do not ask the device to load the RTC field
    #[arg(long)]
    no_rtc_seed: bool,

    /// Print the table to stdout instead of writing a file
    #[arg(long)]
    preview: bool,

    /// Write a default config file to --config and exit
    #[arg(long)]
    write_default_config: bool,

    /// List calculation methods and their header codes
    #[arg(long)]
    list_methods: bool,
}

impl Cli {
    /// Span selected with --year/--month/--months, if any.
    fn calendar_span(&self) -> Result<Option<DateSpan>, SpanError> {
        let Some(year) = self.year else {
            return Ok(None);
        };
        let span = match (self.month, self.months) {
            (Some(month), Some(count)) => DateSpan::months(year, month, count)?,
            (Some(month), None) => DateSpan::month(year, month)?,
            (None, _) => DateSpan::full_year(year)?,
        };
        Ok(Some(span))
    }

    /// Command-line values win over the config file.
    fn apply_overrides(&self, config: &mut Config) -> Result<(), SpanError> {
        if let Some(start) = self.start {
            config.schedule.start = start;
        }
        if let Some(end) = self.end {
            config.schedule.end = end;
        }
        if let Some(span) = self.calendar_span()? {
            config.schedule.start = span.start();
            config.schedule.end = span.end();
        }
        if let Some(method) = &self.method {
            config.schedule.method = method.clone();
        }
        if let Some(rtc) = &self.rtc {
            config.device.rtc = Some(rtc.clone());
        }
        if self.no_rtc_seed {
            config.device.rtc_one_shot = false;
        }
        if let Some(out) = &self.out {
            config.output.path = Some(out.clone());
        }
        Ok(())
    }
}

/// Write the encoded file and report its size.
fn write_output(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .with_context(|| format!("creating output directory {}", dir.display()))?;
    }
    fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))?;
    info!(
        path = %path.display(),
        bytes = bytes.len(),
        kib = format!("{:.1}", bytes.len() as f64 / 1024.0),
        "wrote PRAY2 file"
    );
    Ok(())
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so --preview output stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("RUST_LOG")
                .unwrap_or_else(|_| EnvFilter::new("pray2_gen=info,pray2_lib=info")),
        )
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let cli = Cli::parse();
    debug!(?cli, "parsed command line");

    if cli.list_methods {
        for method in CalculationMethod::ALL {
            println!("{:>2}  {:<24} {}", method.code(), method.name(), method.description());
        }
        return Ok(());
    }

    if cli.write_default_config {
        Config::default()
            .save_to_path(&cli.config)
            .with_context(|| format!("saving {}", cli.config.display()))?;
        return Ok(());
    }

    let mut config = Config::load_from_path(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    cli.apply_overrides(&mut config)
        .context("invalid date span on the command line")?;

    let job = config
        .validate(Utc::now())
        .context("invalid configuration")?;
    info!(
        location = %config.location.name,
        latitude = config.location.latitude,
        longitude = config.location.longitude,
        utc_offset = %job.site.timezone,
        "resolved job"
    );

    let oracle = config.solar_oracle();
    let output = generate(&job, &oracle).context("schedule generation failed")?;

    // Development mode: table to stdout, nothing written
    if cli.preview {
        preview::print_table(&job.span, &output.rows);
        return Ok(());
    }

    let path = config
        .output
        .path
        .clone()
        .unwrap_or_else(|| PathBuf::from(default_file_name(&job)));
    write_output(&path, &output.bytes)
}
