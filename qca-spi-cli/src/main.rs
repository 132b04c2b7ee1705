//! QCA7000 SPI to PCAP CLI Application
//!
//! Command-line front end for the qca-spi-decoder library. It converts a
//! Saleae Logic SPI export of a QCA7000 HomePlug Green PHY into a PCAP file
//! suitable for Wireshark and prints per-direction packet counts.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use qca_spi_decoder::{CaptureFormat, Decoder, TimestampPrecision};
use std::path::PathBuf;

mod config;
mod report;

/// QCA7000 SPI capture to PCAP converter
#[derive(Parser, Debug)]
#[command(name = "qca-spi-cli")]
#[command(about = "Convert QCA7000 SPI logic analyzer exports to PCAP", long_about = None)]
#[command(version)]
pub struct Args {
    /// Saleae Logic CSV export of the decoded SPI bus
    #[arg(short, long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// PCAP file to write (replaced if it exists)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Path to configuration file (TOML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Capture layout: auto, logic1 or logic2
    #[arg(long, value_name = "FORMAT")]
    format: Option<CaptureFormat>,

    /// Drop frames that are not followed by the 0x5555 footer
    #[arg(long)]
    verify_footer: bool,

    /// Wall-clock time of capture time zero (RFC 3339, e.g. 2021-06-01T12:00:00Z)
    #[arg(long, value_name = "TIME")]
    start_time: Option<DateTime<Utc>>,

    /// Write nanosecond-resolution timestamps
    #[arg(long)]
    nanosecond: bool,

    /// Also write the decode summary as JSON
    #[arg(long, value_name = "FILE")]
    summary_json: Option<PathBuf>,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    log::info!("QCA SPI CLI v{}", env!("CARGO_PKG_VERSION"));
    log::debug!("Using decoder library v{}", qca_spi_decoder::VERSION);

    let app_config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => config::AppConfig::default(),
    };

    let plan = app_config.merge(&args)?;
    log::debug!("Resolved run: {:?}", plan);

    let decoder = Decoder::new(plan.decoder.clone());
    let summary = decoder
        .decode_file(&plan.input, &plan.output)
        .with_context(|| format!("Failed to convert {:?} to {:?}", plan.input, plan.output))?;

    if !args.quiet {
        report::print_summary(&summary);
    }

    if let Some(path) = &plan.summary_json {
        report::write_json(path, &summary)?;
        log::info!("Summary written to {:?}", path);
    }

    Ok(())
}

impl Args {
    fn precision(&self) -> Option<TimestampPrecision> {
        self.nanosecond.then_some(TimestampPrecision::Nano)
    }
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
