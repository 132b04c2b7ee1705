//! Run summary output
//!
//! Prints the per-direction packet counts at the end of a conversion and
//! optionally writes them as JSON.

use anyhow::{Context, Result};
use qca_spi_decoder::{DecodeSummary, DirectionStats};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Render the summary as plain text
pub fn format_summary(summary: &DecodeSummary) -> String {
    let mut text = format!(
        "TX packets: {}  RX packets: {}\n",
        summary.transmitted.frames, summary.received.frames
    );
    text.push_str(&format!("Records processed: {}\n", summary.records));

    if summary.total_framing_errors() > 0 {
        text.push_str(&framing_line("TX", &summary.transmitted));
        text.push_str(&framing_line("RX", &summary.received));
    }
    text
}

fn framing_line(prefix: &str, stats: &DirectionStats) -> String {
    format!(
        "{} framing errors: {} bad header, {} bad padding, {} bad footer\n",
        prefix, stats.bad_headers, stats.bad_padding, stats.bad_footers
    )
}

pub fn print_summary(summary: &DecodeSummary) {
    print!("{}", format_summary(summary));
}

/// Write the summary as pretty-printed JSON
pub fn write_json(path: &Path, summary: &DecodeSummary) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create summary file: {:?}", path))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, summary)
        .with_context(|| format!("Failed to write summary file: {:?}", path))?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DecodeSummary {
        DecodeSummary {
            records: 1200,
            received: DirectionStats { frames: 3, bad_headers: 1, ..Default::default() },
            transmitted: DirectionStats { frames: 5, ..Default::default() },
        }
    }

    #[test]
    fn test_text_summary() {
        let text = format_summary(&sample());
        assert!(text.starts_with("TX packets: 5  RX packets: 3\n"));
        assert!(text.contains("Records processed: 1200"));
        assert!(text.contains("RX framing errors: 1 bad header, 0 bad padding, 0 bad footer"));
    }

    #[test]
    fn test_clean_run_has_no_framing_lines() {
        let text = format_summary(&DecodeSummary::default());
        assert!(!text.contains("framing"));
    }

    #[test]
    fn test_json_summary() {
        let file = tempfile::NamedTempFile::new().unwrap();
        write_json(file.path(), &sample()).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(file.path()).unwrap()).unwrap();
        assert_eq!(value["records"], 1200);
        assert_eq!(value["received"]["frames"], 3);
        assert_eq!(value["received"]["bad_headers"], 1);
        assert_eq!(value["transmitted"]["frames"], 5);
    }
}
