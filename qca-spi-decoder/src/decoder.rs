//! Main decoder API
//!
//! This module provides the primary interface for the decoder library.
//! The Decoder struct wires a capture reader, the dual-direction
//! coordinator and a capture sink together.

use crate::config::DecoderConfig;
use crate::coordinator::{DecodeSummary, DualDirectionCoordinator};
use crate::formats::open_capture;
use crate::sink::{CaptureSink, PcapWriter};
use crate::types::{CaptureRecord, Result};
use std::path::Path;

/// The main decoder struct - entry point for all decoding operations
#[derive(Debug, Clone, Default)]
pub struct Decoder {
    config: DecoderConfig,
}

impl Decoder {
    /// Create a new decoder instance
    pub fn new(config: DecoderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Convert a logic analyzer capture into a PCAP file
    ///
    /// # Arguments
    /// * `input` - Saleae Logic CSV export of the SPI analyzer
    /// * `output` - PCAP file to create (an existing file is replaced)
    ///
    /// # Example
    /// ```no_run
    /// use qca_spi_decoder::{Decoder, DecoderConfig};
    /// use std::path::Path;
    ///
    /// let decoder = Decoder::new(DecoderConfig::new());
    /// let summary = decoder
    ///     .decode_file(Path::new("spi.csv"), Path::new("spi.pcap"))
    ///     .unwrap();
    /// println!("TX packets: {}", summary.transmitted.frames);
    /// ```
    pub fn decode_file(&self, input: &Path, output: &Path) -> Result<DecodeSummary> {
        log::info!("Decoding capture file: {:?}", input);

        let mut records = open_capture(input, self.config.format)?.peekable();
        let first_timestamp = match records.peek() {
            Some(Ok(record)) => Some(record.timestamp),
            _ => None,
        };
        let base = self.config.timestamp_base(first_timestamp);
        log::debug!("PCAP time base: {}", base);

        let mut sink = PcapWriter::create(output, base, self.config.precision)?;
        let summary = self.decode_into(records, &mut sink)?;
        sink.flush()?;

        log::info!(
            "Wrote {} frame(s) to {:?}",
            sink.frames_written(),
            output
        );
        Ok(summary)
    }

    /// Decode an already opened record stream into any sink
    pub fn decode_into<I, S>(&self, records: I, sink: S) -> Result<DecodeSummary>
    where
        I: IntoIterator<Item = Result<CaptureRecord>>,
        S: CaptureSink,
    {
        let mut coordinator = DualDirectionCoordinator::with_config(sink, &self.config);
        let summary = coordinator.run(records)?;

        log::info!(
            "Processed {} record(s): {} received, {} transmitted, {} framing error(s)",
            summary.records,
            summary.received.frames,
            summary.transmitted.frames,
            summary.total_framing_errors()
        );
        Ok(summary)
    }
}
