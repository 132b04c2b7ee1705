//! Dual-direction coordination
//!
//! The QCA7000 SPI bus is full duplex: every record carries one chunk per
//! line. The coordinator feeds each line to its own reassembler, always the
//! received (MISO) side first, and forwards completed frames to the sink as
//! soon as they finish. Records must arrive in capture order.

use serde::Serialize;

use crate::config::DecoderConfig;
use crate::reassembler::{DirectionStats, FrameReassembler};
use crate::sink::CaptureSink;
use crate::types::{CaptureRecord, CompletedFrame, Direction, Result};

/// Final counts of a decoding run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DecodeSummary {
    /// Capture records consumed
    pub records: u64,
    /// Device-to-host (MISO) counters
    pub received: DirectionStats,
    /// Host-to-device (MOSI) counters
    pub transmitted: DirectionStats,
}

impl DecodeSummary {
    pub fn total_frames(&self) -> u64 {
        self.received.frames + self.transmitted.frames
    }

    pub fn total_framing_errors(&self) -> u64 {
        self.received.framing_errors() + self.transmitted.framing_errors()
    }
}

/// Drives the received and transmitted reassemblers from one record stream
pub struct DualDirectionCoordinator<S: CaptureSink> {
    received: FrameReassembler,
    transmitted: FrameReassembler,
    sink: S,
    records: u64,
}

impl<S: CaptureSink> DualDirectionCoordinator<S> {
    pub fn new(sink: S) -> Self {
        Self::with_config(sink, &DecoderConfig::default())
    }

    pub fn with_config(sink: S, config: &DecoderConfig) -> Self {
        Self {
            received: FrameReassembler::new(Direction::Received)
                .with_footer_verification(config.verify_footer),
            transmitted: FrameReassembler::new(Direction::Transmitted)
                .with_footer_verification(config.verify_footer),
            sink,
            records: 0,
        }
    }

    /// Feed one record to both reassemblers.
    ///
    /// Only sink failures are returned; framing problems are handled by the
    /// reassemblers themselves.
    pub fn process(&mut self, record: &CaptureRecord) -> Result<()> {
        self.records += 1;

        if let Some(frame) = self.received.feed(record.timestamp, record.device_to_host) {
            self.forward(Direction::Received, frame)?;
        }
        if let Some(frame) = self.transmitted.feed(record.timestamp, record.host_to_device) {
            self.forward(Direction::Transmitted, frame)?;
        }

        Ok(())
    }

    /// Process a whole record stream, stopping at the first read or write error
    pub fn run<I>(&mut self, records: I) -> Result<DecodeSummary>
    where
        I: IntoIterator<Item = Result<CaptureRecord>>,
    {
        for record in records {
            self.process(&record?)?;
        }

        Ok(self.summary())
    }

    fn forward(&mut self, direction: Direction, frame: CompletedFrame) -> Result<()> {
        log::info!("{} {}", direction.prefix(), frame.summary());
        self.sink.append(direction, &frame)
    }

    pub fn summary(&self) -> DecodeSummary {
        DecodeSummary {
            records: self.records,
            received: self.received.stats(),
            transmitted: self.transmitted.stats(),
        }
    }

    pub fn reassembler(&self, direction: Direction) -> &FrameReassembler {
        match direction {
            Direction::Received => &self.received,
            Direction::Transmitted => &self.transmitted,
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}
