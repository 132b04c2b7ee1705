//! Classic libpcap file writer
//!
//! Writes the 24-byte global header followed by one 16-byte record header
//! and the raw frame bytes per frame. Everything is little-endian. See
//! <https://wiki.wireshark.org/Development/LibpcapFileFormat>.

use byteorder::{LittleEndian, WriteBytesExt};
use chrono::{DateTime, TimeDelta, Utc};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::CaptureSink;
use crate::config::TimestampPrecision;
use crate::types::{CompletedFrame, DecoderError, Direction, Result, Timestamp};

/// Magic number for microsecond timestamps
const MAGIC_MICROS: u32 = 0xA1B2_C3D4;
/// Magic number for nanosecond timestamps
const MAGIC_NANOS: u32 = 0xA1B2_3C4D;
const VERSION_MAJOR: u16 = 2;
const VERSION_MINOR: u16 = 4;
/// Largest frame the length header can announce
const SNAPLEN: u32 = 65535;
const LINKTYPE_ETHERNET: u32 = 1;

/// PCAP writer over any byte sink
pub struct PcapWriter<W: Write> {
    writer: W,
    base: DateTime<Utc>,
    precision: TimestampPrecision,
    frames_written: u64,
}

impl PcapWriter<BufWriter<File>> {
    /// Create (or truncate) a PCAP file at `path`
    pub fn create(
        path: &Path,
        base: DateTime<Utc>,
        precision: TimestampPrecision,
    ) -> Result<Self> {
        log::info!("Creating PCAP file: {:?}", path);
        let file = File::create(path)?;
        Self::new(BufWriter::new(file), base, precision)
    }
}

impl<W: Write> PcapWriter<W> {
    /// Wrap `writer` and emit the global header.
    ///
    /// Frame timestamps are seconds relative to `base`.
    pub fn new(mut writer: W, base: DateTime<Utc>, precision: TimestampPrecision) -> Result<Self> {
        let magic = match precision {
            TimestampPrecision::Micro => MAGIC_MICROS,
            TimestampPrecision::Nano => MAGIC_NANOS,
        };

        writer.write_u32::<LittleEndian>(magic)?;
        writer.write_u16::<LittleEndian>(VERSION_MAJOR)?;
        writer.write_u16::<LittleEndian>(VERSION_MINOR)?;
        writer.write_i32::<LittleEndian>(0)?; // thiszone
        writer.write_u32::<LittleEndian>(0)?; // sigfigs
        writer.write_u32::<LittleEndian>(SNAPLEN)?;
        writer.write_u32::<LittleEndian>(LINKTYPE_ETHERNET)?;

        Ok(Self {
            writer,
            base,
            precision,
            frames_written: 0,
        })
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Flush and return the underlying writer
    pub fn into_inner(mut self) -> Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }

    /// Split a capture time into PCAP seconds and sub-second fraction
    fn record_time(&self, timestamp: Timestamp) -> Result<(u32, u32)> {
        let nanos = (timestamp * 1e9).round();
        if !nanos.is_finite() || nanos.abs() >= i64::MAX as f64 {
            return Err(DecoderError::TimestampOutOfRange(timestamp));
        }

        let instant = self
            .base
            .checked_add_signed(TimeDelta::nanoseconds(nanos as i64))
            .ok_or(DecoderError::TimestampOutOfRange(timestamp))?;
        let seconds = u32::try_from(instant.timestamp())
            .map_err(|_| DecoderError::TimestampOutOfRange(timestamp))?;
        let fraction = match self.precision {
            TimestampPrecision::Micro => instant.timestamp_subsec_micros(),
            TimestampPrecision::Nano => instant.timestamp_subsec_nanos(),
        };

        Ok((seconds, fraction))
    }
}

impl<W: Write> CaptureSink for PcapWriter<W> {
    fn append(&mut self, _direction: Direction, frame: &CompletedFrame) -> Result<()> {
        let (seconds, fraction) = self.record_time(frame.timestamp)?;
        let length = frame.data.len() as u32;

        self.writer.write_u32::<LittleEndian>(seconds)?;
        self.writer.write_u32::<LittleEndian>(fraction)?;
        self.writer.write_u32::<LittleEndian>(length)?; // incl_len
        self.writer.write_u32::<LittleEndian>(length)?; // orig_len
        self.writer.write_all(&frame.data)?;

        self.frames_written += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
