//! Decoder configuration types
//!
//! This module defines the small amount of configuration the decoder needs:
//! which analyzer export layout to read, whether to insist on the frame
//! footer, and how capture times map onto PCAP timestamps.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::types::Timestamp;

/// Configuration for the decoder library
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// Capture file layout (auto-detected from the CSV header by default)
    #[serde(default)]
    pub format: CaptureFormat,

    /// Require the `0x5555` footer after each frame and drop frames without it
    #[serde(default)]
    pub verify_footer: bool,

    /// Wall-clock instant that capture time zero corresponds to.
    ///
    /// Unset means the Unix epoch, shifted by whole seconds for captures
    /// that start before time zero.
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,

    /// Resolution of the timestamps written to the PCAP file
    #[serde(default)]
    pub precision: TimestampPrecision,
}

/// Logic analyzer CSV export layouts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureFormat {
    /// Detect the layout from the header row
    #[default]
    Auto,
    /// Saleae Logic 1.x: `Time [s],Packet ID,MOSI,MISO`
    Logic1,
    /// Saleae Logic 2.x: `name,type,start_time,duration,mosi,miso`
    Logic2,
}

impl FromStr for CaptureFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(CaptureFormat::Auto),
            "logic1" => Ok(CaptureFormat::Logic1),
            "logic2" => Ok(CaptureFormat::Logic2),
            other => Err(format!(
                "unknown capture format '{}' (expected auto, logic1 or logic2)",
                other
            )),
        }
    }
}

/// PCAP timestamp resolution
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimestampPrecision {
    #[default]
    Micro,
    Nano,
}

impl FromStr for TimestampPrecision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "micro" | "us" => Ok(TimestampPrecision::Micro),
            "nano" | "ns" => Ok(TimestampPrecision::Nano),
            other => Err(format!(
                "unknown timestamp precision '{}' (expected micro or nano)",
                other
            )),
        }
    }
}

impl DecoderConfig {
    /// Create a new decoder configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Instant that capture time zero maps to in the PCAP output.
    ///
    /// Without a configured start time this is the Unix epoch, moved forward
    /// by enough whole seconds that `first_timestamp` is not before 1970.
    pub fn timestamp_base(&self, first_timestamp: Option<Timestamp>) -> DateTime<Utc> {
        if let Some(start_time) = self.start_time {
            return start_time;
        }

        let shift = match first_timestamp {
            Some(t) if t < 0.0 && t.is_finite() => (-t).ceil().min(u32::MAX as f64) as i64,
            _ => 0,
        };
        DateTime::<Utc>::default() + TimeDelta::seconds(shift)
    }

    /// Builder method: force a capture layout instead of auto-detecting it
    pub fn with_format(mut self, format: CaptureFormat) -> Self {
        self.format = format;
        self
    }

    /// Builder method: enable or disable footer verification
    pub fn with_footer_verification(mut self, enabled: bool) -> Self {
        self.verify_footer = enabled;
        self
    }

    /// Builder method: set the wall-clock time of capture time zero
    pub fn with_start_time(mut self, start_time: DateTime<Utc>) -> Self {
        self.start_time = Some(start_time);
        self
    }

    /// Builder method: set the PCAP timestamp resolution
    pub fn with_precision(mut self, precision: TimestampPrecision) -> Self {
        self.precision = precision;
        self
    }
}
