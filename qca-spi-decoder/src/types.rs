//! Core types for the QCA7000 SPI decoder library
//!
//! This module defines the values that flow through the decoder: bus chunks
//! sampled off the SPI lines, capture records pairing both lines at one
//! instant, and the Ethernet frames reassembled from them.

use byteorder::{ByteOrder, LittleEndian};
use std::fmt;

/// Capture time in seconds, as exported by the logic analyzer
pub type Timestamp = f64;

/// Result type for decoder operations
pub type Result<T> = std::result::Result<T, DecoderError>;

/// One 2-byte sample of a single SPI data line
///
/// Bytes are kept in transmission order, so `0xAAAA` on the wire is
/// `[0xAA, 0xAA]` here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BusChunk([u8; 2]);

impl BusChunk {
    /// Size of every chunk in bytes
    pub const SIZE: usize = 2;

    /// Start-of-frame marker, sent twice before the length
    pub const SYNC: BusChunk = BusChunk([0xAA, 0xAA]);

    /// Zero padding that follows the length word
    pub const PADDING: BusChunk = BusChunk([0x00, 0x00]);

    /// End-of-frame marker
    pub const FOOTER: BusChunk = BusChunk([0x55, 0x55]);

    pub const fn new(bytes: [u8; 2]) -> Self {
        Self(bytes)
    }

    /// Build a chunk from the 16-bit word shown by the analyzer (`0xCD00` -> `[0xCD, 0x00]`)
    pub const fn from_word(word: u16) -> Self {
        Self(word.to_be_bytes())
    }

    pub fn bytes(&self) -> [u8; 2] {
        self.0
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// The chunk as the analyzer displays it
    pub fn word(&self) -> u16 {
        u16::from_be_bytes(self.0)
    }

    /// Interpret the chunk as a frame length.
    ///
    /// The QCA7000 sends the length byte-swapped relative to the rest of the
    /// header, i.e. little-endian in transmission order.
    pub fn frame_length(&self) -> u16 {
        LittleEndian::read_u16(&self.0)
    }
}

impl fmt::Display for BusChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02X}{:02X}", self.0[0], self.0[1])
    }
}

/// Both SPI lines sampled at one instant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureRecord {
    /// Sample time in seconds
    pub timestamp: Timestamp,
    /// MOSI: data sent by the host
    pub host_to_device: BusChunk,
    /// MISO: data sent by the QCA7000
    pub device_to_host: BusChunk,
}

impl CaptureRecord {
    pub fn new(timestamp: Timestamp, host_to_device: BusChunk, device_to_host: BusChunk) -> Self {
        Self {
            timestamp,
            host_to_device,
            device_to_host,
        }
    }
}

/// Transport direction of a reassembled frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Device-to-host (MISO)
    Received,
    /// Host-to-device (MOSI)
    Transmitted,
}

impl Direction {
    /// Short prefix used in log lines
    pub fn prefix(&self) -> &'static str {
        match self {
            Direction::Received => "RX:",
            Direction::Transmitted => "TX:",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Direction::Received => "received",
            Direction::Transmitted => "transmitted",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Size of the Ethernet header (dst MAC + src MAC + EtherType)
const ETH_HEADER_SIZE: usize = 14;

/// A complete frame pulled off the bus
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedFrame {
    /// Frame bytes, exactly as many as the length header announced
    pub data: Vec<u8>,
    /// Time of the first payload chunk
    pub timestamp: Timestamp,
}

impl CompletedFrame {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// One-line description of the Ethernet header for log output.
    ///
    /// Nothing is validated here; short frames are simply reported as such.
    pub fn summary(&self) -> String {
        if self.data.len() < ETH_HEADER_SIZE {
            return format!("{} bytes (short frame)", self.data.len());
        }

        let ethertype = u16::from_be_bytes([self.data[12], self.data[13]]);
        format!(
            "{} > {} type 0x{:04X} ({} bytes)",
            format_mac(&self.data[6..12]),
            format_mac(&self.data[0..6]),
            ethertype,
            self.data.len()
        )
    }
}

fn format_mac(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(":")
}

/// Framing problems detected at frame boundaries
///
/// None of these are fatal: the reassembler reports them and goes back to
/// waiting for the next sync sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FramingError {
    #[error("Bad packet header: {chunk}")]
    BadSyncByte { chunk: BusChunk },

    #[error("Bad packet length padding: {chunk}")]
    BadLengthPadding { chunk: BusChunk },

    #[error("Bad packet footer: {chunk}")]
    BadFooter { chunk: BusChunk },
}

/// Errors that can occur while reading captures or writing frames
#[derive(Debug, thiserror::Error)]
pub enum DecoderError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Unsupported capture format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid record at line {line}: {reason}")]
    InvalidRecord { line: u64, reason: String },

    #[error("Timestamp {0} s cannot be stored in a PCAP record")]
    TimestampOutOfRange(Timestamp),
}
