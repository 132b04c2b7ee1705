//! QCA7000 SPI Decoder Library
//!
//! Reconstructs the Ethernet frames exchanged with a Qualcomm Atheros
//! QCA7000 HomePlug Green PHY from a logic analyzer capture of its SPI bus,
//! and writes them to a PCAP file for Wireshark.
//!
//! # Architecture
//!
//! - `formats` reads Saleae Logic CSV exports into capture records
//! - `reassembler` runs the framing state machine for one bus line
//! - `coordinator` drives one reassembler per direction from the records
//! - `sink` persists completed frames (PCAP, or memory)
//!
//! The library does NOT:
//! - Validate Ethernet addresses, EtherTypes or checksums
//! - Decode anything above the Ethernet layer
//! - Parse command-line arguments (see qca-spi-cli)
//!
//! # Example Usage
//!
//! ```no_run
//! use qca_spi_decoder::{CaptureFormat, Decoder, DecoderConfig};
//! use std::path::Path;
//!
//! let config = DecoderConfig::new()
//!     .with_format(CaptureFormat::Auto)
//!     .with_footer_verification(false);
//!
//! let decoder = Decoder::new(config);
//! let summary = decoder
//!     .decode_file(Path::new("spi.csv"), Path::new("spi.pcap"))
//!     .unwrap();
//!
//! println!(
//!     "TX packets: {}  RX packets: {}",
//!     summary.transmitted.frames, summary.received.frames
//! );
//! ```

// Public modules
pub mod config;
pub mod coordinator;
pub mod decoder;
pub mod formats;
pub mod reassembler;
pub mod sink;
pub mod types;

// Re-export main types for convenience
pub use config::{CaptureFormat, DecoderConfig, TimestampPrecision};
pub use coordinator::{DecodeSummary, DualDirectionCoordinator};
pub use decoder::Decoder;
pub use formats::{open_capture, CaptureSource};
pub use reassembler::{DirectionStats, FrameReassembler, ReassemblyState};
pub use sink::{CaptureSink, MemorySink, PcapWriter};
pub use types::{
    BusChunk, CaptureRecord, CompletedFrame, DecoderError, Direction, FramingError, Result,
    Timestamp,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
