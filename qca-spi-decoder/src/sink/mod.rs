//! Capture sinks for reassembled frames
//!
//! The coordinator hands every completed frame to a [`CaptureSink`] in the
//! order the frames finish. Sinks own the container format.

use crate::types::{CompletedFrame, Direction, Result};

pub mod pcap;

pub use pcap::PcapWriter;

/// Destination for completed frames
pub trait CaptureSink {
    /// Append one frame; `direction` is informational and not stored by every sink
    fn append(&mut self, direction: Direction, frame: &CompletedFrame) -> Result<()>;

    /// Push buffered output to its destination
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<S: CaptureSink + ?Sized> CaptureSink for &mut S {
    fn append(&mut self, direction: Direction, frame: &CompletedFrame) -> Result<()> {
        (**self).append(direction, frame)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}

/// Sink that keeps every frame in memory, in arrival order
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    frames: Vec<(Direction, CompletedFrame)>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> &[(Direction, CompletedFrame)] {
        &self.frames
    }

    /// Frames for one direction only
    pub fn frames_for(&self, direction: Direction) -> impl Iterator<Item = &CompletedFrame> {
        self.frames
            .iter()
            .filter(move |(d, _)| *d == direction)
            .map(|(_, frame)| frame)
    }

    pub fn into_frames(self) -> Vec<(Direction, CompletedFrame)> {
        self.frames
    }
}

impl CaptureSink for MemorySink {
    fn append(&mut self, direction: Direction, frame: &CompletedFrame) -> Result<()> {
        self.frames.push((direction, frame.clone()));
        Ok(())
    }
}
