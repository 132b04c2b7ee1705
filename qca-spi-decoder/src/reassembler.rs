//! QCA7000 SPI frame reassembly
//!
//! Every Ethernet frame crossing the SPI bus is wrapped as:
//!
//! ```text
//! 0xAAAA 0xAAAA | length (LE) | 0x0000 | payload chunks ... | 0x5555
//! ```
//!
//! A [`FrameReassembler`] follows one direction of the bus, one 2-byte chunk
//! at a time, and hands back each frame once its announced length has been
//! collected. Header and padding problems are reported and the reassembler
//! falls back to waiting for the next sync sequence; a corrupted chunk in the
//! middle of a payload cannot be detected.

use serde::Serialize;

use crate::types::{BusChunk, CompletedFrame, Direction, FramingError, Timestamp};

/// Position of a reassembler in the framing sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReassemblyState {
    /// Waiting for the first sync chunk
    #[default]
    Idle,
    /// One sync chunk seen, expecting the second
    SyncSeen,
    /// Header complete, next chunk is the length
    LengthKnown,
    /// Length recorded, expecting zero padding
    LengthPadded,
    /// Collecting payload chunks
    Accumulating,
}

/// Payload collected for the frame in progress
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameBuffer {
    pub expected_length: u16,
    pub bytes: Vec<u8>,
    pub start_timestamp: Option<Timestamp>,
}

impl FrameBuffer {
    fn is_full(&self) -> bool {
        self.bytes.len() >= self.expected_length as usize
    }

    fn clear(&mut self) {
        self.expected_length = 0;
        self.bytes.clear();
        self.start_timestamp = None;
    }
}

/// Outcome of feeding one chunk through [`transition`]
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    /// State to continue from
    pub next: ReassemblyState,
    /// Frame finished by this chunk
    pub frame: Option<CompletedFrame>,
    /// Framing problem detected by this chunk
    pub diagnostic: Option<FramingError>,
    /// Bytes cut off the end of the emitted frame
    pub trimmed: usize,
}

impl Step {
    fn to(next: ReassemblyState) -> Self {
        Self {
            next,
            frame: None,
            diagnostic: None,
            trimmed: 0,
        }
    }

    fn reject(diagnostic: FramingError) -> Self {
        Self {
            diagnostic: Some(diagnostic),
            ..Self::to(ReassemblyState::Idle)
        }
    }
}

/// Advance the framing state machine by one chunk.
///
/// Every `(state, chunk)` pair has a defined outcome and every rejection
/// leads back to [`ReassemblyState::Idle`] with an empty buffer.
///
/// Emission is checked before the chunk is appended: a frame is finished by
/// the first chunk that arrives after the buffer holds `expected_length`
/// bytes, and that chunk is not part of the frame. Buffers that overshoot an
/// odd length are trimmed to `expected_length`.
pub fn transition(
    state: ReassemblyState,
    buffer: &mut FrameBuffer,
    timestamp: Timestamp,
    chunk: BusChunk,
    verify_footer: bool,
) -> Step {
    match state {
        ReassemblyState::Idle => {
            if chunk == BusChunk::SYNC {
                buffer.clear();
                Step::to(ReassemblyState::SyncSeen)
            } else {
                Step::to(ReassemblyState::Idle)
            }
        }
        ReassemblyState::SyncSeen => {
            if chunk == BusChunk::SYNC {
                Step::to(ReassemblyState::LengthKnown)
            } else {
                buffer.clear();
                Step::reject(FramingError::BadSyncByte { chunk })
            }
        }
        ReassemblyState::LengthKnown => {
            buffer.expected_length = chunk.frame_length();
            Step::to(ReassemblyState::LengthPadded)
        }
        ReassemblyState::LengthPadded => {
            if chunk == BusChunk::PADDING {
                Step::to(ReassemblyState::Accumulating)
            } else {
                buffer.clear();
                Step::reject(FramingError::BadLengthPadding { chunk })
            }
        }
        ReassemblyState::Accumulating => match buffer.start_timestamp {
            None => {
                buffer.bytes.clear();
                buffer.bytes.extend_from_slice(chunk.as_slice());
                buffer.start_timestamp = Some(timestamp);
                Step::to(ReassemblyState::Accumulating)
            }
            Some(start) if buffer.is_full() => {
                if verify_footer && chunk != BusChunk::FOOTER {
                    buffer.clear();
                    return Step::reject(FramingError::BadFooter { chunk });
                }

                let expected = buffer.expected_length as usize;
                let trimmed = buffer.bytes.len() - expected;
                buffer.bytes.truncate(expected);
                let frame = CompletedFrame {
                    data: std::mem::take(&mut buffer.bytes),
                    timestamp: start,
                };
                buffer.clear();

                Step {
                    frame: Some(frame),
                    trimmed,
                    ..Step::to(ReassemblyState::Idle)
                }
            }
            Some(_) => {
                buffer.bytes.extend_from_slice(chunk.as_slice());
                Step::to(ReassemblyState::Accumulating)
            }
        },
    }
}

/// Per-direction counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DirectionStats {
    /// Frames successfully reassembled
    pub frames: u64,
    /// Sync sequences broken after the first `0xAAAA`
    pub bad_headers: u64,
    /// Length words not followed by zero padding
    pub bad_padding: u64,
    /// Frames dropped for a missing footer
    pub bad_footers: u64,
}

impl DirectionStats {
    pub fn framing_errors(&self) -> u64 {
        self.bad_headers + self.bad_padding + self.bad_footers
    }

    fn record(&mut self, error: &FramingError) {
        match error {
            FramingError::BadSyncByte { .. } => self.bad_headers += 1,
            FramingError::BadLengthPadding { .. } => self.bad_padding += 1,
            FramingError::BadFooter { .. } => self.bad_footers += 1,
        }
    }
}

/// Frame reassembler for one direction of the SPI bus
#[derive(Debug, Clone)]
pub struct FrameReassembler {
    direction: Direction,
    state: ReassemblyState,
    buffer: FrameBuffer,
    verify_footer: bool,
    stats: DirectionStats,
}

impl FrameReassembler {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            state: ReassemblyState::Idle,
            buffer: FrameBuffer::default(),
            verify_footer: false,
            stats: DirectionStats::default(),
        }
    }

    /// Builder method: require the `0x5555` footer after every frame
    pub fn with_footer_verification(mut self, enabled: bool) -> Self {
        self.verify_footer = enabled;
        self
    }

    /// Feed one chunk and return the full transition outcome.
    ///
    /// Framing diagnostics are logged and counted here.
    pub fn step(&mut self, timestamp: Timestamp, chunk: BusChunk) -> Step {
        let step = transition(
            self.state,
            &mut self.buffer,
            timestamp,
            chunk,
            self.verify_footer,
        );
        self.state = step.next;

        if let Some(error) = &step.diagnostic {
            log::warn!("{} {} at {:.9} s", self.direction.prefix(), error, timestamp);
            self.stats.record(error);
        }

        if let Some(frame) = &step.frame {
            self.stats.frames += 1;
            if step.trimmed > 0 {
                log::debug!(
                    "{} trimmed {} byte(s) to declared length {}",
                    self.direction.prefix(),
                    step.trimmed,
                    frame.len()
                );
            }
        }

        step
    }

    /// Feed one chunk; returns the frame it completes, if any
    pub fn feed(&mut self, timestamp: Timestamp, chunk: BusChunk) -> Option<CompletedFrame> {
        self.step(timestamp, chunk).frame
    }

    pub fn completed_count(&self) -> u64 {
        self.stats.frames
    }

    pub fn framing_error_count(&self) -> u64 {
        self.stats.framing_errors()
    }

    pub fn stats(&self) -> DirectionStats {
        self.stats
    }

    pub fn state(&self) -> ReassemblyState {
        self.state
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Wrap a payload the way the QCA7000 puts it on the bus, footer included
    fn encode(payload: &[u8]) -> Vec<BusChunk> {
        let mut chunks = vec![
            BusChunk::SYNC,
            BusChunk::SYNC,
            BusChunk::new((payload.len() as u16).to_le_bytes()),
            BusChunk::PADDING,
        ];
        for pair in payload.chunks(2) {
            let second = pair.get(1).copied().unwrap_or(0xEE);
            chunks.push(BusChunk::new([pair[0], second]));
        }
        chunks.push(BusChunk::FOOTER);
        chunks
    }

    fn feed_all(reassembler: &mut FrameReassembler, chunks: &[BusChunk]) -> Vec<CompletedFrame> {
        chunks
            .iter()
            .enumerate()
            .filter_map(|(i, chunk)| reassembler.feed(i as f64, *chunk))
            .collect()
    }

    #[test]
    fn test_concrete_scenario() {
        let chunks = [0xAAAA, 0xAAAA, 0x0600, 0x0000, 0x1122, 0x3344, 0x5566, 0x5555]
            .map(BusChunk::from_word);
        let mut rx = FrameReassembler::new(Direction::Received);

        let mut frames = Vec::new();
        for (i, chunk) in chunks.iter().enumerate() {
            let t = 10.0 + i as f64 * 0.25;
            if let Some(frame) = rx.feed(t, *chunk) {
                frames.push(frame);
            }
        }

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, vec![0x11, 0x22, 0x33, 0x44, 0x55, 0x66]);
        assert_eq!(frames[0].timestamp, 11.0);
        assert_eq!(rx.completed_count(), 1);
        assert_eq!(rx.state(), ReassemblyState::Idle);
    }

    #[test]
    fn test_frame_waits_for_next_chunk() {
        let chunks = [0xAAAA, 0xAAAA, 0x0600, 0x0000, 0x1122, 0x3344, 0x5566]
            .map(BusChunk::from_word);
        let mut rx = FrameReassembler::new(Direction::Received);

        assert!(feed_all(&mut rx, &chunks).is_empty());
        assert_eq!(rx.state(), ReassemblyState::Accumulating);
        assert_eq!(rx.completed_count(), 0);
    }

    #[test]
    fn test_multiple_frames_various_lengths() {
        let payloads: Vec<Vec<u8>> = [1usize, 2, 14, 60, 61, 1514]
            .iter()
            .map(|&len| (0..len).map(|i| (i * 7 % 251) as u8).collect())
            .collect();

        let mut chunks = vec![BusChunk::from_word(0x0000), BusChunk::from_word(0x1234)];
        for payload in &payloads {
            chunks.extend(encode(payload));
            chunks.push(BusChunk::from_word(0x0000));
        }

        let mut tx = FrameReassembler::new(Direction::Transmitted);
        let frames = feed_all(&mut tx, &chunks);

        assert_eq!(tx.completed_count(), payloads.len() as u64);
        assert_eq!(tx.framing_error_count(), 0);
        for (frame, payload) in frames.iter().zip(&payloads) {
            assert_eq!(&frame.data, payload);
        }
    }

    #[test]
    fn test_odd_length_is_truncated() {
        let mut rx = FrameReassembler::new(Direction::Received);
        let chunks = encode(&[0x01, 0x02, 0x03, 0x04, 0x05]);

        let mut trimmed = Vec::new();
        let mut frames = Vec::new();
        for (i, chunk) in chunks.iter().enumerate() {
            let step = rx.step(i as f64, *chunk);
            assert!(step.diagnostic.is_none());
            if let Some(frame) = step.frame {
                trimmed.push(step.trimmed);
                frames.push(frame);
            }
        }

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, vec![0x01, 0x02, 0x03, 0x04, 0x05]);
        assert_eq!(trimmed, vec![1]);
    }

    #[test]
    fn test_bad_header_resynchronizes() {
        let mut chunks = vec![BusChunk::SYNC, BusChunk::from_word(0x1234)];
        chunks.extend(encode(&[0xDE, 0xAD, 0xBE, 0xEF]));

        let mut rx = FrameReassembler::new(Direction::Received);
        let frames = feed_all(&mut rx, &chunks);

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, vec![0xDE, 0xAD, 0xBE, 0xEF]);
        assert_eq!(rx.stats().bad_headers, 1);
        assert_eq!(rx.completed_count(), 1);
    }

    #[test]
    fn test_bad_padding_discards_frame() {
        let mut chunks = encode(&[0x01, 0x02]);
        chunks[3] = BusChunk::from_word(0x0001);
        chunks.extend(encode(&[0x03, 0x04]));

        let mut rx = FrameReassembler::new(Direction::Received);
        let frames = feed_all(&mut rx, &chunks);

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, vec![0x03, 0x04]);
        assert_eq!(rx.stats().bad_padding, 1);
    }

    #[test]
    fn test_transitions_are_total() {
        let states = [
            ReassemblyState::Idle,
            ReassemblyState::SyncSeen,
            ReassemblyState::LengthKnown,
            ReassemblyState::LengthPadded,
            ReassemblyState::Accumulating,
        ];
        let inputs = [0x0000, 0xAAAA, 0x5555, 0x0100, 0xFFFF].map(BusChunk::from_word);

        for state in states {
            for chunk in inputs {
                let mut buffer = FrameBuffer::default();
                let step = transition(state, &mut buffer, 0.0, chunk, true);
                if step.diagnostic.is_some() {
                    assert_eq!(step.next, ReassemblyState::Idle);
                    assert_eq!(buffer, FrameBuffer::default());
                }
            }
        }
    }

    #[test]
    fn test_zero_length_frame() {
        let mut rx = FrameReassembler::new(Direction::Received);
        let chunks = [0xAAAA, 0xAAAA, 0x0000, 0x0000, 0x1122, 0x5555].map(BusChunk::from_word);

        let frames = feed_all(&mut rx, &chunks);

        assert_eq!(frames.len(), 1);
        assert!(frames[0].is_empty());
        assert_eq!(frames[0].timestamp, 4.0);
    }

    #[test]
    fn test_footer_verification() {
        let mut good = encode(&[0x01, 0x02, 0x03, 0x04]);
        let mut bad = encode(&[0x05, 0x06]);
        let last = bad.len() - 1;
        bad[last] = BusChunk::from_word(0x1111);
        good.append(&mut bad);

        let mut strict = FrameReassembler::new(Direction::Received).with_footer_verification(true);
        let frames = feed_all(&mut strict, &good);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, vec![0x01, 0x02, 0x03, 0x04]);
        assert_eq!(strict.stats().bad_footers, 1);

        let mut lenient = FrameReassembler::new(Direction::Received);
        assert_eq!(feed_all(&mut lenient, &good).len(), 2);
        assert_eq!(lenient.framing_error_count(), 0);
    }

    #[test]
    fn test_reassemblers_are_independent() {
        let mut rx = FrameReassembler::new(Direction::Received);
        let mut tx = FrameReassembler::new(Direction::Transmitted);

        let rx_chunks = encode(&[0xAA; 8]);
        let mut tx_chunks = vec![BusChunk::SYNC, BusChunk::PADDING];
        tx_chunks.extend(encode(&[0x42; 3]));
        tx_chunks.extend(encode(&[0x43; 4]));

        let len = rx_chunks.len().max(tx_chunks.len());
        let mut rx_frames = Vec::new();
        let mut tx_frames = Vec::new();
        for i in 0..len {
            let t = i as f64;
            if let Some(chunk) = rx_chunks.get(i) {
                rx_frames.extend(rx.feed(t, *chunk));
            }
            if let Some(chunk) = tx_chunks.get(i) {
                tx_frames.extend(tx.feed(t, *chunk));
            }
        }

        assert_eq!(rx_frames.len(), 1);
        assert_eq!(rx_frames[0].data, vec![0xAA; 8]);
        assert_eq!(rx.framing_error_count(), 0);

        assert_eq!(tx_frames.len(), 2);
        assert_eq!(tx_frames[0].data, vec![0x42; 3]);
        assert_eq!(tx_frames[1].data, vec![0x43; 4]);
        assert_eq!(tx.stats().bad_headers, 1);
    }
}
