//! Saleae Logic 1.x SPI export reader
//!
//! Logic 1.2.x writes one row per SPI transfer word:
//!
//! ```text
//! Time [s],Packet ID,MOSI,MISO
//! 0.024508375000000,0,0xCD00,0x5B5B
//! ```
//!
//! Columns are positional; the `Packet ID` column is ignored.

use super::{csv_reader, field, line_of, parse_chunk, parse_time, CaptureSource};
use crate::types::{CaptureRecord, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;

const TIME_COLUMN: usize = 0;
const MOSI_COLUMN: usize = 2;
const MISO_COLUMN: usize = 3;

/// Check whether a header row looks like a Logic 1.x export
pub(crate) fn matches(headers: &csv::StringRecord) -> bool {
    headers.get(TIME_COLUMN) == Some("Time [s]")
        && headers
            .get(MOSI_COLUMN)
            .map_or(false, |h| h.eq_ignore_ascii_case("mosi"))
        && headers
            .get(MISO_COLUMN)
            .map_or(false, |h| h.eq_ignore_ascii_case("miso"))
}

/// Iterator over the records of a Logic 1.x export
pub struct Logic1Reader<R: Read> {
    records: csv::StringRecordsIntoIter<R>,
}

impl<R: Read> Logic1Reader<R> {
    /// Read records from any CSV byte stream (header row included)
    pub fn from_reader(input: R) -> Self {
        Self {
            records: csv_reader(input).into_records(),
        }
    }

    fn parse_record(record: &csv::StringRecord) -> Result<CaptureRecord> {
        let line = line_of(record);
        let timestamp = parse_time(field(record, TIME_COLUMN, "time")?, line)?;
        let mosi = parse_chunk(field(record, MOSI_COLUMN, "MOSI")?, line)?;
        let miso = parse_chunk(field(record, MISO_COLUMN, "MISO")?, line)?;

        Ok(CaptureRecord::new(timestamp, mosi, miso))
    }
}

impl CaptureSource for Logic1Reader<File> {
    fn open(path: &Path) -> Result<Self> {
        log::info!("Opening Logic 1.x capture: {:?}", path);
        Ok(Self::from_reader(File::open(path)?))
    }
}

impl<R: Read> Iterator for Logic1Reader<R> {
    type Item = Result<CaptureRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = match self.records.next()? {
            Ok(record) => record,
            Err(e) => return Some(Err(e.into())),
        };

        let parsed = Self::parse_record(&record);
        if let Ok(capture) = &parsed {
            log::trace!(
                "{:.9} MOSI {} MISO {}",
                capture.timestamp,
                capture.host_to_device,
                capture.device_to_host
            );
        }
        Some(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BusChunk, DecoderError};

    const SAMPLE: &str = "\
Time [s],Packet ID,MOSI,MISO
0.024508375000000,0,0xCD00,0x5B5B
0.024512000000000,0,0xAAAA,0x0000
0.024516000000000,,0xAAAA,0x0000
";

    #[test]
    fn test_reads_records() {
        let records: Vec<_> = Logic1Reader::from_reader(SAMPLE.as_bytes())
            .collect::<Result<Vec<_>>>()
            .unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].timestamp, 0.024508375);
        assert_eq!(records[0].host_to_device, BusChunk::from_word(0xCD00));
        assert_eq!(records[0].device_to_host, BusChunk::from_word(0x5B5B));
        assert_eq!(records[2].host_to_device, BusChunk::SYNC);
    }

    #[test]
    fn test_bad_cell_reports_line() {
        let input = "Time [s],Packet ID,MOSI,MISO\n0.1,0,0xAAAA,0x00\n";
        let mut reader = Logic1Reader::from_reader(input.as_bytes());

        match reader.next() {
            Some(Err(DecoderError::InvalidRecord { line, .. })) => assert_eq!(line, 2),
            other => panic!("expected invalid record, got {:?}", other),
        }
    }

    #[test]
    fn test_short_row() {
        let input = "Time [s],Packet ID,MOSI,MISO\n0.1,0,0xAAAA\n";
        let mut reader = Logic1Reader::from_reader(input.as_bytes());
        assert!(matches!(reader.next(), Some(Err(DecoderError::InvalidRecord { .. }))));
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_header_match() {
        let headers = csv::StringRecord::from(vec!["Time [s]", "Packet ID", "MOSI", "MISO"]);
        assert!(matches(&headers));

        let headers = csv::StringRecord::from(vec!["name", "type", "start_time", "duration"]);
        assert!(!matches(&headers));
    }
}
