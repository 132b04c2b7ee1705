//! Capture file readers (Saleae Logic CSV exports)
//!
//! Each reader turns an analyzer export into an iterator of
//! [`CaptureRecord`]s. The layout is detected from the CSV header row unless
//! the caller forces one.

use crate::config::CaptureFormat;
use crate::types::{BusChunk, CaptureRecord, DecoderError, Result, Timestamp};
use std::fs::File;
use std::io::Read;
use std::path::Path;

pub mod logic1;
pub mod logic2;

pub use logic1::Logic1Reader;
pub use logic2::Logic2Reader;

/// Common trait for all capture readers
pub trait CaptureSource: Iterator<Item = Result<CaptureRecord>> + Sized {
    /// Open a capture file and return an iterator over its records
    fn open(path: &Path) -> Result<Self>;
}

/// Boxed record stream returned by [`open_capture`]
pub type RecordStream = Box<dyn Iterator<Item = Result<CaptureRecord>>>;

/// Open `path` with the requested layout, detecting it first for [`CaptureFormat::Auto`]
pub fn open_capture(path: &Path, format: CaptureFormat) -> Result<RecordStream> {
    let format = match format {
        CaptureFormat::Auto => detect_format(path)?,
        forced => forced,
    };

    match format {
        CaptureFormat::Logic1 => {
            log::debug!("Reading Saleae Logic 1.x export");
            Ok(Box::new(Logic1Reader::<File>::open(path)?))
        }
        CaptureFormat::Logic2 => {
            log::debug!("Reading Saleae Logic 2.x export");
            Ok(Box::new(Logic2Reader::<File>::open(path)?))
        }
        CaptureFormat::Auto => Err(DecoderError::UnsupportedFormat(format!(
            "could not detect layout of {:?}",
            path
        ))),
    }
}

/// Detect the export layout of a capture file from its header row
pub fn detect_format(path: &Path) -> Result<CaptureFormat> {
    let mut reader = csv_reader(File::open(path)?);
    let headers = reader.headers()?;

    if logic1::matches(headers) {
        Ok(CaptureFormat::Logic1)
    } else if logic2::matches(headers) {
        Ok(CaptureFormat::Logic2)
    } else {
        Err(DecoderError::UnsupportedFormat(format!(
            "unrecognized CSV header: {:?}",
            headers.iter().collect::<Vec<_>>()
        )))
    }
}

/// CSV reader settings shared by all layouts
pub(crate) fn csv_reader<R: Read>(input: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input)
}

/// Line number of a record, for error messages
pub(crate) fn line_of(record: &csv::StringRecord) -> u64 {
    record.position().map(|p| p.line()).unwrap_or(0)
}

/// Fetch a column or fail with the record's line number
pub(crate) fn field<'r>(record: &'r csv::StringRecord, index: usize, name: &str) -> Result<&'r str> {
    record.get(index).ok_or_else(|| DecoderError::InvalidRecord {
        line: line_of(record),
        reason: format!("missing {} column", name),
    })
}

/// Parse a time cell in seconds
pub(crate) fn parse_time(cell: &str, line: u64) -> Result<Timestamp> {
    cell.parse::<f64>()
        .ok()
        .filter(|t| t.is_finite())
        .ok_or_else(|| DecoderError::InvalidRecord {
            line,
            reason: format!("invalid time '{}'", cell),
        })
}

/// Parse an analyzer data cell such as `0xCD00` into a bus chunk
pub(crate) fn parse_chunk(cell: &str, line: u64) -> Result<BusChunk> {
    let digits = cell
        .strip_prefix("0x")
        .or_else(|| cell.strip_prefix("0X"))
        .unwrap_or(cell);

    let bytes = hex::decode(digits).map_err(|e| DecoderError::InvalidRecord {
        line,
        reason: format!("invalid data '{}': {}", cell, e),
    })?;

    let pair: [u8; 2] = bytes
        .try_into()
        .map_err(|_| DecoderError::InvalidRecord {
            line,
            reason: format!("data '{}' is not a {}-byte word", cell, BusChunk::SIZE),
        })?;

    Ok(BusChunk::new(pair))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_capture(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_parse_chunk() {
        assert_eq!(parse_chunk("0xCD00", 1).unwrap(), BusChunk::from_word(0xCD00));
        assert_eq!(parse_chunk("aaAA", 1).unwrap(), BusChunk::SYNC);
        assert!(parse_chunk("0xCD", 1).is_err());
        assert!(parse_chunk("0xCD0011", 1).is_err());
        assert!(parse_chunk("0xZZ00", 1).is_err());
        assert!(parse_chunk("", 1).is_err());
    }

    #[test]
    fn test_parse_time() {
        assert_eq!(parse_time("0.024508375000000", 2).unwrap(), 0.024508375);
        assert_eq!(parse_time("-1.5", 2).unwrap(), -1.5);
        assert!(matches!(
            parse_time("abc", 7),
            Err(DecoderError::InvalidRecord { line: 7, .. })
        ));
    }

    #[test]
    fn test_detect_formats() {
        let v1 = write_capture("Time [s],Packet ID,MOSI,MISO\n0.1,0,0xAAAA,0x0000\n");
        assert_eq!(detect_format(v1.path()).unwrap(), CaptureFormat::Logic1);

        let v2 = write_capture(
            "name,type,start_time,duration,\"mosi\",\"miso\"\n\"SPI\",\"result\",0.1,1e-06,0xAAAA,0x0000\n",
        );
        assert_eq!(detect_format(v2.path()).unwrap(), CaptureFormat::Logic2);

        let other = write_capture("a,b,c\n1,2,3\n");
        assert!(matches!(
            detect_format(other.path()),
            Err(DecoderError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_open_capture_auto() {
        let v1 = write_capture("Time [s],Packet ID,MOSI,MISO\n0.1,0,0x1122,0x3344\n0.2,1,0x5566,0x7788\n");
        let records: Vec<_> = open_capture(v1.path(), CaptureFormat::Auto)
            .unwrap()
            .collect::<Result<Vec<_>>>()
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[1].host_to_device, BusChunk::from_word(0x5566));
        assert_eq!(records[1].device_to_host, BusChunk::from_word(0x7788));
    }

    #[test]
    fn test_open_missing_file() {
        let result = open_capture(Path::new("nonexistent.csv"), CaptureFormat::Auto);
        assert!(matches!(result, Err(DecoderError::IoError(_))));
    }
}
