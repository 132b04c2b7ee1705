//! Saleae Logic 2.x SPI analyzer export reader
//!
//! Logic 2 exports analyzer frames with named columns:
//!
//! ```text
//! name,type,start_time,duration,"mosi","miso"
//! "SPI","enable",0.0244,0
//! "SPI","result",0.0245,1.6e-06,0xCD00,0x5B5B
//! "SPI","disable",0.0246,0
//! ```
//!
//! Only `result` rows carry data. Columns are located by header name.

use super::{csv_reader, field, line_of, parse_chunk, parse_time, CaptureSource};
use crate::types::{CaptureRecord, DecoderError, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;

const DATA_ROW_TYPE: &str = "result";

fn column(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.eq_ignore_ascii_case(name))
}

/// Check whether a header row looks like a Logic 2.x export
pub(crate) fn matches(headers: &csv::StringRecord) -> bool {
    ["start_time", "mosi", "miso"]
        .iter()
        .all(|name| column(headers, name).is_some())
}

/// Iterator over the data rows of a Logic 2.x export
pub struct Logic2Reader<R: Read> {
    records: csv::StringRecordsIntoIter<R>,
    time_column: usize,
    type_column: Option<usize>,
    mosi_column: usize,
    miso_column: usize,
}

impl<R: Read> Logic2Reader<R> {
    /// Read records from any CSV byte stream; the header row must name the columns
    pub fn from_reader(input: R) -> Result<Self> {
        let mut reader = csv_reader(input);
        let headers = reader.headers()?.clone();

        let required = |name: &str| {
            column(&headers, name).ok_or_else(|| {
                DecoderError::UnsupportedFormat(format!("Logic 2.x export without '{}' column", name))
            })
        };
        let time_column = required("start_time")?;
        let mosi_column = required("mosi")?;
        let miso_column = required("miso")?;
        let type_column = column(&headers, "type");

        Ok(Self {
            records: reader.into_records(),
            time_column,
            type_column,
            mosi_column,
            miso_column,
        })
    }

    fn is_data_row(&self, record: &csv::StringRecord) -> bool {
        match self.type_column {
            Some(index) => record
                .get(index)
                .map_or(false, |t| t.eq_ignore_ascii_case(DATA_ROW_TYPE)),
            None => true,
        }
    }

    fn parse_record(&self, record: &csv::StringRecord) -> Result<CaptureRecord> {
        let line = line_of(record);
        let timestamp = parse_time(field(record, self.time_column, "start_time")?, line)?;
        let mosi = parse_chunk(field(record, self.mosi_column, "mosi")?, line)?;
        let miso = parse_chunk(field(record, self.miso_column, "miso")?, line)?;

        Ok(CaptureRecord::new(timestamp, mosi, miso))
    }
}

impl CaptureSource for Logic2Reader<File> {
    fn open(path: &Path) -> Result<Self> {
        log::info!("Opening Logic 2.x capture: {:?}", path);
        Self::from_reader(File::open(path)?)
    }
}

impl<R: Read> Iterator for Logic2Reader<R> {
    type Item = Result<CaptureRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let record = match self.records.next()? {
                Ok(record) => record,
                Err(e) => return Some(Err(e.into())),
            };

            if !self.is_data_row(&record) {
                continue;
            }

            return Some(self.parse_record(&record));
        }
    }
}
