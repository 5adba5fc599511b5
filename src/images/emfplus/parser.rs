// EMF+ record stream parser
//
// Splits an EMF+ byte stream into framed records and decodes each one in
// order, keeping the object table up to date as it goes.

use tracing::trace;
use zerocopy::{FromBytes, LE, U16, U32};

use super::object_table::ObjectTable;
use super::options::{DecodeOptions, check_ceiling};
use super::record::{EmfPlusRecord, decode_body};
use super::records::types::EmfPlusRecordType;
use crate::common::binary::ByteCursor;
use crate::common::error::{Error, Result};

/// Size of the fixed record header.
pub const RECORD_HEADER_SIZE: usize = 12;

/// Raw EMF+ record header for zerocopy parsing (12 bytes)
#[derive(Debug, Clone, Copy, FromBytes)]
#[repr(C)]
struct RawRecordHeader {
    /// Record type
    record_type: U16<LE>,
    /// Record-specific flags
    flags: U16<LE>,
    /// Total record size including header and padding
    size: U32<LE>,
    /// Payload size
    data_size: U32<LE>,
}

/// One framed record whose payload has not been interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawRecord<'a> {
    /// Absolute offset of the record header
    pub offset: usize,
    pub record_type: u16,
    pub flags: u16,
    pub size: u32,
    pub data_size: u32,
    pub data: &'a [u8],
}

/// Iterator over framed records.
///
/// Stops after the first framing error.
#[derive(Debug, Clone)]
pub struct RecordReader<'a> {
    cursor: ByteCursor<'a>,
    options: DecodeOptions,
    failed: bool,
}

impl<'a> RecordReader<'a> {
    pub fn new(data: &'a [u8], options: DecodeOptions) -> Self {
        Self {
            cursor: ByteCursor::new(data),
            options,
            failed: false,
        }
    }

    /// Absolute offset of the next record.
    pub fn offset(&self) -> usize {
        self.cursor.offset()
    }

    fn read_record(&mut self) -> Result<RawRecord<'a>> {
        let offset = self.cursor.offset();
        if self.cursor.remaining() < RECORD_HEADER_SIZE {
            return Err(Error::malformed(
                offset,
                format!(
                    "truncated record header: {} of {} bytes",
                    self.cursor.remaining(),
                    RECORD_HEADER_SIZE
                ),
            ));
        }
        let header: RawRecordHeader = self.cursor.read_struct()?;
        let size = header.size.get();
        let data_size = header.data_size.get();

        check_ceiling(offset + 8, u64::from(data_size), self.options.max_record_size)?;
        if u64::from(size) < u64::from(data_size) + RECORD_HEADER_SIZE as u64 {
            return Err(Error::malformed(
                offset,
                format!("record size {} too small for payload of {}", size, data_size),
            ));
        }
        let body_len = size as usize - RECORD_HEADER_SIZE;
        if body_len > self.cursor.remaining() {
            return Err(Error::malformed(
                offset,
                format!(
                    "record size {} runs past end of stream ({} bytes left)",
                    size,
                    self.cursor.remaining() + RECORD_HEADER_SIZE
                ),
            ));
        }
        let data = self.cursor.take(data_size as usize)?;
        self.cursor.skip(body_len - data_size as usize)?;

        Ok(RawRecord {
            offset,
            record_type: header.record_type.get(),
            flags: header.flags.get(),
            size,
            data_size,
            data,
        })
    }
}

impl<'a> Iterator for RecordReader<'a> {
    type Item = Result<RawRecord<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.cursor.is_empty() {
            return None;
        }
        let result = self.read_record();
        self.failed = result.is_err();
        Some(result)
    }
}

/// Decodes an EMF+ stream record by record.
///
/// # Examples
///
/// ```
/// use emfplus::images::emfplus::{EmfPlusParser, RecordBody};
///
/// // A lone EndOfFile record
/// let data = [0x02, 0x40, 0x00, 0x00, 0x0C, 0, 0, 0, 0, 0, 0, 0];
/// let records: Vec<_> = EmfPlusParser::new(&data).collect::<Result<_, _>>().unwrap();
/// assert_eq!(records[0].body, RecordBody::EndOfFile);
/// ```
#[derive(Debug, Clone)]
pub struct EmfPlusParser<'a> {
    reader: RecordReader<'a>,
    table: ObjectTable,
    options: DecodeOptions,
    finished: bool,
}

impl<'a> EmfPlusParser<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_options(data, DecodeOptions::default())
    }

    pub fn with_options(data: &'a [u8], options: DecodeOptions) -> Self {
        Self {
            reader: RecordReader::new(data, options),
            table: ObjectTable::new(),
            options,
            finished: false,
        }
    }

    /// Objects defined so far. An EndOfFile record empties the table.
    pub fn objects(&self) -> &ObjectTable {
        &self.table
    }

    fn decode_record(&mut self, raw: RawRecord<'_>) -> Result<EmfPlusRecord> {
        let record_type = EmfPlusRecordType::from_u16(raw.record_type);
        trace!(
            offset = raw.offset,
            record_type = raw.record_type,
            flags = raw.flags,
            data_size = raw.data_size,
            "record"
        );

        let mut cursor = ByteCursor::with_base(raw.data, raw.offset + RECORD_HEADER_SIZE);
        let body = decode_body(record_type, raw.flags, &mut cursor, &mut self.table, &self.options)?;
        if !cursor.is_empty() {
            return Err(Error::malformed(
                cursor.offset(),
                format!(
                    "{} consumed {} of {} payload bytes",
                    record_type.map_or("record", |t| t.name()),
                    cursor.position(),
                    raw.data_size
                ),
            ));
        }

        Ok(EmfPlusRecord {
            offset: raw.offset,
            type_code: raw.record_type,
            record_type,
            flags: raw.flags,
            data_size: raw.data_size,
            body,
        })
    }
}

impl Iterator for EmfPlusParser<'_> {
    type Item = Result<EmfPlusRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let result = match self.reader.next() {
            Some(Ok(raw)) => self.decode_record(raw),
            Some(Err(err)) => Err(err),
            None => {
                self.finished = true;
                let offset = self.reader.offset();
                return self
                    .table
                    .ensure_no_open_continuation(offset, "end of stream")
                    .err()
                    .map(Err);
            },
        };
        if result.is_err() {
            self.finished = true;
        }
        Some(result)
    }
}

/// Decode a whole EMF+ stream, stopping at the first error.
pub fn decode(data: &[u8], options: DecodeOptions) -> Result<Vec<EmfPlusRecord>> {
    EmfPlusParser::with_options(data, options).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(record_type: u16, flags: u16, payload: &[u8], padding: usize) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&record_type.to_le_bytes());
        data.extend_from_slice(&flags.to_le_bytes());
        data.extend_from_slice(&((12 + payload.len() + padding) as u32).to_le_bytes());
        data.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        data.extend_from_slice(payload);
        data.extend(std::iter::repeat_n(0u8, padding));
        data
    }

    #[test]
    fn test_reader_skips_padding() {
        let mut data = record(0x4025, 0, &7u32.to_le_bytes(), 4);
        data.extend(record(0x4002, 0, &[], 0));
        let records: Vec<_> = RecordReader::new(&data, DecodeOptions::default())
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].data, &7u32.to_le_bytes());
        assert_eq!(records[1].offset, 20);
    }

    #[test]
    fn test_truncated_header() {
        let data = [0x02, 0x40, 0x00, 0x00, 0x0C];
        let mut reader = RecordReader::new(&data, DecodeOptions::default());
        assert!(matches!(
            reader.next(),
            Some(Err(Error::MalformedRecord { offset: 0, .. }))
        ));
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_size_smaller_than_payload() {
        let mut data = record(0x4025, 0, &7u32.to_le_bytes(), 0);
        data[4..8].copy_from_slice(&8u32.to_le_bytes());
        let mut reader = RecordReader::new(&data, DecodeOptions::default());
        assert!(matches!(reader.next(), Some(Err(Error::MalformedRecord { .. }))));
    }

    #[test]
    fn test_record_size_ceiling() {
        let mut data = record(0x4025, 0, &[], 0);
        data[8..12].copy_from_slice(&u32::MAX.to_le_bytes());
        let mut reader = RecordReader::new(&data, DecodeOptions::default());
        assert!(matches!(
            reader.next(),
            Some(Err(Error::OversizedAllocation { offset: 8, .. }))
        ));
    }

    #[test]
    fn test_undercount_is_malformed() {
        // Save carries one u32; declare eight bytes instead.
        let data = record(0x4025, 0, &[0u8; 8], 0);
        let err = decode(&data, DecodeOptions::default()).unwrap_err();
        assert!(matches!(err, Error::MalformedRecord { offset: 16, .. }));
    }

    #[test]
    fn test_unknown_record_passes_through() {
        let mut data = record(0x4100, 0x1234, &[9, 9, 9, 9], 0);
        data.extend(record(0x4002, 0, &[], 0));
        let records = decode(&data, DecodeOptions::default()).unwrap();
        assert_eq!(records[0].record_type, None);
        assert_eq!(records[0].type_code, 0x4100);
        assert_eq!(
            records[0].body,
            crate::images::emfplus::record::RecordBody::Unknown {
                payload: vec![9, 9, 9, 9]
            }
        );
    }
}
