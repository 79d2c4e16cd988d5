//! Record framing of the counter stream.
//!
//! On the legacy interface every record starts with a 12-byte
//! `{type, size, reserved}` header in little-endian order, followed by
//! `size` payload bytes for samples. The observation interface carries bare
//! reports back to back, so every record there is a sample.

use oa_errors::StreamError;
use oa_format::{FormatDescriptor, Interface, Report};

/// Length of a legacy record header.
pub const RECORD_HEADER_LEN: usize = 12;

/// Record type codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum RecordType {
    /// A report follows the header
    Sample = 1,
    /// The hardware dropped reports
    ReportLost = 2,
    /// The report buffer wrapped
    BufferOverflow = 3,
}

impl RecordType {
    /// The wire code.
    pub const fn code(self) -> u32 {
        self as u32
    }

    /// Decode a wire code.
    pub const fn from_code(code: u32) -> Option<Self> {
        match code {
            1 => Some(RecordType::Sample),
            2 => Some(RecordType::ReportLost),
            3 => Some(RecordType::BufferOverflow),
            _ => None,
        }
    }
}

/// A legacy record header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordHeader {
    /// Raw record type code
    pub record_type: u32,
    /// Payload length in bytes
    pub size: u32,
    /// Reserved, written as zero
    pub reserved: u32,
}

impl RecordHeader {
    /// Header of a sample carrying `payload_len` bytes.
    pub fn sample(payload_len: u32) -> Self {
        Self {
            record_type: RecordType::Sample.code(),
            size: payload_len,
            reserved: 0,
        }
    }

    /// Header of a record without payload.
    pub fn marker(record_type: RecordType) -> Self {
        Self {
            record_type: record_type.code(),
            size: 0,
            reserved: 0,
        }
    }

    /// Encode to wire bytes.
    pub fn encode(&self) -> [u8; RECORD_HEADER_LEN] {
        let mut out = [0u8; RECORD_HEADER_LEN];
        for (chunk, word) in out
            .chunks_exact_mut(4)
            .zip([self.record_type, self.size, self.reserved])
        {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        out
    }

    /// Decode the header at the start of `bytes`, if enough bytes are present.
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        let word = |offset: usize| -> Option<u32> {
            let field = bytes.get(offset..offset.checked_add(4)?)?;
            <[u8; 4]>::try_from(field).ok().map(u32::from_le_bytes)
        };
        Some(Self {
            record_type: word(0)?,
            size: word(4)?,
            reserved: word(8)?,
        })
    }
}

/// One record read from a counter stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    /// A report of the session format
    Sample(Report),
    /// Reports were lost; comparisons across this point are invalid
    ReportLost,
    /// The buffer overflowed; samples since the last enable are suspect
    BufferOverflow,
}

impl Record {
    /// The report of a sample record.
    pub fn as_sample(&self) -> Option<&Report> {
        match self {
            Record::Sample(report) => Some(report),
            Record::ReportLost | Record::BufferOverflow => None,
        }
    }

    /// Short name for logs.
    pub const fn kind(&self) -> &'static str {
        match self {
            Record::Sample(_) => "sample",
            Record::ReportLost => "report lost",
            Record::BufferOverflow => "buffer overflow",
        }
    }
}

/// Largest record of `format` on `interface`.
pub fn max_record_len(interface: Interface, format: &FormatDescriptor) -> usize {
    if interface.has_record_headers() {
        format.size().saturating_add(RECORD_HEADER_LEN)
    } else {
        format.size()
    }
}

/// Split the first record off `bytes`.
///
/// Returns `Ok(None)` when `bytes` ends before the record does, and the
/// record with the number of bytes it occupied otherwise.
///
/// # Errors
///
/// Returns [`StreamError::MalformedRecord`] for unknown record types and
/// payload sizes that do not match the record type.
pub fn parse_record(
    interface: Interface,
    format: &FormatDescriptor,
    bytes: &[u8],
) -> Result<Option<(Record, usize)>, StreamError> {
    if !interface.has_record_headers() {
        return Ok(bytes
            .get(..format.size())
            .map(|report| (Record::Sample(Report::from_slice(report)), format.size())));
    }

    let Some(header) = RecordHeader::decode(bytes) else {
        return Ok(None);
    };
    let size = usize::try_from(header.size).unwrap_or(usize::MAX);
    match RecordType::from_code(header.record_type) {
        Some(RecordType::Sample) => {
            if size != format.size() {
                return Err(StreamError::malformed(format!(
                    "sample of {size} bytes, format {} is {} bytes",
                    format.name(),
                    format.size()
                )));
            }
            let end = RECORD_HEADER_LEN.saturating_add(size);
            Ok(bytes
                .get(RECORD_HEADER_LEN..end)
                .map(|report| (Record::Sample(Report::from_slice(report)), end)))
        }
        Some(marker @ (RecordType::ReportLost | RecordType::BufferOverflow)) => {
            if size != 0 {
                return Err(StreamError::malformed(format!(
                    "{marker:?} record carries {size} payload bytes"
                )));
            }
            let record = match marker {
                RecordType::ReportLost => Record::ReportLost,
                _ => Record::BufferOverflow,
            };
            Ok(Some((record, RECORD_HEADER_LEN)))
        }
        None => Err(StreamError::malformed(format!(
            "unknown record type {}",
            header.record_type
        ))),
    }
}

/// Iterator over the records held in a byte buffer.
///
/// Yields an error and stops at the first malformed or truncated record.
#[derive(Debug, Clone)]
pub struct RecordParser<'a> {
    interface: Interface,
    format: &'a FormatDescriptor,
    bytes: &'a [u8],
    done: bool,
}

impl<'a> RecordParser<'a> {
    /// Parse `bytes` as records of `format` framed for `interface`.
    pub fn new(interface: Interface, format: &'a FormatDescriptor, bytes: &'a [u8]) -> Self {
        Self {
            interface,
            format,
            bytes,
            done: false,
        }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> &'a [u8] {
        self.bytes
    }
}

impl Iterator for RecordParser<'_> {
    type Item = Result<Record, StreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.bytes.is_empty() {
            return None;
        }
        match parse_record(self.interface, self.format, self.bytes) {
            Ok(Some((record, used))) => {
                self.bytes = self.bytes.get(used..).unwrap_or_default();
                Some(Ok(record))
            }
            Ok(None) => {
                self.done = true;
                Some(Err(StreamError::malformed(format!(
                    "truncated record: {} trailing bytes",
                    self.bytes.len()
                ))))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
