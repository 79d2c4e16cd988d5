//! Counter stream builders.

use oa_stream::record::{RecordHeader, RecordType};

/// Builds counter stream bytes record by record.
#[derive(Debug, Clone, Default)]
pub struct StreamWriter {
    bytes: Vec<u8>,
}

impl StreamWriter {
    /// Start an empty stream.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sample record framed by a record header.
    pub fn sample(self, report: &[u8]) -> Self {
        self.record(RecordType::Sample.code(), report)
    }

    /// Append a report-lost record.
    pub fn report_lost(self) -> Self {
        self.record(RecordType::ReportLost.code(), &[])
    }

    /// Append a buffer-overflow record.
    pub fn buffer_overflow(self) -> Self {
        self.record(RecordType::BufferOverflow.code(), &[])
    }

    /// Append a record with an arbitrary type code and payload.
    pub fn record(mut self, record_type: u32, payload: &[u8]) -> Self {
        let header = RecordHeader {
            record_type,
            size: payload.len() as u32,
            reserved: 0,
        };
        self.bytes.extend_from_slice(&header.encode());
        self.bytes.extend_from_slice(payload);
        self
    }

    /// Append bytes without framing.
    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.bytes.extend_from_slice(bytes);
        self
    }

    /// The stream bytes.
    pub fn finish(self) -> Vec<u8> {
        self.bytes
    }
}
