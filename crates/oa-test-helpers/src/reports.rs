//! Report builders.
//!
//! [`ReportWriter`] lays values out exactly where a [`FormatDescriptor`]
//! says the decoder will look for them, so tests state counter values
//! instead of byte offsets.

use oa_format::header::{REASON_MASK, REASON_SHIFT};
use oa_format::{FormatDescriptor, HeaderWidth, ReasonBits, Report};

/// Builds one report for a format.
///
/// Counter indices are positions inside their group, not logical counter
/// numbers. Writes to groups the format lacks panic.
#[derive(Debug, Clone)]
pub struct ReportWriter<'f> {
    format: &'f FormatDescriptor,
    bytes: Vec<u8>,
}

impl<'f> ReportWriter<'f> {
    /// Start from an all-zero report.
    pub fn new(format: &'f FormatDescriptor) -> Self {
        Self {
            format,
            bytes: vec![0; format.size()],
        }
    }

    /// Set the timestamp field (truncated to 32 bits on narrow headers).
    #[track_caller]
    pub fn timestamp(mut self, value: u64) -> Self {
        let header = self.format.header();
        let offset = header.timestamp_offset();
        match header {
            HeaderWidth::Bits32 => self.put(offset, &(value as u32).to_le_bytes()),
            HeaderWidth::Bits64 => self.put(offset, &value.to_le_bytes()),
        }
        self
    }

    /// Set the clock-ticks field (truncated to 32 bits on narrow headers).
    #[track_caller]
    pub fn clock_ticks(mut self, value: u64) -> Self {
        let header = self.format.header();
        let offset = header.clock_ticks_offset();
        match header {
            HeaderWidth::Bits32 => self.put(offset, &(value as u32).to_le_bytes()),
            HeaderWidth::Bits64 => self.put(offset, &value.to_le_bytes()),
        }
        self
    }

    /// Replace the reason bits of dword0.
    #[track_caller]
    pub fn reason(self, reason: ReasonBits) -> Self {
        let cleared = self.dword0() & !(REASON_MASK << REASON_SHIFT);
        self.with_dword0(cleared | reason.to_dword0())
    }

    /// Set a context id and its valid flag.
    ///
    /// # Panics
    ///
    /// Panics on generations that do not tag contexts.
    #[track_caller]
    pub fn context_id(mut self, id: u32) -> Self {
        let bit = match self.format.capabilities().context_valid_bit {
            Some(bit) => bit,
            None => panic!("{} reports carry no context id", self.format.generation()),
        };
        let offset = self.format.header().context_id_offset();
        self.put(offset, &id.to_le_bytes());
        let dword0 = self.dword0() | (1 << bit);
        self.with_dword0(dword0)
    }

    /// Overwrite dword0 entirely.
    #[track_caller]
    pub fn with_dword0(mut self, dword0: u32) -> Self {
        self.put(0, &dword0.to_le_bytes());
        self
    }

    /// Set a 40-bit split counter.
    #[track_caller]
    pub fn a40(mut self, index: usize, value: u64) -> Self {
        let group = match self.format.a40() {
            Some(group) if index < group.count => group,
            _ => panic!("{} has no a40 counter {index}", self.format.name()),
        };
        self.put(group.low_offset + 4 * index, &(value as u32).to_le_bytes());
        self.put(group.high_offset + index, &[(value >> 32) as u8]);
        self
    }

    /// Set a 64-bit A counter.
    #[track_caller]
    pub fn a64(mut self, index: usize, value: u64) -> Self {
        let group = match self.format.a64() {
            Some(group) if index < group.count => group,
            _ => panic!("{} has no a64 counter {index}", self.format.name()),
        };
        self.put(group.offset + 8 * index, &value.to_le_bytes());
        self
    }

    /// Set a 32-bit A counter.
    #[track_caller]
    pub fn a32(mut self, index: usize, value: u32) -> Self {
        let group = match self.format.a32() {
            Some(group) if index < group.count => group,
            _ => panic!("{} has no a32 counter {index}", self.format.name()),
        };
        self.put(group.offset + 4 * index, &value.to_le_bytes());
        self
    }

    /// Set a B counter.
    #[track_caller]
    pub fn b(mut self, index: usize, value: u32) -> Self {
        let group = match self.format.b() {
            Some(group) if index < group.count => group,
            _ => panic!("{} has no B counter {index}", self.format.name()),
        };
        self.put(group.offset + 4 * index, &value.to_le_bytes());
        self
    }

    /// Set a C counter.
    #[track_caller]
    pub fn c(mut self, index: usize, value: u32) -> Self {
        let group = match self.format.c() {
            Some(group) if index < group.count => group,
            _ => panic!("{} has no C counter {index}", self.format.name()),
        };
        self.put(group.offset + 4 * index, &value.to_le_bytes());
        self
    }

    /// The report bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// The finished report.
    pub fn build(self) -> Report {
        Report::new(self.bytes)
    }

    fn dword0(&self) -> u32 {
        let mut dword = [0u8; 4];
        dword.copy_from_slice(&self.bytes[..4]);
        u32::from_le_bytes(dword)
    }

    #[track_caller]
    fn put(&mut self, offset: usize, value: &[u8]) {
        let size = self.bytes.len();
        match self.bytes.get_mut(offset..offset + value.len()) {
            Some(dst) => dst.copy_from_slice(value),
            None => panic!("write of {} bytes at {offset} exceeds {size}", value.len()),
        }
    }
}
