//! Owned report buffers and descriptor-bound views.

use oa_errors::FormatError;

use crate::descriptor::FormatDescriptor;

/// Raw bytes of one OA report.
///
/// A report is opaque until it is paired with the [`FormatDescriptor`] of
/// the stream that produced it, see [`Report::view`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Report {
    bytes: Box<[u8]>,
}

impl Report {
    /// Wrap report bytes.
    pub fn new(bytes: impl Into<Box<[u8]>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    /// Copy report bytes out of a larger buffer.
    pub fn from_slice(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    /// The raw report bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Report length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the report holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Bind the report to a format.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::LengthMismatch`] if the report length differs
    /// from the descriptor size.
    pub fn view<'a>(&'a self, format: &'a FormatDescriptor) -> Result<ReportView<'a>, FormatError> {
        ReportView::new(format, &self.bytes)
    }
}

impl From<Vec<u8>> for Report {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl AsRef<[u8]> for Report {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

/// A report paired with its format.
///
/// The length is checked once on construction; field reads still go
/// through bounds-checked accessors so a descriptor built outside the
/// validating builder cannot cause an out-of-range read.
#[derive(Debug, Clone, Copy)]
pub struct ReportView<'a> {
    format: &'a FormatDescriptor,
    bytes: &'a [u8],
}

impl<'a> ReportView<'a> {
    /// Create a view over `bytes`.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::LengthMismatch`] unless `bytes.len()` equals
    /// the descriptor size.
    pub fn new(format: &'a FormatDescriptor, bytes: &'a [u8]) -> Result<Self, FormatError> {
        if bytes.len() != format.size() {
            return Err(FormatError::LengthMismatch {
                format: format.name().to_string(),
                expected: format.size(),
                actual: bytes.len(),
            });
        }
        Ok(Self { format, bytes })
    }

    /// The format this view is bound to.
    pub fn format(&self) -> &'a FormatDescriptor {
        self.format
    }

    /// The raw report bytes.
    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Header dword0 (reason, context-valid flag, clock ratios).
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::OutOfBounds`] for reports shorter than a dword.
    pub fn dword0(&self) -> Result<u32, FormatError> {
        self.u32_at(0)
    }

    /// Read a byte.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::OutOfBounds`] if `offset` is past the end.
    pub fn u8_at(&self, offset: usize) -> Result<u8, FormatError> {
        self.field::<1>(offset).map(u8::from_le_bytes)
    }

    /// Read a little-endian `u32`.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::OutOfBounds`] if the field extends past the end.
    pub fn u32_at(&self, offset: usize) -> Result<u32, FormatError> {
        self.field::<4>(offset).map(u32::from_le_bytes)
    }

    /// Read a little-endian `u64`.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::OutOfBounds`] if the field extends past the end.
    pub fn u64_at(&self, offset: usize) -> Result<u64, FormatError> {
        self.field::<8>(offset).map(u64::from_le_bytes)
    }

    fn field<const N: usize>(&self, offset: usize) -> Result<[u8; N], FormatError> {
        offset
            .checked_add(N)
            .and_then(|end| self.bytes.get(offset..end))
            .and_then(|slice| <[u8; N]>::try_from(slice).ok())
            .ok_or(FormatError::OutOfBounds {
                offset,
                width: N,
                size: self.bytes.len(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::CounterGroup;
    use crate::generation::Generation;

    fn c4_b8() -> Result<FormatDescriptor, FormatError> {
        FormatDescriptor::builder(Generation::Gen9, 7, "C4_B8", 64)
            .c(16, 4)
            .b(32, 8)
            .build()
    }

    #[test]
    fn test_view_rejects_wrong_length() -> Result<(), FormatError> {
        let format = c4_b8()?;
        let report = Report::new(vec![0u8; 63]);
        assert!(matches!(
            report.view(&format),
            Err(FormatError::LengthMismatch {
                expected: 64,
                actual: 63,
                ..
            })
        ));
        Ok(())
    }

    #[test]
    fn test_little_endian_reads() -> Result<(), FormatError> {
        let format = c4_b8()?;
        let mut bytes = vec![0u8; 64];
        if let Some(field) = bytes.get_mut(4..12) {
            field.copy_from_slice(&0x0102_0304_0506_0708u64.to_le_bytes());
        }
        let view = ReportView::new(&format, &bytes)?;
        assert_eq!(view.u32_at(4)?, 0x0506_0708);
        assert_eq!(view.u64_at(4)?, 0x0102_0304_0506_0708);
        assert_eq!(view.u8_at(11)?, 0x01);
        Ok(())
    }

    #[test]
    fn test_reads_past_end_are_errors() -> Result<(), FormatError> {
        let format = c4_b8()?;
        let bytes = [0u8; 64];
        let view = ReportView::new(&format, &bytes)?;
        assert!(matches!(
            view.u64_at(60),
            Err(FormatError::OutOfBounds { offset: 60, width: 8, size: 64 })
        ));
        assert!(matches!(
            view.u32_at(usize::MAX),
            Err(FormatError::OutOfBounds { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_report_from_vec() -> Result<(), FormatError> {
        let format = FormatDescriptor::builder(Generation::Gen9, 8, "A12", 64)
            .header_len(12)
            .a32(CounterGroup::new(12, 12).starting_at(7))
            .build()?;
        let report = Report::from(vec![0xffu8; 64]);
        assert_eq!(report.len(), 64);
        assert_eq!(report.view(&format)?.dword0()?, u32::MAX);
        Ok(())
    }
}
