//! Report layout errors.
//!
//! Raised by catalog lookups, descriptor validation and the bounds-checked
//! report accessors.

use crate::common::ErrorSeverity;

/// Report layout errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    /// No layout is defined for this format id on the generation
    #[error("Format {format_id} is not defined for {generation}")]
    InvalidFormat {
        /// Generation the lookup was keyed by
        generation: &'static str,
        /// Requested format id
        format_id: u32,
    },

    /// A report buffer does not match the descriptor size
    #[error("Report is {actual} bytes, format {format} expects {expected}")]
    LengthMismatch {
        /// Format name
        format: String,
        /// Descriptor size in bytes
        expected: usize,
        /// Supplied buffer length
        actual: usize,
    },

    /// A field lies outside the report
    #[error("Field at offset {offset} ({width} bytes) exceeds report size {size}")]
    OutOfBounds {
        /// Byte offset of the field
        offset: usize,
        /// Field width in bytes
        width: usize,
        /// Report size in bytes
        size: usize,
    },

    /// Two regions of a layout share bytes
    #[error("Format {format}: {first} overlaps {second}")]
    Overlap {
        /// Format name
        format: String,
        /// First region
        first: String,
        /// Second region
        second: String,
    },

    /// Operands were produced by different layouts
    #[error("Layout mismatch: {left} vs {right}")]
    LayoutMismatch {
        /// Left-hand format name
        left: String,
        /// Right-hand format name
        right: String,
    },

    /// A descriptor definition is inconsistent
    #[error("Invalid descriptor {format}: {reason}")]
    InvalidDescriptor {
        /// Format name
        format: String,
        /// Reason for rejection
        reason: String,
    },

    /// A format table could not be loaded
    #[error("Failed to load format catalog: {0}")]
    Catalog(String),
}

impl FormatError {
    /// Get the error severity.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            FormatError::InvalidFormat { .. } => ErrorSeverity::Error,
            FormatError::LengthMismatch { .. } => ErrorSeverity::Error,
            FormatError::OutOfBounds { .. } => ErrorSeverity::Error,
            FormatError::Overlap { .. } => ErrorSeverity::Critical,
            FormatError::LayoutMismatch { .. } => ErrorSeverity::Error,
            FormatError::InvalidDescriptor { .. } => ErrorSeverity::Critical,
            FormatError::Catalog(_) => ErrorSeverity::Critical,
        }
    }

    /// Create an invalid format error.
    pub fn invalid_format(generation: &'static str, format_id: u32) -> Self {
        FormatError::InvalidFormat {
            generation,
            format_id,
        }
    }

    /// Create an invalid descriptor error.
    pub fn invalid_descriptor(format: impl Into<String>, reason: impl Into<String>) -> Self {
        FormatError::InvalidDescriptor {
            format: format.into(),
            reason: reason.into(),
        }
    }
}
