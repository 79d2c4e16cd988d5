//! Top-level error type and classification shared by all OA crates.

use core::fmt;

use crate::{ConfigError, ExponentError, FormatError, StreamError};

/// Top-level error type wrapping every OA sub-error.
#[derive(Debug, thiserror::Error)]
pub enum OaError {
    /// Report layout errors
    #[error("Format error: {0}")]
    Format(#[from] FormatError),

    /// Sampling exponent errors
    #[error("Exponent error: {0}")]
    Exponent(#[from] ExponentError),

    /// Counter stream errors
    #[error("Stream error: {0}")]
    Stream(#[from] StreamError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O errors outside of a stream session
    #[error("I/O error: {0}")]
    Io(#[source] std::io::Error),
}

impl OaError {
    /// Get the error category for classification.
    pub fn category(&self) -> ErrorCategory {
        match self {
            OaError::Format(_) => ErrorCategory::Format,
            OaError::Exponent(_) => ErrorCategory::Exponent,
            OaError::Stream(_) => ErrorCategory::Stream,
            OaError::Config(_) => ErrorCategory::Config,
            OaError::Io(_) => ErrorCategory::Io,
        }
    }

    /// Get the error severity level.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            OaError::Format(e) => e.severity(),
            OaError::Exponent(_) => ErrorSeverity::Error,
            OaError::Stream(e) => e.severity(),
            OaError::Config(_) => ErrorSeverity::Error,
            OaError::Io(_) => ErrorSeverity::Error,
        }
    }

    /// Check whether a read loop may continue after this error.
    pub fn is_recoverable(&self) -> bool {
        match self {
            OaError::Stream(e) => e.is_recoverable(),
            _ => false,
        }
    }
}

impl From<std::io::Error> for OaError {
    fn from(e: std::io::Error) -> Self {
        OaError::Io(e)
    }
}

/// Error category for classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorCategory {
    /// Report layout errors
    Format = 0,
    /// Sampling exponent errors
    Exponent = 1,
    /// Counter stream errors
    Stream = 2,
    /// Configuration errors
    Config = 3,
    /// I/O errors
    Io = 4,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Format => write!(f, "Format"),
            ErrorCategory::Exponent => write!(f, "Exponent"),
            ErrorCategory::Stream => write!(f, "Stream"),
            ErrorCategory::Config => write!(f, "Config"),
            ErrorCategory::Io => write!(f, "IO"),
        }
    }
}

/// Error severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ErrorSeverity {
    /// Informational, no action required
    Info = 0,
    /// Warning, the caller should discard affected data
    Warning = 1,
    /// Error, operation failed
    Error = 2,
    /// Critical, the session cannot continue
    Critical = 3,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category_display() {
        assert_eq!(ErrorCategory::Format.to_string(), "Format");
        assert_eq!(ErrorCategory::Stream.to_string(), "Stream");
        assert_eq!(ErrorCategory::Io.to_string(), "IO");
    }

    #[test]
    fn test_error_severity_ordering() {
        assert!(ErrorSeverity::Critical > ErrorSeverity::Error);
        assert!(ErrorSeverity::Error > ErrorSeverity::Warning);
        assert!(ErrorSeverity::Warning > ErrorSeverity::Info);
    }

    #[test]
    fn test_oa_error_category() {
        let err: OaError = StreamError::Busy.into();
        assert_eq!(err.category(), ErrorCategory::Stream);

        let err: OaError = ExponentError::ZeroTickFrequency.into();
        assert_eq!(err.category(), ErrorCategory::Exponent);
    }

    #[test]
    fn test_only_stream_losses_are_recoverable() {
        let lost: OaError = StreamError::ReportLost.into();
        assert!(lost.is_recoverable());

        let overflow: OaError = StreamError::BufferOverflow.into();
        assert!(!overflow.is_recoverable());

        let format: OaError = FormatError::invalid_format("gen9", 0).into();
        assert!(!format.is_recoverable());
    }

    #[test]
    fn test_oa_error_is_std_error() {
        let err: OaError = StreamError::WouldBlock.into();
        let _: &dyn std::error::Error = &err;
    }
}
