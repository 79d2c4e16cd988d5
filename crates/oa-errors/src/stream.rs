//! Counter stream errors.
//!
//! [`StreamError`] is the closed taxonomy returned by session control,
//! record reading and device access. Two variants are recoverable inside a
//! read loop ([`StreamError::ReportLost`] and [`StreamError::WouldBlock`]);
//! every other variant is surfaced to the caller unchanged.

use crate::FormatError;
use crate::common::ErrorSeverity;

/// The device operation that produced an errno.
///
/// The same errno means different things depending on the call: `EINVAL`
/// from open is a rejected configuration, from read it is a stream that
/// cannot currently be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Opening a stream on a counter unit
    Open,
    /// Reading reports or records
    Read,
    /// Enable, disable or status query
    Control,
}

/// Stream session errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StreamError {
    /// The caller may not open streams on this unit
    #[error("Permission denied opening counter stream")]
    PermissionDenied,

    /// Bad format, metric set, exponent or flag combination
    #[error("Invalid stream configuration: {reason}")]
    InvalidConfig {
        /// Why the configuration was rejected
        reason: String,
    },

    /// The counter unit already has an open session
    #[error("Counter unit is busy")]
    Busy,

    /// Non-blocking session with nothing ready
    #[error("No reports available, operation would block")]
    WouldBlock,

    /// The hardware dropped one or more reports
    #[error("Reports were lost mid-stream")]
    ReportLost,

    /// The hardware ring buffer wrapped before it was drained
    #[error("OA buffer overflowed")]
    BufferOverflow,

    /// The destination buffer cannot receive the requested read
    #[error("Read of {requested} bytes would overrun a {available} byte buffer")]
    Fault {
        /// Bytes requested by the caller
        requested: usize,
        /// Bytes actually available in the destination
        available: usize,
    },

    /// The buffer is smaller than one record
    #[error("Buffer of {available} bytes cannot hold a {required} byte record")]
    NoSpace {
        /// Size of one full record
        required: usize,
        /// Size of the supplied buffer
        available: usize,
    },

    /// The session state does not allow the operation
    #[error("Invalid stream state: {state}")]
    InvalidState {
        /// Description of the offending state
        state: &'static str,
    },

    /// The configured format is unknown for the active generation
    #[error(transparent)]
    InvalidFormat(#[from] FormatError),

    /// Generic device I/O failure; query the session status to disambiguate
    #[error("Stream I/O failure (errno {errno})")]
    Io {
        /// Raw errno reported by the device
        errno: i32,
    },

    /// Stream bytes do not decode as records of the active format
    #[error("Malformed record: {0}")]
    MalformedRecord(String),
}

impl StreamError {
    /// Get the error severity.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            StreamError::WouldBlock => ErrorSeverity::Info,
            StreamError::ReportLost => ErrorSeverity::Warning,
            StreamError::Busy => ErrorSeverity::Warning,
            StreamError::BufferOverflow => ErrorSeverity::Error,
            StreamError::PermissionDenied => ErrorSeverity::Error,
            StreamError::InvalidConfig { .. } => ErrorSeverity::Error,
            StreamError::Fault { .. } => ErrorSeverity::Error,
            StreamError::NoSpace { .. } => ErrorSeverity::Error,
            StreamError::InvalidState { .. } => ErrorSeverity::Error,
            StreamError::InvalidFormat(_) => ErrorSeverity::Error,
            StreamError::Io { .. } => ErrorSeverity::Error,
            StreamError::MalformedRecord(_) => ErrorSeverity::Critical,
        }
    }

    /// Check whether a read loop may continue after this error.
    ///
    /// Lost reports invalidate comparisons spanning the gap but later
    /// samples remain usable; `WouldBlock` only means nothing is ready yet.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, StreamError::ReportLost | StreamError::WouldBlock)
    }

    /// Check whether samples collected since the last enable are suspect.
    pub fn invalidates_window(&self) -> bool {
        matches!(self, StreamError::BufferOverflow)
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        StreamError::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Create a malformed record error.
    pub fn malformed(reason: impl Into<String>) -> Self {
        StreamError::MalformedRecord(reason.into())
    }

    /// Map a raw errno returned by a stream device.
    pub fn from_errno(operation: Operation, errno: i32) -> Self {
        match errno {
            libc::EACCES | libc::EPERM => StreamError::PermissionDenied,
            libc::EBUSY => StreamError::Busy,
            libc::EAGAIN => StreamError::WouldBlock,
            libc::EFAULT => StreamError::Fault {
                requested: 0,
                available: 0,
            },
            libc::ENOSPC => StreamError::NoSpace {
                required: 0,
                available: 0,
            },
            libc::EINVAL => match operation {
                Operation::Open => StreamError::invalid_config("rejected by device"),
                Operation::Read | Operation::Control => StreamError::InvalidState {
                    state: "rejected by device",
                },
            },
            errno => StreamError::Io { errno },
        }
    }

    /// Map an I/O error returned by a stream device.
    ///
    /// The raw OS error wins when present; otherwise the error kind is used.
    pub fn from_io(operation: Operation, err: &std::io::Error) -> Self {
        if let Some(errno) = err.raw_os_error() {
            return Self::from_errno(operation, errno);
        }
        match err.kind() {
            std::io::ErrorKind::WouldBlock => StreamError::WouldBlock,
            std::io::ErrorKind::PermissionDenied => StreamError::PermissionDenied,
            std::io::ErrorKind::InvalidInput => Self::from_errno(operation, libc::EINVAL),
            _ => StreamError::Io { errno: libc::EIO },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errno_mapping_depends_on_operation() {
        assert_eq!(
            StreamError::from_errno(Operation::Open, libc::EINVAL),
            StreamError::invalid_config("rejected by device")
        );
        assert!(matches!(
            StreamError::from_errno(Operation::Read, libc::EINVAL),
            StreamError::InvalidState { .. }
        ));
    }

    #[test]
    fn test_errno_mapping_taxonomy() {
        assert_eq!(
            StreamError::from_errno(Operation::Open, libc::EBUSY),
            StreamError::Busy
        );
        assert_eq!(
            StreamError::from_errno(Operation::Open, libc::EACCES),
            StreamError::PermissionDenied
        );
        assert_eq!(
            StreamError::from_errno(Operation::Read, libc::EAGAIN),
            StreamError::WouldBlock
        );
        assert_eq!(
            StreamError::from_errno(Operation::Read, libc::EIO),
            StreamError::Io { errno: libc::EIO }
        );
    }

    #[test]
    fn test_io_error_kind_fallback() {
        let err = std::io::Error::from(std::io::ErrorKind::WouldBlock);
        assert_eq!(
            StreamError::from_io(Operation::Read, &err),
            StreamError::WouldBlock
        );

        let err = std::io::Error::other("device gone");
        assert_eq!(
            StreamError::from_io(Operation::Read, &err),
            StreamError::Io { errno: libc::EIO }
        );
    }

    #[test]
    fn test_io_error_prefers_raw_errno() {
        let err = std::io::Error::from_raw_os_error(libc::EBUSY);
        assert_eq!(StreamError::from_io(Operation::Open, &err), StreamError::Busy);
    }

    #[test]
    fn test_recoverable_set() {
        assert!(StreamError::ReportLost.is_recoverable());
        assert!(StreamError::WouldBlock.is_recoverable());
        assert!(!StreamError::BufferOverflow.is_recoverable());
        assert!(!StreamError::Busy.is_recoverable());
        assert!(StreamError::BufferOverflow.invalidates_window());
    }
}
