//! Device seams.
//!
//! A [`CounterUnit`] hands out at most one [`StreamDevice`] at a time. The
//! device is the raw byte source behind a session; the session owns state
//! tracking, buffer checks and record parsing.

use oa_errors::StreamError;
use oa_format::{FormatDescriptor, Generation, Interface};

use crate::config::SessionConfig;
use crate::status::StatusBits;

/// Hardware generation and kernel interface of a counter unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Platform {
    /// Hardware generation
    pub generation: Generation,
    /// Kernel stream interface
    pub interface: Interface,
}

impl Platform {
    /// Create a platform description.
    pub const fn new(generation: Generation, interface: Interface) -> Self {
        Self {
            generation,
            interface,
        }
    }
}

/// An open counter stream.
pub trait StreamDevice: Send {
    /// Read whole records or reports into `buf`.
    ///
    /// Returns the number of bytes written; `Ok(0)` means the source is
    /// exhausted.
    ///
    /// # Errors
    ///
    /// Device failures mapped into the [`StreamError`] taxonomy.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, StreamError>;

    /// Start sampling.
    ///
    /// # Errors
    ///
    /// Device failures mapped into the [`StreamError`] taxonomy.
    fn enable(&mut self) -> Result<(), StreamError>;

    /// Stop sampling.
    ///
    /// # Errors
    ///
    /// Device failures mapped into the [`StreamError`] taxonomy.
    fn disable(&mut self) -> Result<(), StreamError>;

    /// Query and clear the status bits.
    ///
    /// # Errors
    ///
    /// Device failures mapped into the [`StreamError`] taxonomy.
    fn status(&mut self) -> Result<StatusBits, StreamError>;

    /// Release the stream and its unit.
    fn close(&mut self);
}

/// A hardware counter unit that can host one stream.
pub trait CounterUnit {
    /// Device handle of an open stream.
    type Device: StreamDevice;

    /// Generation and interface of the unit.
    fn platform(&self) -> Platform;

    /// Claim the unit and open a stream.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Busy`] if a stream is already open and
    /// [`StreamError::PermissionDenied`] if the caller may not open one.
    fn open_stream(
        &self,
        config: &SessionConfig,
        format: &FormatDescriptor,
    ) -> Result<Self::Device, StreamError>;
}
