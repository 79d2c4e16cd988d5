//! Devices backed by any byte source.

use std::io::{ErrorKind, Read};

use oa_errors::{Operation, StreamError};
use tracing::debug;

use crate::device::StreamDevice;
use crate::status::StatusBits;

/// A [`StreamDevice`] reading from a [`Read`] implementation.
///
/// Used for character devices opened by the caller and for replaying
/// captured streams. Reads may return partial records; the session
/// reassembles them. Status queries always report no conditions.
#[derive(Debug)]
pub struct IoDevice<R> {
    reader: R,
    enabled: bool,
    closed: bool,
}

impl<R: Read + Send> IoDevice<R> {
    /// Wrap a byte source.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            enabled: true,
            closed: false,
        }
    }

    /// Whether the device is sampling.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Unwrap the byte source.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read + Send> StreamDevice for IoDevice<R> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, StreamError> {
        if self.closed {
            return Err(StreamError::InvalidState { state: "closed" });
        }
        loop {
            match self.reader.read(buf) {
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    debug!(error = %e, "Stream read failed");
                    return Err(StreamError::from_io(Operation::Read, &e));
                }
            }
        }
    }

    fn enable(&mut self) -> Result<(), StreamError> {
        self.enabled = true;
        Ok(())
    }

    fn disable(&mut self) -> Result<(), StreamError> {
        self.enabled = false;
        Ok(())
    }

    fn status(&mut self) -> Result<StatusBits, StreamError> {
        Ok(StatusBits::empty())
    }

    fn close(&mut self) {
        self.closed = true;
        self.enabled = false;
    }
}
