//! In-memory counter unit.
//!
//! [`SimulatedUnit`] behaves like a kernel counter unit: one stream at a
//! time, whole records per read, blocking or non-blocking reads, and the
//! loss signalling of the unit's interface. Reports are injected with
//! [`SimulatedUnit::push_report`] from any thread.

use std::collections::VecDeque;
use std::sync::Arc;

use oa_errors::StreamError;
use oa_format::{FormatDescriptor, Interface};
use parking_lot::{Condvar, Mutex};
use tracing::trace;

use crate::config::SessionConfig;
use crate::device::{CounterUnit, Platform, StreamDevice};
use crate::record::{RecordHeader, RecordType};
use crate::status::StatusBits;

#[derive(Debug)]
enum Pending {
    Bytes(Vec<u8>),
    Lost,
    Overflow,
}

#[derive(Debug, Default)]
struct UnitState {
    denied: bool,
    claimed: bool,
    enabled: bool,
    sampling: bool,
    report_size: usize,
    queue: VecDeque<Pending>,
    status: StatusBits,
}

#[derive(Debug, Default)]
struct Shared {
    state: Mutex<UnitState>,
    ready: Condvar,
}

/// An in-memory counter unit.
///
/// Clones share the same unit.
#[derive(Debug, Clone)]
pub struct SimulatedUnit {
    platform: Platform,
    shared: Arc<Shared>,
}

impl SimulatedUnit {
    /// Create an idle unit.
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            shared: Arc::new(Shared::default()),
        }
    }

    /// Refuse or allow new streams with `PermissionDenied`.
    pub fn set_permitted(&self, permitted: bool) {
        self.shared.state.lock().denied = !permitted;
    }

    /// Whether a stream currently holds the unit.
    pub fn is_claimed(&self) -> bool {
        self.shared.state.lock().claimed
    }

    /// Queue a report as the hardware would write it.
    ///
    /// Returns `false` and drops the report unless an open stream is
    /// enabled and sampling.
    pub fn push_report(&self, report: &[u8]) -> bool {
        let mut state = self.shared.state.lock();
        if !(state.claimed && state.enabled && state.sampling) {
            return false;
        }
        let bytes = match self.platform.interface {
            Interface::Legacy => {
                let size = u32::try_from(report.len()).unwrap_or(u32::MAX);
                let mut framed = RecordHeader::sample(size).encode().to_vec();
                framed.extend_from_slice(report);
                framed
            }
            Interface::Observation => report.to_vec(),
        };
        trace!(bytes = bytes.len(), "Simulated report queued");
        state.queue.push_back(Pending::Bytes(bytes));
        self.shared.ready.notify_all();
        true
    }

    /// Signal that reports were dropped.
    pub fn push_report_lost(&self) -> bool {
        self.push_loss(Pending::Lost)
    }

    /// Signal that the report buffer wrapped.
    pub fn push_buffer_overflow(&self) -> bool {
        self.push_loss(Pending::Overflow)
    }

    fn push_loss(&self, loss: Pending) -> bool {
        let mut state = self.shared.state.lock();
        if !(state.claimed && state.enabled) {
            return false;
        }
        let entry = match (self.platform.interface, loss) {
            (Interface::Legacy, Pending::Lost) => {
                Pending::Bytes(RecordHeader::marker(RecordType::ReportLost).encode().to_vec())
            }
            (Interface::Legacy, _) => {
                Pending::Bytes(RecordHeader::marker(RecordType::BufferOverflow).encode().to_vec())
            }
            (Interface::Observation, loss) => loss,
        };
        state.queue.push_back(entry);
        self.shared.ready.notify_all();
        true
    }
}

impl CounterUnit for SimulatedUnit {
    type Device = SimulatedDevice;

    fn platform(&self) -> Platform {
        self.platform
    }

    fn open_stream(
        &self,
        config: &SessionConfig,
        format: &FormatDescriptor,
    ) -> Result<SimulatedDevice, StreamError> {
        let mut state = self.shared.state.lock();
        if state.denied {
            return Err(StreamError::PermissionDenied);
        }
        if state.claimed {
            return Err(StreamError::Busy);
        }
        *state = UnitState {
            denied: false,
            claimed: true,
            enabled: !config.start_disabled,
            sampling: config.is_sampling(),
            report_size: format.size(),
            queue: VecDeque::new(),
            status: StatusBits::empty(),
        };
        Ok(SimulatedDevice {
            shared: Arc::clone(&self.shared),
            interface: self.platform.interface,
            non_blocking: config.non_blocking,
            open: true,
        })
    }
}

/// Stream handle on a [`SimulatedUnit`].
///
/// Dropping the handle releases the unit.
#[derive(Debug)]
pub struct SimulatedDevice {
    shared: Arc<Shared>,
    interface: Interface,
    non_blocking: bool,
    open: bool,
}

impl StreamDevice for SimulatedDevice {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, StreamError> {
        if !self.open {
            return Err(StreamError::InvalidState { state: "closed" });
        }
        let mut state = self.shared.state.lock();
        while state.queue.is_empty() {
            if self.non_blocking {
                return Err(StreamError::WouldBlock);
            }
            self.shared.ready.wait(&mut state);
            if !state.claimed {
                return Err(StreamError::InvalidState { state: "closed" });
            }
        }

        let mut copied = 0usize;
        while let Some(front) = state.queue.front() {
            match front {
                Pending::Bytes(bytes) => {
                    let end = copied.saturating_add(bytes.len());
                    let Some(dst) = buf.get_mut(copied..end) else {
                        if copied == 0 {
                            return Err(StreamError::NoSpace {
                                required: bytes.len(),
                                available: buf.len(),
                            });
                        }
                        break;
                    };
                    dst.copy_from_slice(bytes);
                    copied = end;
                    state.queue.pop_front();
                }
                Pending::Lost | Pending::Overflow => {
                    if copied > 0 {
                        break;
                    }
                    let flag = match front {
                        Pending::Lost => StatusBits::REPORT_LOST,
                        _ => StatusBits::BUFFER_OVERFLOW,
                    };
                    state.status |= flag;
                    state.queue.pop_front();
                    return Err(StreamError::Io { errno: libc::EIO });
                }
            }
        }
        Ok(copied)
    }

    fn enable(&mut self) -> Result<(), StreamError> {
        let mut state = self.shared.state.lock();
        state.enabled = true;
        state.queue.clear();
        state.status = StatusBits::empty();
        Ok(())
    }

    fn disable(&mut self) -> Result<(), StreamError> {
        self.shared.state.lock().enabled = false;
        Ok(())
    }

    fn status(&mut self) -> Result<StatusBits, StreamError> {
        let mut state = self.shared.state.lock();
        Ok(std::mem::take(&mut state.status))
    }

    fn close(&mut self) {
        if !self.open {
            return;
        }
        self.open = false;
        let mut state = self.shared.state.lock();
        state.claimed = false;
        state.enabled = false;
        state.queue.clear();
        self.shared.ready.notify_all();
    }
}

impl Drop for SimulatedDevice {
    fn drop(&mut self) {
        self.close();
    }
}

impl SimulatedDevice {
    /// Interface the device frames its bytes for.
    pub fn interface(&self) -> Interface {
        self.interface
    }

    /// Size of the reports the stream produces.
    pub fn report_size(&self) -> usize {
        self.shared.state.lock().report_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oa_format::Generation;

    fn format() -> Result<FormatDescriptor, Box<dyn std::error::Error>> {
        Ok(FormatDescriptor::builder(Generation::Gen12, 4, "A32u40_A4u32_B8_C8", 256)
            .a40(16, 160, 32, 0)
            .b(192, 8)
            .c(224, 8)
            .build()?)
    }

    #[test]
    fn test_single_claim() -> Result<(), Box<dyn std::error::Error>> {
        let unit = SimulatedUnit::new(Platform::new(Generation::Gen12, Interface::Observation));
        let format = format()?;
        let config = SessionConfig::new(4, 1, 10);
        let first = unit.open_stream(&config, &format)?;
        assert!(matches!(unit.open_stream(&config, &format), Err(StreamError::Busy)));
        drop(first);
        assert!(!unit.is_claimed());
        assert_eq!(unit.open_stream(&config, &format)?.report_size(), 256);
        Ok(())
    }

    #[test]
    fn test_observation_loss_is_eio_then_status() -> Result<(), Box<dyn std::error::Error>> {
        let unit = SimulatedUnit::new(Platform::new(Generation::Gen12, Interface::Observation));
        let format = format()?;
        let mut device = unit.open_stream(&SessionConfig::new(4, 1, 10).non_blocking(), &format)?;
        assert!(unit.push_report(&[0u8; 256]));
        assert!(unit.push_report_lost());

        let mut buf = vec![0u8; 1024];
        assert_eq!(device.read(&mut buf)?, 256);
        assert_eq!(device.read(&mut buf), Err(StreamError::Io { errno: libc::EIO }));
        assert_eq!(device.status()?, StatusBits::REPORT_LOST);
        assert_eq!(device.status()?, StatusBits::empty());
        assert_eq!(device.read(&mut buf), Err(StreamError::WouldBlock));
        Ok(())
    }

    #[test]
    fn test_reports_dropped_while_disabled() -> Result<(), Box<dyn std::error::Error>> {
        let unit = SimulatedUnit::new(Platform::new(Generation::Gen12, Interface::Legacy));
        let format = format()?;
        let _device = unit.open_stream(&SessionConfig::new(4, 1, 10).disabled(), &format)?;
        assert!(!unit.push_report(&[0u8; 256]));
        Ok(())
    }
}
