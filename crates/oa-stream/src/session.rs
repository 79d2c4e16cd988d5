//! Stream sessions.
//!
//! A [`StreamSession`] owns one device handle and moves between
//! `Disabled`, `Enabled` and the terminal `Closed` state. Reading is only
//! possible while enabled, and how a refused read surfaces depends on the
//! interface: the legacy interface reports a bare `EIO` that the caller
//! resolves with [`StreamSession::status`], the observation interface
//! reports [`StreamError::InvalidState`].

use core::fmt;

use oa_errors::{StreamError, StreamResult};
use oa_format::{FormatCatalog, FormatDescriptor, Generation, Interface, ReportView};
use tracing::{debug, info, trace, warn};

use crate::config::SessionConfig;
use crate::device::{CounterUnit, Platform, StreamDevice};
use crate::record::{Record, max_record_len, parse_record};
use crate::status::StatusBits;

/// Session lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Open but not sampling
    Disabled,
    /// Sampling; reads return records
    Enabled,
    /// Released; every operation except `close` fails
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SessionState::Disabled => "disabled",
            SessionState::Enabled => "enabled",
            SessionState::Closed => "closed",
        })
    }
}

/// An open counter stream.
#[derive(Debug)]
pub struct StreamSession<D: StreamDevice> {
    device: D,
    platform: Platform,
    format: FormatDescriptor,
    config: SessionConfig,
    state: SessionState,
}

impl<D: StreamDevice> StreamSession<D> {
    /// Validate `config` and open a stream on `unit`.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::InvalidConfig`] if the catalog belongs to a
    /// different interface than the unit or the configuration is rejected,
    /// [`StreamError::InvalidFormat`] for an unknown format, and the unit's
    /// [`StreamError::Busy`] or [`StreamError::PermissionDenied`].
    pub fn open<U>(unit: &U, catalog: &FormatCatalog, config: SessionConfig) -> StreamResult<Self>
    where
        U: CounterUnit<Device = D>,
    {
        let platform = unit.platform();
        let format = Self::resolve(platform, catalog, &config)?;
        let device = unit.open_stream(&config, format)?;
        Ok(Self::from_parts(device, platform, format.clone(), config))
    }

    /// Wrap an already open device.
    ///
    /// # Errors
    ///
    /// Same validation errors as [`StreamSession::open`].
    pub fn from_device(
        device: D,
        platform: Platform,
        catalog: &FormatCatalog,
        config: SessionConfig,
    ) -> StreamResult<Self> {
        let format = Self::resolve(platform, catalog, &config)?.clone();
        Ok(Self::from_parts(device, platform, format, config))
    }

    fn resolve<'c>(
        platform: Platform,
        catalog: &'c FormatCatalog,
        config: &SessionConfig,
    ) -> StreamResult<&'c FormatDescriptor> {
        if catalog.interface() != platform.interface {
            return Err(StreamError::invalid_config(format!(
                "{} catalog used with a {} unit",
                catalog.interface(),
                platform.interface
            )));
        }
        config.validate(catalog, platform.generation)
    }

    fn from_parts(
        device: D,
        platform: Platform,
        format: FormatDescriptor,
        config: SessionConfig,
    ) -> Self {
        let state = if config.start_disabled {
            SessionState::Disabled
        } else {
            SessionState::Enabled
        };
        info!(
            generation = %platform.generation,
            interface = %platform.interface,
            format = format.name(),
            exponent = ?config.period_exponent,
            %state,
            "Opened OA stream"
        );
        Self {
            device,
            platform,
            format,
            config,
            state,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Layout of the reports this session produces.
    pub fn format(&self) -> &FormatDescriptor {
        &self.format
    }

    /// Configuration the session was opened with.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Generation and interface of the unit.
    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Hardware generation of the unit.
    pub fn generation(&self) -> Generation {
        self.platform.generation
    }

    /// Kernel interface of the unit.
    pub fn interface(&self) -> Interface {
        self.platform.interface
    }

    /// Bytes needed to hold the largest single record.
    pub fn record_len(&self) -> usize {
        max_record_len(self.platform.interface, &self.format)
    }

    /// Start sampling. Enabling an enabled session does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::InvalidState`] once closed, and device errors.
    pub fn enable(&mut self) -> StreamResult {
        match self.state {
            SessionState::Closed => Err(StreamError::InvalidState { state: "closed" }),
            SessionState::Enabled => Ok(()),
            SessionState::Disabled => {
                self.device.enable()?;
                self.state = SessionState::Enabled;
                debug!(format = self.format.name(), "OA stream enabled");
                Ok(())
            }
        }
    }

    /// Stop sampling. Disabling a disabled session does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::InvalidState`] once closed, and device errors.
    pub fn disable(&mut self) -> StreamResult {
        match self.state {
            SessionState::Closed => Err(StreamError::InvalidState { state: "closed" }),
            SessionState::Disabled => Ok(()),
            SessionState::Enabled => {
                self.device.disable()?;
                self.state = SessionState::Disabled;
                debug!(format = self.format.name(), "OA stream disabled");
                Ok(())
            }
        }
    }

    /// Release the device. Closing twice does nothing.
    pub fn close(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        self.device.close();
        self.state = SessionState::Closed;
        info!(format = self.format.name(), "Closed OA stream");
    }

    /// Query and clear the device status bits.
    ///
    /// Call after a read failed with [`StreamError::Io`] to learn why.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::InvalidState`] once closed, and device errors.
    pub fn status(&mut self) -> StreamResult<StatusBits> {
        if self.state == SessionState::Closed {
            return Err(StreamError::InvalidState { state: "closed" });
        }
        self.device.status()
    }

    fn check_readable(&self) -> StreamResult {
        let refused = match self.state {
            SessionState::Closed => return Err(StreamError::InvalidState { state: "closed" }),
            SessionState::Disabled => "disabled",
            SessionState::Enabled if !self.config.is_sampling() => "not sampling",
            SessionState::Enabled => return Ok(()),
        };
        match self.platform.interface {
            Interface::Legacy => Err(StreamError::Io { errno: libc::EIO }),
            Interface::Observation => Err(StreamError::InvalidState { state: refused }),
        }
    }

    /// Read whole records into `dest`, as a single device read.
    ///
    /// `requested` is the caller's claim of how many bytes `dest` may take.
    /// A claim larger than `dest` is served as a short read of whole
    /// records as long as `dest` fits at least one.
    ///
    /// # Errors
    ///
    /// Returns the interface-specific refusal while disabled,
    /// [`StreamError::NoSpace`] if `requested` is below one record,
    /// [`StreamError::Fault`] if `dest` itself cannot hold one record, and
    /// device errors.
    pub fn read_raw(&mut self, dest: &mut [u8], requested: usize) -> StreamResult<usize> {
        self.check_readable()?;
        let record_len = self.record_len();
        if requested < record_len {
            return Err(StreamError::NoSpace {
                required: record_len,
                available: requested,
            });
        }
        if dest.len() < record_len {
            return Err(StreamError::Fault {
                requested,
                available: dest.len(),
            });
        }
        let limit = requested.min(dest.len());
        let dest = dest.get_mut(..limit).unwrap_or_default();
        self.device.read(dest)
    }

    /// Lazily read records through `scratch`.
    ///
    /// The sequence is unbounded on a live device; it ends only when the
    /// device reports end of stream or after a non-recoverable error, which
    /// is yielded first. [`StreamError::WouldBlock`] is yielded without
    /// ending the sequence.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::NoSpace`] if `scratch` cannot hold the largest
    /// record.
    pub fn read_records<'s>(&'s mut self, scratch: &'s mut [u8]) -> StreamResult<Records<'s, D>> {
        let required = self.record_len();
        if scratch.len() < required {
            return Err(StreamError::NoSpace {
                required,
                available: scratch.len(),
            });
        }
        Ok(Records {
            session: self,
            scratch,
            start: 0,
            end: 0,
            pending: None,
            done: false,
        })
    }

    fn read_into(&mut self, dest: &mut [u8]) -> StreamResult<usize> {
        self.check_readable()?;
        self.device.read(dest)
    }

    fn resolve_io_failure(&mut self, errno: i32) -> StreamResult<(Record, Option<Record>)> {
        if self.platform.interface == Interface::Observation
            && self.state == SessionState::Enabled
        {
            let status = self.device.status()?;
            let lost = status.contains(StatusBits::REPORT_LOST);
            let overflow = status.contains(StatusBits::BUFFER_OVERFLOW);
            match (lost, overflow) {
                (true, true) => return Ok((Record::ReportLost, Some(Record::BufferOverflow))),
                (true, false) => return Ok((Record::ReportLost, None)),
                (false, true) => return Ok((Record::BufferOverflow, None)),
                (false, false) => {}
            }
        }
        Err(StreamError::Io { errno })
    }
}

/// Records read from a session, see [`StreamSession::read_records`].
#[derive(Debug)]
pub struct Records<'s, D: StreamDevice> {
    session: &'s mut StreamSession<D>,
    scratch: &'s mut [u8],
    start: usize,
    end: usize,
    pending: Option<Record>,
    done: bool,
}

impl<D: StreamDevice> Records<'_, D> {
    fn emit(&self, record: Record) -> Record {
        match &record {
            Record::Sample(report) => {
                let format = &self.session.format;
                if let Ok(view) = ReportView::new(format, report.as_bytes())
                    && let Ok(timestamp) = oa_decode::timestamp(&view)
                {
                    trace!(timestamp, "OA sample");
                }
            }
            Record::ReportLost => warn!(format = self.session.format.name(), "OA reports lost"),
            Record::BufferOverflow => {
                warn!(format = self.session.format.name(), "OA buffer overflow")
            }
        }
        record
    }

    fn compact(&mut self) {
        if self.start > 0 {
            self.scratch.copy_within(self.start..self.end, 0);
            self.end = self.end.saturating_sub(self.start);
            self.start = 0;
        }
    }
}

impl<D: StreamDevice> Iterator for Records<'_, D> {
    type Item = Result<Record, StreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(record) = self.pending.take() {
            return Some(Ok(self.emit(record)));
        }
        loop {
            if self.done {
                return None;
            }
            let buffered = self.scratch.get(self.start..self.end).unwrap_or_default();
            let interface = self.session.platform.interface;
            match parse_record(interface, &self.session.format, buffered) {
                Ok(Some((record, used))) => {
                    self.start = self.start.saturating_add(used);
                    return Some(Ok(self.emit(record)));
                }
                Ok(None) => self.compact(),
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }

            let dest = self.scratch.get_mut(self.end..).unwrap_or_default();
            match self.session.read_into(dest) {
                Ok(0) => {
                    self.done = true;
                    if self.end > self.start {
                        return Some(Err(StreamError::malformed(format!(
                            "stream ended inside a record ({} bytes buffered)",
                            self.end.saturating_sub(self.start)
                        ))));
                    }
                    return None;
                }
                Ok(n) => self.end = self.end.saturating_add(n),
                Err(StreamError::WouldBlock) => return Some(Err(StreamError::WouldBlock)),
                Err(StreamError::Io { errno }) => match self.session.resolve_io_failure(errno) {
                    Ok((record, next)) => {
                        self.pending = next;
                        return Some(Ok(self.emit(record)));
                    }
                    Err(e) => {
                        self.done = true;
                        return Some(Err(e));
                    }
                },
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

impl<D: StreamDevice> Drop for StreamSession<D> {
    fn drop(&mut self) {
        self.close();
    }
}
