//! Loss-aware sample windows.
//!
//! Deltas are only meaningful between two samples with no loss in between.
//! [`GapTracker`] stamps every sample with the loss epoch and the enable
//! window it was read in, so a caller holding two samples can check whether
//! the span between them is still valid. [`PeriodicPairs`] applies the same
//! rule to a record stream and yields consecutive comparable timer samples.

use std::collections::BTreeSet;

use oa_errors::StreamError;
use oa_format::{FormatDescriptor, Report, ReportView};
use tracing::debug;

use crate::record::Record;

/// Where a sample sits relative to stream losses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Stamp {
    /// Incremented on every report loss and every rearm
    pub epoch: u64,
    /// Enable window the sample was read in
    pub arm: u64,
    /// Its enable window had already overflowed when the sample was read
    pub suspect: bool,
}

/// Tracks losses over a record sequence.
///
/// A buffer overflow taints every sample of the enable window it lands in,
/// including samples stamped before the overflow record arrived.
/// [`check_span`](Self::check_span) consults the tracker, not the stamps
/// alone, so it sees overflows recorded after either stamp was taken.
#[derive(Debug, Clone, Default)]
pub struct GapTracker {
    epoch: u64,
    arm: u64,
    overflowed: BTreeSet<u64>,
}

impl GapTracker {
    /// Start with no losses seen.
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for a record; samples get their stamp back.
    pub fn observe(&mut self, record: &Record) -> Option<Stamp> {
        match record {
            Record::Sample(_) => Some(self.stamp()),
            Record::ReportLost => {
                self.epoch = self.epoch.wrapping_add(1);
                None
            }
            Record::BufferOverflow => {
                if self.overflowed.insert(self.arm) {
                    debug!(arm = self.arm, "enable window overflowed");
                }
                None
            }
        }
    }

    /// Stamp the next sample would receive.
    pub fn stamp(&self) -> Stamp {
        Stamp {
            epoch: self.epoch,
            arm: self.arm,
            suspect: self.has_overflowed(self.arm),
        }
    }

    /// Start a fresh window after the session was re-enabled.
    pub fn rearm(&mut self) {
        self.epoch = self.epoch.wrapping_add(1);
        self.arm = self.arm.wrapping_add(1);
    }

    /// Whether a buffer overflow was seen in enable window `arm`.
    pub fn has_overflowed(&self, arm: u64) -> bool {
        self.overflowed.contains(&arm)
    }

    /// Check that two samples may be compared.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::BufferOverflow`] if either sample belongs to
    /// an enable window that has overflowed, whenever the overflow was
    /// observed, and [`StreamError::ReportLost`] if a loss or a rearm
    /// separates them.
    pub fn check_span(&self, start: Stamp, end: Stamp) -> Result<(), StreamError> {
        let tainted = |stamp: Stamp| stamp.suspect || self.has_overflowed(stamp.arm);
        if tainted(start) || tainted(end) {
            return Err(StreamError::BufferOverflow);
        }
        if start.epoch != end.epoch {
            return Err(StreamError::ReportLost);
        }
        Ok(())
    }
}

/// Consecutive periodic samples with no loss between them.
///
/// Triggered (non-timer) samples are skipped. Errors from the inner
/// sequence are passed through; lost reports and overflows break the
/// chain so no pair spans them. A pair already yielded becomes suspect if
/// an overflow later lands in the same enable window; confirm retained
/// pairs with [`PeriodicPairs::tracker`] before trusting them.
#[derive(Debug)]
pub struct PeriodicPairs<'f, I> {
    records: I,
    format: &'f FormatDescriptor,
    exponent: u32,
    tracker: GapTracker,
    previous: Option<(Stamp, Report)>,
}

impl<'f, I> PeriodicPairs<'f, I>
where
    I: Iterator<Item = Result<Record, StreamError>>,
{
    /// Pair periodic samples of `format` read from `records`.
    pub fn new(records: I, format: &'f FormatDescriptor, exponent: u32) -> Self {
        Self {
            records,
            format,
            exponent,
            tracker: GapTracker::new(),
            previous: None,
        }
    }

    /// Loss state so far.
    pub fn tracker(&self) -> &GapTracker {
        &self.tracker
    }

    fn is_periodic(&self, report: &Report) -> Result<bool, StreamError> {
        let view = ReportView::new(self.format, report.as_bytes())?;
        Ok(oa_decode::is_periodic(&view, self.exponent)?)
    }
}

impl<I> Iterator for PeriodicPairs<'_, I>
where
    I: Iterator<Item = Result<Record, StreamError>>,
{
    type Item = Result<(Report, Report), StreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let record = match self.records.next()? {
                Ok(record) => record,
                Err(e) => return Some(Err(e)),
            };
            let Some(stamp) = self.tracker.observe(&record) else {
                self.previous = None;
                continue;
            };
            let Record::Sample(report) = record else {
                continue;
            };
            match self.is_periodic(&report) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(e) => return Some(Err(e)),
            }
            if stamp.suspect {
                continue;
            }
            let previous = self.previous.replace((stamp, report.clone()));
            if let Some((prev_stamp, prev_report)) = previous
                && self.tracker.check_span(prev_stamp, stamp).is_ok()
            {
                return Some(Ok((prev_report, report)));
            }
        }
    }
}
