//! Report header decoding.
//!
//! Every function here is pure: it reads fields of one report through a
//! [`ReportView`] and never retains the bytes.

use oa_errors::FormatError;
use oa_format::{
    Capabilities, FormatDescriptor, HeaderWidth, ReasonBits, ReasonStrategy, ReportView,
};

/// Clock ratio multiplier, in kHz, of one ratio step.
const RATIO_STEP_KHZ: u32 = 16_666;

/// Wraparound width of the timestamp as stored in reports of `format`.
///
/// A 32-bit header field cannot hold more than 32 bits even on generations
/// whose timestamp counter is wider. Wrapping such a field at the counter
/// width instead would misreport every 32-bit rollover, so keep the minimum.
pub fn timestamp_width(format: &FormatDescriptor) -> u32 {
    let field_bits = match format.header() {
        HeaderWidth::Bits32 => 32,
        HeaderWidth::Bits64 => 64,
    };
    format.capabilities().timestamp_width.min(field_bits)
}

/// Read the report timestamp.
///
/// # Errors
///
/// Returns [`FormatError::OutOfBounds`] if the header field lies outside
/// the report.
pub fn timestamp(view: &ReportView<'_>) -> Result<u64, FormatError> {
    let header = view.format().header();
    match header {
        HeaderWidth::Bits32 => view.u32_at(header.timestamp_offset()).map(u64::from),
        HeaderWidth::Bits64 => view.u64_at(header.timestamp_offset()),
    }
}

/// Elapsed ticks between two readings of a counter `width_bits` wide.
///
/// A reading smaller than its predecessor is a single wrap of the counter.
/// At 64 bits the subtraction itself wraps.
pub const fn timestamp_delta(end: u64, start: u64, width_bits: u32) -> u64 {
    if end < start && width_bits < 64 {
        (1u64 << width_bits).wrapping_sub(start).wrapping_add(end)
    } else {
        end.wrapping_sub(start)
    }
}

/// Read the GPU clock ticks, if the generation records them.
///
/// # Errors
///
/// Returns [`FormatError::OutOfBounds`] if the header field lies outside
/// the report.
pub fn clock_ticks(view: &ReportView<'_>) -> Result<Option<u64>, FormatError> {
    let format = view.format();
    if !format.capabilities().clock_ticks {
        return Ok(None);
    }
    let header = format.header();
    let ticks = match header {
        HeaderWidth::Bits32 => view.u32_at(header.clock_ticks_offset()).map(u64::from)?,
        HeaderWidth::Bits64 => view.u64_at(header.clock_ticks_offset())?,
    };
    Ok(Some(ticks))
}

/// Elapsed GPU clock ticks between two readings of `format`'s tick field.
pub fn tick_delta(format: &FormatDescriptor, end: u64, start: u64) -> u64 {
    timestamp_delta(end, start, format.header().tick_width())
}

/// Read the context id, present only when the header flags it valid.
///
/// # Errors
///
/// Returns [`FormatError::OutOfBounds`] if a header field lies outside the
/// report.
pub fn context_id(view: &ReportView<'_>) -> Result<Option<u32>, FormatError> {
    let format = view.format();
    let Some(bit) = format.capabilities().context_valid_bit else {
        return Ok(None);
    };
    if view.dword0()? & (1 << bit) == 0 {
        return Ok(None);
    }
    view.u32_at(format.header().context_id_offset()).map(Some)
}

/// Decides whether a report was triggered by the sampling timer.
pub trait ReasonClassifier: Send + Sync {
    /// The explicit reason bits, or `None` when the generation has none.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::OutOfBounds`] if header fields lie outside
    /// the report.
    fn reason(&self, view: &ReportView<'_>) -> Result<Option<ReasonBits>, FormatError>;

    /// Whether the report was emitted by the periodic timer of a stream
    /// sampling with `exponent`.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::OutOfBounds`] if header fields lie outside
    /// the report.
    fn is_periodic(&self, view: &ReportView<'_>, exponent: u32) -> Result<bool, FormatError>;
}

/// Classifier for headers with a reason field.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExplicitReason;

impl ReasonClassifier for ExplicitReason {
    fn reason(&self, view: &ReportView<'_>) -> Result<Option<ReasonBits>, FormatError> {
        view.dword0().map(|dword0| Some(ReasonBits::from_dword0(dword0)))
    }

    fn is_periodic(&self, view: &ReportView<'_>, _exponent: u32) -> Result<bool, FormatError> {
        Ok(self
            .reason(view)?
            .is_some_and(|reason| reason.contains(ReasonBits::TIMER)))
    }
}

/// Classifier for headers without a reason field.
///
/// Timer reports land on multiples of the sampling period, so the low
/// `exponent + 1` timestamp bits read exactly `1 << exponent`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicReason;

impl ReasonClassifier for HeuristicReason {
    fn reason(&self, _view: &ReportView<'_>) -> Result<Option<ReasonBits>, FormatError> {
        Ok(None)
    }

    fn is_periodic(&self, view: &ReportView<'_>, exponent: u32) -> Result<bool, FormatError> {
        Ok(heuristic_is_periodic(timestamp(view)?, exponent))
    }
}

/// Periodicity test on raw timestamp bits.
pub const fn heuristic_is_periodic(timestamp: u64, exponent: u32) -> bool {
    let (Some(bit), Some(period)) = (1u64.checked_shl(exponent), 2u64.checked_shl(exponent)) else {
        return false;
    };
    let mask = period.wrapping_sub(1);
    timestamp & mask == bit
}

/// The reason classifier selected by a descriptor's capabilities.
pub fn classifier_for(capabilities: Capabilities) -> &'static dyn ReasonClassifier {
    match capabilities.reason {
        ReasonStrategy::Explicit => &ExplicitReason,
        ReasonStrategy::Heuristic => &HeuristicReason,
    }
}

/// Explicit reason bits of a report.
///
/// # Errors
///
/// Returns [`FormatError::OutOfBounds`] if dword0 lies outside the report.
pub fn reason(view: &ReportView<'_>) -> Result<Option<ReasonBits>, FormatError> {
    classifier_for(view.format().capabilities()).reason(view)
}

/// Whether a report was emitted by the sampling timer.
///
/// # Errors
///
/// Returns [`FormatError::OutOfBounds`] if header fields lie outside the
/// report.
pub fn is_periodic(view: &ReportView<'_>, exponent: u32) -> Result<bool, FormatError> {
    classifier_for(view.format().capabilities()).is_periodic(view, exponent)
}

/// Slice and unslice clock frequencies at the time of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClockRatios {
    /// Slice clock in MHz
    pub slice_mhz: u32,
    /// Unslice clock in MHz
    pub unslice_mhz: u32,
}

impl ClockRatios {
    /// Decode the ratio fields of header dword0.
    pub const fn from_dword0(dword0: u32) -> Self {
        let unslice = dword0 & 0x1ff;
        let slice = ((dword0 >> 25) & 0x7f) | (((dword0 >> 9) & 0x3) << 7);
        Self {
            slice_mhz: slice * RATIO_STEP_KHZ / 1000,
            unslice_mhz: unslice * RATIO_STEP_KHZ / 1000,
        }
    }
}

/// Clock ratios encoded in dword0, on generations that carry them.
///
/// Only explicit-reason generations with 32-bit headers pack ratios
/// alongside the reason.
///
/// # Errors
///
/// Returns [`FormatError::OutOfBounds`] if dword0 lies outside the report.
pub fn clock_ratios(view: &ReportView<'_>) -> Result<Option<ClockRatios>, FormatError> {
    let format = view.format();
    if format.capabilities().reason != ReasonStrategy::Explicit
        || format.header() != HeaderWidth::Bits32
    {
        return Ok(None);
    }
    view.dword0().map(|dword0| Some(ClockRatios::from_dword0(dword0)))
}

/// Decoded header of one report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportSummary {
    /// Report timestamp
    pub timestamp: u64,
    /// Explicit reason bits, if the generation has them
    pub reason: Option<ReasonBits>,
    /// Whether the sampling timer emitted the report
    pub periodic: bool,
    /// Context id, if flagged valid
    pub context_id: Option<u32>,
    /// GPU clock ticks, if recorded
    pub clock_ticks: Option<u64>,
}

/// Decode every header field of a report at once.
///
/// # Errors
///
/// Returns [`FormatError::OutOfBounds`] if header fields lie outside the
/// report.
pub fn classify(view: &ReportView<'_>, exponent: u32) -> Result<ReportSummary, FormatError> {
    let classifier = classifier_for(view.format().capabilities());
    Ok(ReportSummary {
        timestamp: timestamp(view)?,
        reason: classifier.reason(view)?,
        periodic: classifier.is_periodic(view, exponent)?,
        context_id: context_id(view)?,
        clock_ticks: clock_ticks(view)?,
    })
}
