//! OA sampling exponent conversions.
//!
//! The counter unit samples every `2^(exponent + 1)` timestamp ticks. These
//! helpers convert between that exponent and a period in nanoseconds for a
//! given timestamp tick frequency. They are pure and independent of any
//! open stream; callers use them to pick an exponent before opening one.
//!
//! ```
//! use oa_exponent::ExponentCalculator;
//!
//! # fn main() -> Result<(), oa_errors::ExponentError> {
//! let calc = ExponentCalculator::new(12_000_000)?;
//! let exponent = calc.max_exponent_for_period_lte(1_000_000)?;
//! assert!(calc.period_ns(exponent) <= 1_000_000);
//! assert!(calc.period_ns(exponent + 1) > 1_000_000);
//! # Ok(())
//! # }
//! ```

#![deny(static_mut_refs)]
#![warn(missing_docs, rust_2018_idioms)]

use core::num::NonZeroU64;

use oa_errors::ExponentError;

/// Exclusive upper bound of the exponent search; exponent 29 already
/// corresponds to periods of several minutes on every supported part.
pub const EXPONENT_SEARCH_LIMIT: u32 = 30;

/// Largest exponent the counter unit accepts.
pub const MAX_PERIOD_EXPONENT: u32 = 31;

const NSEC_PER_SEC: u64 = 1_000_000_000;

/// Exponent/period conversions for one timestamp tick frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExponentCalculator {
    tick_frequency: NonZeroU64,
}

impl ExponentCalculator {
    /// Create a calculator for a timestamp tick frequency in Hz.
    ///
    /// # Errors
    ///
    /// Returns [`ExponentError::ZeroTickFrequency`] for a zero frequency.
    pub fn new(tick_frequency_hz: u64) -> Result<Self, ExponentError> {
        NonZeroU64::new(tick_frequency_hz)
            .map(|tick_frequency| Self { tick_frequency })
            .ok_or(ExponentError::ZeroTickFrequency)
    }

    /// Timestamp tick frequency in Hz.
    pub fn tick_frequency(&self) -> u64 {
        self.tick_frequency.get()
    }

    /// Sampling period of `exponent` in nanoseconds, saturating at
    /// `u64::MAX`.
    pub fn period_ns(&self, exponent: u32) -> u64 {
        let ticks = match 2u128.checked_shl(exponent) {
            Some(ticks) if exponent < 127 => ticks,
            _ => return u64::MAX,
        };
        let ns = ticks.saturating_mul(u128::from(NSEC_PER_SEC))
            / u128::from(self.tick_frequency.get());
        u64::try_from(ns).unwrap_or(u64::MAX)
    }

    /// Sampling frequency of `exponent` in Hz, rounded down.
    pub fn frequency_hz(&self, exponent: u32) -> u64 {
        match 2u64.checked_shl(exponent) {
            Some(ticks) if exponent < 63 => self.tick_frequency.get() / ticks,
            _ => 0,
        }
    }

    /// Convert a timestamp tick delta to nanoseconds.
    pub fn ticks_to_ns(&self, ticks: u64) -> u64 {
        let ns = u128::from(ticks).saturating_mul(u128::from(NSEC_PER_SEC))
            / u128::from(self.tick_frequency.get());
        u64::try_from(ns).unwrap_or(u64::MAX)
    }

    /// Largest exponent in `[0, 30)` whose period does not exceed
    /// `period_ns`.
    ///
    /// # Errors
    ///
    /// Returns [`ExponentError::PeriodTooShort`] when even exponent 0
    /// samples slower than requested.
    pub fn max_exponent_for_period_lte(&self, period_ns: u64) -> Result<u32, ExponentError> {
        (0..EXPONENT_SEARCH_LIMIT)
            .take_while(|exponent| self.period_ns(*exponent) <= period_ns)
            .last()
            .ok_or(ExponentError::PeriodTooShort {
                period_ns,
                minimum_ns: self.period_ns(0),
            })
    }

    /// Largest exponent sampling strictly faster than `frequency_hz`.
    ///
    /// # Errors
    ///
    /// Returns [`ExponentError::ZeroFrequency`] for 0 Hz,
    /// [`ExponentError::FrequencyTooHigh`] above 1 GHz, and
    /// [`ExponentError::PeriodTooShort`] when no exponent is fast enough.
    pub fn max_exponent_for_freq_gt(&self, frequency_hz: u64) -> Result<u32, ExponentError> {
        if frequency_hz == 0 {
            return Err(ExponentError::ZeroFrequency);
        }
        let period_ns = NSEC_PER_SEC / frequency_hz;
        match period_ns.checked_sub(1) {
            Some(bound) if period_ns > 0 => self.max_exponent_for_period_lte(bound),
            _ => Err(ExponentError::FrequencyTooHigh { frequency_hz }),
        }
    }
}

/// Sampling period of `exponent` for a tick frequency.
///
/// # Errors
///
/// Returns [`ExponentError::ZeroTickFrequency`] for a zero tick frequency.
pub fn period_ns(exponent: u32, tick_frequency_hz: u64) -> Result<u64, ExponentError> {
    Ok(ExponentCalculator::new(tick_frequency_hz)?.period_ns(exponent))
}

/// See [`ExponentCalculator::max_exponent_for_period_lte`].
///
/// # Errors
///
/// Returns [`ExponentError::ZeroTickFrequency`] or
/// [`ExponentError::PeriodTooShort`].
pub fn max_exponent_for_period_lte(
    period_ns: u64,
    tick_frequency_hz: u64,
) -> Result<u32, ExponentError> {
    ExponentCalculator::new(tick_frequency_hz)?.max_exponent_for_period_lte(period_ns)
}

/// See [`ExponentCalculator::max_exponent_for_freq_gt`].
///
/// # Errors
///
/// Returns [`ExponentError::ZeroTickFrequency`], [`ExponentError::ZeroFrequency`],
/// [`ExponentError::FrequencyTooHigh`] or [`ExponentError::PeriodTooShort`].
pub fn max_exponent_for_freq_gt(
    frequency_hz: u64,
    tick_frequency_hz: u64,
) -> Result<u32, ExponentError> {
    ExponentCalculator::new(tick_frequency_hz)?.max_exponent_for_freq_gt(frequency_hz)
}

/// Render a period with the largest unit that keeps it at or above 1,
/// e.g. `"1.000ms"` or `"250ns"`.
pub fn pretty_period(period_ns: u64) -> String {
    const UNITS: [(u64, &str); 3] = [(NSEC_PER_SEC, "s"), (1_000_000, "ms"), (1_000, "us")];
    for (scale, unit) in UNITS {
        if period_ns >= scale {
            let whole = period_ns / scale;
            let millis = (period_ns % scale) * 1000 / scale;
            return format!("{whole}.{millis:03}{unit}");
        }
    }
    format!("{period_ns}ns")
}
